// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    ResultsOpts,
    base::{BaseApp, final_result},
};
use crate::Result;
use camino::Utf8PathBuf;
use clap::Args;
use devmatrix_model::AggregateResults;
use devmatrix_runner::render::ReportWriter;

#[derive(Debug, Args)]
pub(super) struct GenerateOpts {
    #[clap(flatten)]
    results: ResultsOpts,

    /// Directory to write the report to [default: from config]
    #[arg(long, short = 'o', value_name = "DIR")]
    report_dir: Option<Utf8PathBuf>,

    /// JSON file mapping `<class>#<test>` to screenshot paths [default: from config]
    #[arg(long, value_name = "PATH")]
    screenshots: Option<Utf8PathBuf>,

    /// Title of the overview page [default: from config]
    #[arg(long, value_name = "TEXT")]
    title: Option<String>,
}

impl GenerateOpts {
    pub(super) fn exec(self, base: &BaseApp) -> Result<i32> {
        let screenshots = base.screenshots(self.screenshots.as_deref())?;
        let root = base.load(&self.results, &screenshots)?;

        let config = base.config();
        let report_dir = self.report_dir.unwrap_or_else(|| config.report_dir());
        let title = self
            .title
            .unwrap_or_else(|| config.report_title().to_owned());
        ReportWriter::new(report_dir, title).write(&root)?;

        final_result(&self.results, root.failure_count())
    }
}
