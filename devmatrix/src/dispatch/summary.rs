// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    ResultsOpts,
    base::{BaseApp, final_result},
};
use crate::{Result, output::OutputWriter};
use clap::{Args, ValueEnum};
use devmatrix_runner::{
    screenshots::ScreenshotManifest,
    summary::{ReportSummary, SummaryFormat},
};

#[derive(Debug, Args)]
pub(super) struct SummaryOpts {
    #[clap(flatten)]
    results: ResultsOpts,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormatOpts,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum MessageFormatOpts {
    /// A human-readable output format.
    #[default]
    Human,
    /// JSON with no whitespace.
    Json,
    /// JSON, prettified.
    JsonPretty,
}

impl MessageFormatOpts {
    fn to_summary_format(self) -> SummaryFormat {
        match self {
            Self::Human => SummaryFormat::Human,
            Self::Json => SummaryFormat::Json,
            Self::JsonPretty => SummaryFormat::JsonPretty,
        }
    }
}

impl SummaryOpts {
    pub(super) fn exec(self, base: &BaseApp, output_writer: &mut OutputWriter) -> Result<i32> {
        // Screenshots only affect the HTML report.
        let root = base.load(&self.results, &ScreenshotManifest::new())?;

        let summary = ReportSummary::new(&root);
        summary.write(
            self.message_format.to_summary_format(),
            output_writer.stdout_writer(),
        )?;

        final_result(&self.results, summary.totals.failures)
    }
}
