// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command dispatch and execution.

mod base;
mod generate;
mod summary;

use crate::{
    Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use base::BaseApp;
use camino::Utf8PathBuf;
use clap::{Args, Subcommand};
use generate::GenerateOpts;
use summary::SummaryOpts;

/// Aggregates test results from many devices and build variants into a single report.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct DevmatrixApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl DevmatrixApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let base = BaseApp::new(output, &self.config_opts)?;
        match self.command {
            Command::Generate(opts) => opts.exec(&base),
            Command::Summary(opts) => opts.exec(&base, output_writer),
        }
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Config file [default: <root-dir>/.config/devmatrix.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Directory that relative paths in the config are resolved against
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    root_dir: Utf8PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write an HTML report for a set of result files
    Generate(GenerateOpts),

    /// Print counts for every package, class, device and variant
    Summary(SummaryOpts),
}

/// Options shared by every command that reads results.
#[derive(Debug, Args)]
#[command(next_help_heading = "Results options")]
struct ResultsOpts {
    /// Directory containing result files (can be specified multiple times)
    #[arg(long = "results-dir", short = 'r', value_name = "DIR", required = true)]
    results_dirs: Vec<Utf8PathBuf>,

    /// Exit with a non-zero code if any test failed
    #[arg(long)]
    fail_on_test_failure: bool,
}
