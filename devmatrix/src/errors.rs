// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use devmatrix_runner::{DevmatrixExitCode, errors::*};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders. Errors are meant to be printed with
// display_to_stderr, which colorizes them.

/// An expected failure: bad input or configuration, or failed tests.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("screenshot manifest error")]
    ScreenshotManifestError {
        #[from]
        err: ScreenshotManifestError,
    },
    #[error("load results error")]
    LoadResultsError {
        #[from]
        err: LoadResultsError,
    },
    #[error("write report error")]
    WriteReportError {
        #[from]
        err: WriteReportError,
    },
    #[error("write summary error")]
    WriteSummaryError {
        #[from]
        err: WriteSummaryError,
    },
    #[error("test run failed")]
    TestRunFailed { failures: usize },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::ScreenshotManifestError { .. } => {
                DevmatrixExitCode::SETUP_ERROR
            }
            Self::LoadResultsError { .. } => DevmatrixExitCode::LOAD_RESULTS_FAILED,
            Self::WriteReportError { .. } | Self::WriteSummaryError { .. } => {
                DevmatrixExitCode::WRITE_OUTPUT_ERROR
            }
            Self::TestRunFailed { .. } => DevmatrixExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr, followed by its chain of causes.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse devmatrix config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::ScreenshotManifestError { err } => {
                let (path, source) = match err {
                    ScreenshotManifestError::Read { path, error } => (path, error as &dyn Error),
                    ScreenshotManifestError::Parse { path, error } => (path, error as &dyn Error),
                };
                error!(
                    "failed to read screenshot manifest at `{}`",
                    path.style(styles.bold)
                );
                Some(source)
            }
            Self::LoadResultsError { err } => {
                error!(
                    "failed to load test results from `{}`",
                    err.path().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::WriteReportError { err } => {
                let (path, source) = match err {
                    WriteReportError::CreateDir { path, error } => (path, error as &dyn Error),
                    WriteReportError::Write { path, error } => (path, error as &dyn Error),
                };
                error!("failed to write report to `{}`", path.style(styles.bold));
                Some(source)
            }
            Self::WriteSummaryError { err } => {
                error!("failed to write summary");
                err.source()
            }
            Self::TestRunFailed { failures } => {
                let noun = if *failures == 1 { "test" } else { "tests" };
                error!("{} {noun} failed", failures.style(styles.failed));
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
