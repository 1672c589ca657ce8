// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ConfigOpts, ResultsOpts};
use crate::{ExpectedError, Result, output::OutputContext};
use camino::Utf8Path;
use devmatrix_model::{AggregateResults, RootNode};
use devmatrix_runner::{
    DevmatrixExitCode, config::DevmatrixConfig, load::ResultsLoader,
    screenshots::ScreenshotManifest,
};
use owo_colors::OwoColorize;
use tracing::{info, warn};

/// State shared by every command.
#[derive(Debug)]
pub(super) struct BaseApp {
    output: OutputContext,
    config: DevmatrixConfig,
}

impl BaseApp {
    pub(super) fn new(output: OutputContext, config_opts: &ConfigOpts) -> Result<Self> {
        let config = DevmatrixConfig::from_sources(
            &config_opts.root_dir,
            config_opts.config_file.as_deref(),
        )?;
        Ok(Self { output, config })
    }

    pub(super) fn config(&self) -> &DevmatrixConfig {
        &self.config
    }

    /// Reads the screenshot manifest from `path`, or from the configured location if `path`
    /// isn't specified.
    pub(super) fn screenshots(&self, path: Option<&Utf8Path>) -> Result<ScreenshotManifest> {
        let configured = self.config.screenshot_manifest();
        match path.or(configured.as_deref()) {
            Some(path) => Ok(ScreenshotManifest::from_path(path)?),
            None => Ok(ScreenshotManifest::new()),
        }
    }

    /// Loads every result file in the requested directories.
    pub(super) fn load(
        &self,
        results_opts: &ResultsOpts,
        screenshots: &ScreenshotManifest,
    ) -> Result<RootNode> {
        let loader = ResultsLoader::new(&self.config, screenshots);
        let mut root = RootNode::new();
        let file_count = loader.load_dirs(
            results_opts.results_dirs.iter().map(|dir| dir.as_path()),
            &mut root,
        )?;

        if file_count == 0 {
            let pattern = format!("{}*{}", self.config.file_prefix(), self.config.file_suffix());
            warn!(
                "no result files matching `{}` found",
                pattern.style(self.output.stderr_styles().bold),
            );
        } else {
            info!(
                "loaded {} tests from {file_count} result files ({} failed, {} ignored)",
                root.test_count(),
                root.failure_count(),
                root.ignored_count(),
            );
        }
        Ok(root)
    }
}

/// Returns the exit code for a successful command, or an error if tests failed and that was
/// requested to be an error.
pub(super) fn final_result(results_opts: &ResultsOpts, failures: usize) -> Result<i32> {
    if results_opts.fail_on_test_failure && failures > 0 {
        Err(ExpectedError::TestRunFailed { failures })
    } else {
        Ok(DevmatrixExitCode::OK)
    }
}
