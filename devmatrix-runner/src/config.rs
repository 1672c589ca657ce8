// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for devmatrix.
//!
//! Configuration is layered: the defaults embedded in the binary come first, followed by either
//! `.config/devmatrix.toml` under the root directory (if it exists) or an explicitly provided
//! config file (which must exist).

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Overall configuration for devmatrix.
#[derive(Clone, Debug)]
pub struct DevmatrixConfig {
    root: Utf8PathBuf,
    inner: DevmatrixConfigDeserialize,
}

impl DevmatrixConfig {
    /// The default location of the config within the root directory.
    pub const CONFIG_PATH: &'static str = ".config/devmatrix.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the configuration from the default location under `root`, or from `config_file` if
    /// provided.
    ///
    /// Unknown keys are logged as warnings.
    pub fn from_sources(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(root, config_file, |config_file, unknown| {
            warn!(
                "ignoring unknown configuration keys in config file {config_file}: {}",
                itertools::join(unknown, ", ")
            );
        })
    }

    /// Reads the configuration, reporting unknown keys through `unknown_callback` instead of
    /// logging them.
    pub fn from_sources_with_warnings(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let root = root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (inner, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        Ok(Self { root, inner })
    }

    /// Returns the default configuration.
    #[cfg(test)]
    pub(crate) fn default_config(root: impl Into<Utf8PathBuf>) -> Self {
        let (inner, unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        assert!(
            unknown.is_empty(),
            "found unknown keys in default config: {}",
            itertools::join(&unknown, ", ")
        );
        Self {
            root: root.into(),
            inner,
        }
    }

    /// The root directory relative paths are resolved against.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The prefix result file names must start with.
    pub fn file_prefix(&self) -> &str {
        &self.inner.results.file_prefix
    }

    /// The suffix result file names must end with.
    pub fn file_suffix(&self) -> &str {
        &self.inner.results.file_suffix
    }

    /// The title of the HTML report.
    pub fn report_title(&self) -> &str {
        &self.inner.report.title
    }

    /// The directory the HTML report is written to.
    pub fn report_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.inner.report.dir)
    }

    /// The screenshot manifest, if one is configured.
    pub fn screenshot_manifest(&self) -> Option<Utf8PathBuf> {
        self.inner
            .screenshots
            .manifest
            .as_ref()
            .map(|manifest| self.root.join(manifest))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(DevmatrixConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: DevmatrixConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already reports the key, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DevmatrixConfigDeserialize {
    results: ResultsConfig,
    report: ReportConfig,
    #[serde(default)]
    screenshots: ScreenshotsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ResultsConfig {
    file_prefix: String,
    file_suffix: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportConfig {
    title: String,
    dir: Utf8PathBuf,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ScreenshotsConfig {
    #[serde(default)]
    manifest: Option<Utf8PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn write_config(dir: &Utf8TempDir, contents: &str) -> Utf8PathBuf {
        let config_dir = dir.path().join(".config");
        fs_err::create_dir_all(&config_dir).expect("created config dir");
        let path = config_dir.join("devmatrix.toml");
        fs_err::write(&path, contents).expect("wrote config");
        path
    }

    #[test]
    fn default_config_is_valid() {
        let mut unknown_keys = Vec::new();
        let config = DevmatrixConfig::from_sources_with_warnings(
            "/nonexistent-root",
            None,
            |_, unknown| unknown_keys.extend(unknown.iter().cloned()),
        )
        .expect("default config parses");

        assert!(unknown_keys.is_empty(), "default config has no unknown keys");
        assert_eq!(config.file_prefix(), "TEST-");
        assert_eq!(config.file_suffix(), ".xml");
        assert_eq!(config.report_title(), "Test Summary");
        assert_eq!(
            config.report_dir(),
            Utf8PathBuf::from("/nonexistent-root/target/devmatrix")
        );
        assert_eq!(config.screenshot_manifest(), None);
    }

    #[test]
    fn overrides_from_root() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        write_config(
            &dir,
            indoc! {r#"
                [results]
                file-prefix = "RESULT-"

                [report]
                title = "Nightly device run"

                [screenshots]
                manifest = "out/screenshots.json"
            "#},
        );

        let config = DevmatrixConfig::from_sources(dir.path(), None).expect("config parses");
        assert_eq!(config.file_prefix(), "RESULT-");
        assert_eq!(config.file_suffix(), ".xml", "unset keys keep their defaults");
        assert_eq!(config.report_title(), "Nightly device run");
        assert_eq!(
            config.screenshot_manifest(),
            Some(dir.path().join("out/screenshots.json"))
        );
    }

    #[test]
    fn unknown_keys_are_reported() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let path = write_config(
            &dir,
            indoc! {r#"
                [report]
                titel = "typo"

                [extra]
                key = 1
            "#},
        );

        let mut reported = Vec::new();
        DevmatrixConfig::from_sources_with_warnings(dir.path(), None, |config_file, unknown| {
            reported.push((config_file.to_owned(), unknown.clone()));
        })
        .expect("config parses");

        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].0, path);
        assert!(reported[0].1.contains("report.titel"), "{:?}", reported[0].1);
        assert!(reported[0].1.iter().any(|key| key.starts_with("extra")));
    }

    #[test]
    fn invalid_value_is_an_error() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        write_config(
            &dir,
            indoc! {r#"
                [results]
                file-prefix = ["not", "a", "string"]
            "#},
        );

        let error = DevmatrixConfig::from_sources(dir.path(), None).expect_err("config is invalid");
        match error.kind() {
            ConfigParseErrorKind::DeserializeError(error) => {
                assert_eq!(error.path().to_string(), "results.file-prefix");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let missing = dir.path().join("missing.toml");

        let error = DevmatrixConfig::from_sources(dir.path(), Some(&missing))
            .expect_err("missing explicit config is an error");
        assert_eq!(error.config_file(), &missing);
        assert!(matches!(error.kind(), ConfigParseErrorKind::BuildError(_)));
    }
}
