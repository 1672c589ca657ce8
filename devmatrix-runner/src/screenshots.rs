// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Association of screenshots with failed tests.

use crate::errors::ScreenshotManifestError;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use tracing::debug;

/// A mapping from tests to the screenshots taken when they failed.
///
/// The manifest is a JSON object whose keys are `<class name>#<test name>` and whose values are
/// paths to screenshots:
///
/// ```json
/// { "com.example.LoginTest#rejectsBadPassword": "screenshots/login-bad-password.png" }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScreenshotManifest {
    screenshots: BTreeMap<String, Utf8PathBuf>,
}

impl ScreenshotManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a manifest from a JSON file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ScreenshotManifestError> {
        let contents =
            fs_err::read_to_string(path).map_err(|error| ScreenshotManifestError::Read {
                path: path.to_owned(),
                error,
            })?;
        let screenshots: BTreeMap<String, Utf8PathBuf> = serde_json::from_str(&contents)
            .map_err(|error| ScreenshotManifestError::Parse {
                path: path.to_owned(),
                error,
            })?;
        debug!(
            "loaded {} screenshot entries from {path}",
            screenshots.len()
        );
        Ok(Self { screenshots })
    }

    /// Adds a screenshot for a test, replacing any existing entry.
    pub fn insert(
        &mut self,
        class_name: &str,
        test_name: &str,
        path: impl Into<Utf8PathBuf>,
    ) -> &mut Self {
        self.screenshots
            .insert(Self::key(class_name, test_name), path.into());
        self
    }

    /// Returns the screenshot for a test, if one was recorded.
    pub fn get(&self, class_name: &str, test_name: &str) -> Option<&Utf8Path> {
        self.screenshots
            .get(&Self::key(class_name, test_name))
            .map(Utf8PathBuf::as_path)
    }

    /// Returns the number of entries in the manifest.
    pub fn len(&self) -> usize {
        self.screenshots.len()
    }

    /// Returns true if the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty()
    }

    fn key(class_name: &str, test_name: &str) -> String {
        format!("{class_name}#{test_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn reads_manifest() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let path = dir.path().join("screenshots.json");
        fs_err::write(
            &path,
            indoc! {r#"
                {
                    "com.example.LoginTest#rejectsBadPassword": "shots/login.png",
                    "Bare#t1": "/abs/bare.png"
                }
            "#},
        )
        .expect("wrote manifest");

        let manifest = ScreenshotManifest::from_path(&path).expect("manifest parses");
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.get("com.example.LoginTest", "rejectsBadPassword"),
            Some(Utf8Path::new("shots/login.png"))
        );
        assert_eq!(manifest.get("Bare", "t1"), Some(Utf8Path::new("/abs/bare.png")));
        assert_eq!(manifest.get("com.example.LoginTest", "other"), None);
    }

    #[test]
    fn rejects_non_object() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let path = dir.path().join("screenshots.json");
        fs_err::write(&path, r#"["not", "an", "object"]"#).expect("wrote manifest");

        let error = ScreenshotManifest::from_path(&path).expect_err("manifest is invalid");
        assert!(
            matches!(&error, ScreenshotManifestError::Parse { path: error_path, .. } if *error_path == path),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn missing_manifest_is_a_read_error() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let error = ScreenshotManifest::from_path(&dir.path().join("missing.json"))
            .expect_err("manifest is missing");
        assert!(matches!(error, ScreenshotManifestError::Read { .. }));
    }
}
