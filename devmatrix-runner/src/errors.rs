// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by devmatrix-runner.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::io;
use thiserror::Error;

/// An error that occurred while reading devmatrix configuration.
#[derive(Debug, Error)]
#[error("failed to parse devmatrix config at `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`].
#[derive(Debug, Error)]
pub enum ConfigParseErrorKind {
    /// The config sources could not be read or combined.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The combined config could not be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while parsing a decimal number of seconds.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid duration `{input}`: {reason}")]
pub struct ParseDecimalError {
    input: String,
    reason: &'static str,
}

impl ParseDecimalError {
    pub(crate) fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

/// An error that occurred while loading test results.
#[derive(Debug, Error)]
#[error("could not load test results from `{path}`")]
pub struct LoadResultsError {
    path: Utf8PathBuf,
    #[source]
    kind: LoadResultsErrorKind,
}

impl LoadResultsError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, kind: LoadResultsErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns the file or directory that could not be loaded.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &LoadResultsErrorKind {
        &self.kind
    }
}

/// The kind of [`LoadResultsError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadResultsErrorKind {
    /// A results directory could not be listed.
    #[error("error reading directory")]
    ReadDir(#[source] io::Error),

    /// A results directory contained a path that isn't valid UTF-8.
    #[error("directory entry `{}` is not valid UTF-8", .0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// A results file could not be read.
    #[error("error reading file")]
    Read(#[source] io::Error),

    /// A results file is not well-formed XML.
    #[error("error parsing XML")]
    Xml(#[source] quick_xml::Error),

    /// A test case had a `time` attribute that couldn't be parsed.
    #[error("invalid time for test case `{test_name}`")]
    InvalidTime {
        /// The name of the test case.
        test_name: String,

        /// The underlying error.
        #[source]
        error: ParseDecimalError,
    },

    /// The parsed results could not be merged into the tree.
    #[error("error merging test results")]
    Merge(#[source] devmatrix_model::errors::UnknownOutcomeError),

    /// The file had no document element.
    #[error("file does not contain any elements")]
    Empty,

    /// The file ended while an element was still open, for example because it was cut off
    /// mid-write.
    #[error("unexpected end of file: element `{element}` was not closed")]
    UnexpectedEof {
        /// The innermost element that was still open.
        element: String,
    },
}

impl From<quick_xml::Error> for LoadResultsErrorKind {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error)
    }
}

impl From<quick_xml::events::attributes::AttrError> for LoadResultsErrorKind {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(error.into())
    }
}

/// An error that occurred while reading a screenshot manifest.
#[derive(Debug, Error)]
pub enum ScreenshotManifestError {
    /// The manifest could not be read.
    #[error("error reading screenshot manifest `{path}`")]
    Read {
        /// The path to the manifest.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The manifest is not a JSON object mapping test names to paths.
    #[error("error parsing screenshot manifest `{path}`")]
    Parse {
        /// The path to the manifest.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurred while writing a report.
#[derive(Debug, Error)]
pub enum WriteReportError {
    /// The report directory could not be created.
    #[error("error creating report directory `{path}`")]
    CreateDir {
        /// The directory that couldn't be created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A report file could not be written.
    #[error("error writing report file `{path}`")]
    Write {
        /// The file that couldn't be written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<io::Error>,
    },
}

/// An error that occurred while writing a summary.
#[derive(Debug, Error)]
pub enum WriteSummaryError {
    /// An I/O error occurred while writing the summary.
    #[error("error writing summary")]
    Io(#[from] io::Error),

    /// The summary could not be serialized.
    #[error("error serializing summary")]
    Json(#[from] serde_json::Error),
}
