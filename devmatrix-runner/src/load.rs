// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading JUnit-style result files into a [`RootNode`].
//!
//! Each result file describes one test suite run on one device. Loading happens in two steps: the
//! file is parsed into a [`SuiteResults`], which is then merged into the tree. Properties are
//! read from the whole file before anything is merged, so a `<properties>` block that follows the
//! test cases still applies to them.

use crate::{
    config::DevmatrixConfig,
    errors::{LoadResultsError, LoadResultsErrorKind},
    helpers::parse_decimal_seconds,
    screenshots::ScreenshotManifest,
};
use camino::{Utf8Path, Utf8PathBuf};
use devmatrix_model::{RootNode, TestFailure, errors::UnknownOutcomeError};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{io, time::Duration};
use tracing::{debug, warn};

/// The results of a single test suite, as read from one result file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteResults {
    /// The `name` attribute of the document element.
    pub name: String,

    /// The device the suite ran on.
    pub device: String,

    /// The project the suite belongs to.
    pub project: String,

    /// The build flavor the suite ran against.
    pub flavor: String,

    /// Test cases, in document order.
    pub test_cases: Vec<TestCaseResult>,

    /// Test cases recorded as `<ignored-testcase>` elements, in document order.
    pub ignored_test_cases: Vec<TestCaseResult>,

    /// The text of every `<system-out>` element, in document order.
    pub standard_output: Vec<String>,

    /// The text of every `<system-err>` element, in document order.
    pub standard_error: Vec<String>,
}

/// A single test case within a [`SuiteResults`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestCaseResult {
    /// The fully qualified class name.
    pub class_name: String,

    /// The test name.
    pub name: String,

    /// The time taken, truncated to milliseconds.
    pub duration: Duration,

    /// True if the test was skipped or ignored.
    pub ignored: bool,

    /// Failures recorded for this test case.
    pub failures: Vec<FailureResult>,
}

/// A `<failure>` element within a test case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureResult {
    /// The `message` attribute.
    pub message: String,

    /// The `type` attribute, if present.
    pub exception_type: Option<String>,

    /// The text content of the element.
    pub stack_trace: String,
}

impl SuiteResults {
    /// Parses a result file's contents.
    pub fn parse(xml: &str) -> Result<Self, LoadResultsErrorKind> {
        SuiteParser::default().parse(xml)
    }

    /// Merges these results into `root`.
    ///
    /// Failures pick up a screenshot from `screenshots` if one is recorded for their test.
    /// Ignored test cases are added with a zero duration. Standard output and standard error are
    /// attached to the class named after the suite.
    pub fn merge_into(
        &self,
        root: &mut RootNode,
        screenshots: &ScreenshotManifest,
    ) -> Result<(), UnknownOutcomeError> {
        for case in self.test_cases.iter().chain(&self.ignored_test_cases) {
            let duration = if case.ignored {
                Duration::ZERO
            } else {
                case.duration
            };
            let id = root.add_test(
                &case.class_name,
                &case.name,
                duration,
                &self.device,
                &self.project,
                &self.flavor,
            );

            // Ignored cases are never failures, whatever they contain.
            let failures = if case.ignored { &[][..] } else { &case.failures[..] };
            for failure in failures {
                let mut test_failure = TestFailure::new(&failure.message, &failure.stack_trace);
                if let Some(exception_type) = &failure.exception_type {
                    test_failure.set_exception_type(exception_type);
                }
                if let Some(screenshot) = screenshots.get(&case.class_name, &case.name) {
                    test_failure.set_screenshot_path(screenshot);
                }
                root.add_failure(&id, test_failure)?;
            }

            if case.ignored {
                root.mark_ignored(&id)?;
            }
        }

        if !self.name.is_empty() {
            let class = root.add_test_class(&self.name);
            for text in &self.standard_output {
                class.add_standard_output(text);
            }
            for text in &self.standard_error {
                class.add_standard_error(text);
            }
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextTarget {
    Failure,
    StandardOutput,
    StandardError,
}

#[derive(Debug, Default)]
struct SuiteParser {
    suite: SuiteResults,
    seen_document_element: bool,
    // Local names of the currently open elements, outermost first.
    open_elements: Vec<String>,
    current_case: Option<TestCaseResult>,
    current_case_is_ignored_element: bool,
    current_failure: Option<FailureResult>,
    // The target being captured, and the depth its element was opened at.
    capture: Option<(TextTarget, usize)>,
    text: String,
}

impl SuiteParser {
    fn parse(mut self, xml: &str) -> Result<SuiteResults, LoadResultsErrorKind> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(element) => {
                    self.start_element(&element, false)?;
                    self.open_elements.push(
                        String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
                    );
                }
                Event::Empty(element) => {
                    self.start_element(&element, true)?;
                }
                Event::End(element) => {
                    self.open_elements.pop();
                    self.end_element(element.local_name().as_ref());
                }
                Event::Text(text) => {
                    if self.capture.is_some() {
                        self.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(cdata) => {
                    if self.capture.is_some() {
                        self.text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        // The reader stops at the end of input without checking that everything was closed.
        if let Some(element) = self.open_elements.pop() {
            return Err(LoadResultsErrorKind::UnexpectedEof { element });
        }

        if !self.seen_document_element {
            return Err(LoadResultsErrorKind::Empty);
        }
        Ok(self.suite)
    }

    fn start_element(
        &mut self,
        element: &BytesStart<'_>,
        is_empty: bool,
    ) -> Result<(), LoadResultsErrorKind> {
        // Attribute lookups stop at the first match, so duplicates are only caught here.
        for attr in element.attributes() {
            attr?;
        }

        if !self.seen_document_element {
            self.seen_document_element = true;
            self.suite.name = attribute(element, "name")?.unwrap_or_default();
        }

        match element.local_name().as_ref() {
            b"properties" => {
                // Only the last properties block counts, and it counts in full.
                self.suite.device.clear();
                self.suite.project.clear();
                self.suite.flavor.clear();
            }
            b"property" => {
                let name = attribute(element, "name")?;
                let value = attribute(element, "value")?.unwrap_or_default();
                match name.as_deref() {
                    Some("device") => self.suite.device = value,
                    Some("project") => self.suite.project = value,
                    Some("flavor") => self.suite.flavor = value,
                    _ => {}
                }
            }
            tag @ (b"testcase" | b"ignored-testcase") => {
                let is_ignored_element = tag == b"ignored-testcase";
                let case = self.test_case(element, is_ignored_element)?;
                if is_empty {
                    self.push_case(case, is_ignored_element);
                } else {
                    self.current_case = Some(case);
                    self.current_case_is_ignored_element = is_ignored_element;
                }
            }
            b"skipped" => {
                if let Some(case) = &mut self.current_case {
                    case.ignored = true;
                }
            }
            b"failure" if self.current_case.is_some() => {
                let failure = FailureResult {
                    message: attribute(element, "message")?.unwrap_or_default(),
                    exception_type: attribute(element, "type")?,
                    stack_trace: String::new(),
                };
                if is_empty {
                    if let Some(case) = &mut self.current_case {
                        case.failures.push(failure);
                    }
                } else {
                    self.current_failure = Some(failure);
                    self.begin_capture(TextTarget::Failure);
                }
            }
            b"system-out" if !is_empty => self.begin_capture(TextTarget::StandardOutput),
            b"system-err" if !is_empty => self.begin_capture(TextTarget::StandardError),
            _ => {}
        }

        Ok(())
    }

    fn end_element(&mut self, tag: &[u8]) {
        if let Some((target, depth)) = self.capture {
            if depth != self.open_elements.len() {
                // A nested element inside captured text.
                return;
            }
            self.capture = None;
            let text = std::mem::take(&mut self.text);
            match target {
                TextTarget::Failure => {
                    if let (Some(mut failure), Some(case)) =
                        (self.current_failure.take(), &mut self.current_case)
                    {
                        failure.stack_trace = text;
                        case.failures.push(failure);
                    }
                }
                TextTarget::StandardOutput => self.suite.standard_output.push(text),
                TextTarget::StandardError => self.suite.standard_error.push(text),
            }
            return;
        }

        if matches!(tag, b"testcase" | b"ignored-testcase") {
            if let Some(case) = self.current_case.take() {
                self.push_case(case, self.current_case_is_ignored_element);
            }
        }
    }

    fn begin_capture(&mut self, target: TextTarget) {
        if self.capture.is_none() {
            self.text.clear();
            self.capture = Some((target, self.open_elements.len()));
        }
    }

    fn test_case(
        &self,
        element: &BytesStart<'_>,
        is_ignored_element: bool,
    ) -> Result<TestCaseResult, LoadResultsErrorKind> {
        let name = attribute(element, "name")?.unwrap_or_default();
        let duration = match attribute(element, "time")? {
            Some(time) if !is_ignored_element => parse_decimal_seconds(&time).map_err(|error| {
                LoadResultsErrorKind::InvalidTime {
                    test_name: name.clone(),
                    error,
                }
            })?,
            _ => Duration::ZERO,
        };
        Ok(TestCaseResult {
            class_name: attribute(element, "classname")?.unwrap_or_default(),
            name,
            duration,
            ignored: is_ignored_element,
            failures: Vec::new(),
        })
    }

    fn push_case(&mut self, case: TestCaseResult, is_ignored_element: bool) {
        if is_ignored_element {
            self.suite.ignored_test_cases.push(case);
        } else {
            self.suite.test_cases.push(case);
        }
    }
}

fn attribute(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, LoadResultsErrorKind> {
    match element.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Discovers result files and merges them into a [`RootNode`].
#[derive(Clone, Debug)]
pub struct ResultsLoader<'a> {
    file_prefix: &'a str,
    file_suffix: &'a str,
    screenshots: &'a ScreenshotManifest,
}

impl<'a> ResultsLoader<'a> {
    /// Creates a loader that uses the file name patterns from `config`.
    pub fn new(config: &'a DevmatrixConfig, screenshots: &'a ScreenshotManifest) -> Self {
        Self::with_patterns(config.file_prefix(), config.file_suffix(), screenshots)
    }

    /// Creates a loader that reads files whose names start with `file_prefix` and end with
    /// `file_suffix`.
    pub fn with_patterns(
        file_prefix: &'a str,
        file_suffix: &'a str,
        screenshots: &'a ScreenshotManifest,
    ) -> Self {
        Self {
            file_prefix,
            file_suffix,
            screenshots,
        }
    }

    /// Returns the result files in `dir`, sorted by name.
    ///
    /// A directory that doesn't exist contains no result files.
    pub fn discover(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, LoadResultsError> {
        let entries = match fs_err::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!("results directory {dir} does not exist, skipping");
                return Ok(Vec::new());
            }
            Err(error) => {
                return Err(LoadResultsError::new(
                    dir,
                    LoadResultsErrorKind::ReadDir(error),
                ));
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|error| LoadResultsError::new(dir, LoadResultsErrorKind::ReadDir(error)))?;
            let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
                LoadResultsError::new(dir, LoadResultsErrorKind::NonUtf8Path(path))
            })?;
            let Some(file_name) = path.file_name() else {
                continue;
            };
            if file_name.starts_with(self.file_prefix)
                && file_name.ends_with(self.file_suffix)
                && path.is_file()
            {
                files.push(path);
            }
        }
        files.sort_unstable();
        Ok(files)
    }

    /// Parses a single result file and merges it into `root`.
    ///
    /// Returns the number of test cases merged.
    pub fn load_file(
        &self,
        path: &Utf8Path,
        root: &mut RootNode,
    ) -> Result<usize, LoadResultsError> {
        let contents = fs_err::read_to_string(path)
            .map_err(|error| LoadResultsError::new(path, LoadResultsErrorKind::Read(error)))?;
        let suite =
            SuiteResults::parse(&contents).map_err(|kind| LoadResultsError::new(path, kind))?;
        suite
            .merge_into(root, self.screenshots)
            .map_err(|error| LoadResultsError::new(path, LoadResultsErrorKind::Merge(error)))?;

        let count = suite.test_cases.len() + suite.ignored_test_cases.len();
        debug!(
            "merged {count} test cases from {path} (device: {:?}, project: {:?}, flavor: {:?})",
            suite.device, suite.project, suite.flavor,
        );
        Ok(count)
    }

    /// Loads every result file in `dirs` into `root`, in directory order and then file name
    /// order.
    ///
    /// The first file that fails to load aborts the whole load. Returns the number of files
    /// loaded.
    pub fn load_dirs<'d>(
        &self,
        dirs: impl IntoIterator<Item = &'d Utf8Path>,
        root: &mut RootNode,
    ) -> Result<usize, LoadResultsError> {
        let mut loaded = 0;
        for dir in dirs {
            for path in self.discover(dir)? {
                self.load_file(&path, root)?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }
}
