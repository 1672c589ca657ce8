// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{DisplayTestDuration, variant_key};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use smol_str::SmolStr;
use std::{fmt, time::Duration};

/// Identifies a single [`TestOutcome`] within a [`RootNode`](crate::RootNode).
///
/// Ids sort by class name, test name, device and flavor. Two outcomes that agree on all four
/// (for example, the same result file merged twice) are told apart by the order in which they
/// were added.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutcomeId {
    class_name: SmolStr,
    test_name: SmolStr,
    device: SmolStr,
    flavor: SmolStr,
    seq: u64,
}

impl OutcomeId {
    pub(crate) fn new(
        class_name: &str,
        test_name: &str,
        device: &str,
        flavor: &str,
        seq: u64,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            test_name: test_name.into(),
            device: device.into(),
            flavor: flavor.into(),
            seq,
        }
    }

    /// The fully qualified class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The test name within the class.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// The device the test ran on.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// The flavor of the build the test ran against.
    pub fn flavor(&self) -> &str {
        &self.flavor
    }

    /// A fragment suitable for use as an HTML anchor.
    pub fn anchor(&self) -> String {
        format!("{}-{}", self.test_name, self.seq)
    }
}

/// The result of a test, or the combined result of a group of tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultType {
    /// The test passed.
    Success,

    /// The test failed.
    Failure,

    /// The test was ignored, or nothing has been observed yet.
    #[default]
    Skipped,
}

impl ResultType {
    /// Combines two results of the same logical test observed on different devices.
    ///
    /// A failure anywhere is a failure. Otherwise a success anywhere is a success. Only if every
    /// input was skipped is the result skipped, which makes [`ResultType::Skipped`] the identity
    /// for folding:
    ///
    /// ```
    /// use devmatrix_model::ResultType;
    ///
    /// let combined = [ResultType::Success, ResultType::Skipped]
    ///     .into_iter()
    ///     .fold(ResultType::default(), ResultType::combine);
    /// assert_eq!(combined, ResultType::Success);
    /// ```
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Failure, _) | (_, Self::Failure) => Self::Failure,
            (Self::Success, _) | (_, Self::Success) => Self::Success,
            (Self::Skipped, Self::Skipped) => Self::Skipped,
        }
    }

    /// The CSS class used for this result.
    pub fn status_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failures",
            Self::Skipped => "skipped",
        }
    }

    /// The label shown for a single test with this result.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "passed",
            Self::Failure => "failed",
            Self::Skipped => "ignored",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single failure attached to a [`TestOutcome`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestFailure {
    /// The failure message, usually the first line of the exception.
    pub message: String,

    /// The full stack trace.
    pub stack_trace: String,

    /// The exception type, if the result file recorded one.
    pub exception_type: Option<String>,

    /// A screenshot captured when the test failed, relative to the report directory.
    pub screenshot_path: Option<Utf8PathBuf>,
}

impl TestFailure {
    /// Creates a new `TestFailure` with the given message and stack trace.
    pub fn new(message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: stack_trace.into(),
            exception_type: None,
            screenshot_path: None,
        }
    }

    /// Sets the exception type.
    pub fn set_exception_type(&mut self, exception_type: impl Into<String>) -> &mut Self {
        self.exception_type = Some(exception_type.into());
        self
    }

    /// Sets the screenshot path.
    pub fn set_screenshot_path(&mut self, path: impl Into<Utf8PathBuf>) -> &mut Self {
        self.screenshot_path = Some(path.into());
        self
    }

    /// Returns the screenshot path, if any.
    pub fn screenshot_path(&self) -> Option<&Utf8Path> {
        self.screenshot_path.as_deref()
    }
}

/// One execution of one test on one device against one build variant.
#[derive(Clone, Debug)]
pub struct TestOutcome {
    id: OutcomeId,
    project: SmolStr,
    duration: Duration,
    ignored: bool,
    failures: Vec<TestFailure>,
}

impl TestOutcome {
    pub(crate) fn new(id: OutcomeId, project: &str, duration: Duration) -> Self {
        Self {
            id,
            project: project.into(),
            duration,
            ignored: false,
            failures: Vec::new(),
        }
    }

    /// Returns the id of this outcome.
    pub fn id(&self) -> &OutcomeId {
        &self.id
    }

    /// The fully qualified class name.
    pub fn class_name(&self) -> &str {
        self.id.class_name()
    }

    /// The test name.
    pub fn name(&self) -> &str {
        self.id.test_name()
    }

    /// The device this outcome was recorded on.
    pub fn device(&self) -> &str {
        self.id.device()
    }

    /// The project this outcome was recorded for.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The build flavor this outcome was recorded for.
    pub fn flavor(&self) -> &str {
        self.id.flavor()
    }

    /// The key of the variant rollup this outcome belongs to.
    pub fn variant_key(&self) -> SmolStr {
        variant_key(&self.project, self.flavor())
    }

    /// The time taken by this test.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns true if this test was ignored.
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// The failures recorded for this test, in the order they were added.
    pub fn failures(&self) -> &[TestFailure] {
        &self.failures
    }

    /// The result of this test.
    pub fn result_type(&self) -> ResultType {
        if self.ignored {
            ResultType::Skipped
        } else if self.failures.is_empty() {
            ResultType::Success
        } else {
            ResultType::Failure
        }
    }

    /// The duration as shown in reports, or `-` for ignored tests.
    pub fn formatted_duration(&self) -> String {
        if self.ignored {
            "-".to_owned()
        } else {
            DisplayTestDuration(self.duration).to_string()
        }
    }

    /// The page title for this test.
    pub fn title(&self) -> String {
        format!("Test {}", self.name())
    }

    pub(crate) fn push_failure(&mut self, failure: TestFailure) {
        self.failures.push(failure);
    }

    pub(crate) fn set_ignored(&mut self) {
        self.ignored = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case(ResultType::Failure, ResultType::Success, ResultType::Failure; "failure beats success")]
    #[test_case(ResultType::Failure, ResultType::Skipped, ResultType::Failure; "failure beats skipped")]
    #[test_case(ResultType::Skipped, ResultType::Success, ResultType::Success; "success replaces skipped")]
    #[test_case(ResultType::Skipped, ResultType::Failure, ResultType::Failure; "failure replaces skipped")]
    #[test_case(ResultType::Success, ResultType::Skipped, ResultType::Success; "success survives skipped")]
    #[test_case(ResultType::Success, ResultType::Failure, ResultType::Failure; "failure replaces success")]
    #[test_case(ResultType::Skipped, ResultType::Skipped, ResultType::Skipped; "skipped stays skipped")]
    fn combine(current: ResultType, new: ResultType, expected: ResultType) {
        assert_eq!(current.combine(new), expected);
    }

    fn arb_result_type() -> impl Strategy<Value = ResultType> {
        prop_oneof![
            Just(ResultType::Success),
            Just(ResultType::Failure),
            Just(ResultType::Skipped),
        ]
    }

    #[proptest]
    fn combine_is_order_independent(
        #[strategy(proptest::collection::vec(arb_result_type(), 0..8))] results: Vec<ResultType>,
    ) {
        let forward = results
            .iter()
            .copied()
            .fold(ResultType::default(), ResultType::combine);
        let backward = results
            .iter()
            .rev()
            .copied()
            .fold(ResultType::default(), ResultType::combine);
        prop_assert_eq!(forward, backward);

        let expected = if results.contains(&ResultType::Failure) {
            ResultType::Failure
        } else if results.contains(&ResultType::Success) {
            ResultType::Success
        } else {
            ResultType::Skipped
        };
        prop_assert_eq!(forward, expected);
    }

    #[test]
    fn all_three_results_fold_to_failure() {
        let permutations = [
            [ResultType::Skipped, ResultType::Success, ResultType::Failure],
            [ResultType::Skipped, ResultType::Failure, ResultType::Success],
            [ResultType::Success, ResultType::Skipped, ResultType::Failure],
            [ResultType::Success, ResultType::Failure, ResultType::Skipped],
            [ResultType::Failure, ResultType::Skipped, ResultType::Success],
            [ResultType::Failure, ResultType::Success, ResultType::Skipped],
        ];
        for inputs in permutations {
            let combined = inputs
                .into_iter()
                .fold(ResultType::default(), ResultType::combine);
            assert_eq!(combined, ResultType::Failure, "for inputs {inputs:?}");
        }
    }

    #[test]
    fn outcome_result_type() {
        let id = OutcomeId::new("pkg.A", "t1", "d1", "main", 0);
        let mut outcome = TestOutcome::new(id, "app", Duration::from_millis(250));
        assert_eq!(outcome.result_type(), ResultType::Success);
        assert_eq!(outcome.formatted_duration(), "0.250s");

        outcome.push_failure(TestFailure::new("boom", "at pkg.A.t1"));
        assert_eq!(outcome.result_type(), ResultType::Failure);

        // An ignored test is reported as skipped even if it has failures attached.
        outcome.set_ignored();
        assert_eq!(outcome.result_type(), ResultType::Skipped);
        assert_eq!(outcome.formatted_duration(), "-");
        assert_eq!(outcome.result_type().label(), "ignored");
    }
}
