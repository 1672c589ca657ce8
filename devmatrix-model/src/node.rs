// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{DisplayTestDuration, OutcomeId, ResultType, TestOutcome};
use smol_str::{SmolStr, format_smolstr};
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

/// The flavor name that collapses into the bare project name in a [variant key](variant_key).
pub const MAIN_FLAVOR: &str = "main";

/// Returns the key of the variant rollup for a project and flavor.
///
/// The key is the project name alone if the flavor is [`MAIN_FLAVOR`] (compared
/// case-insensitively), and `<project>:<flavor>` otherwise.
///
/// ```
/// use devmatrix_model::variant_key;
///
/// assert_eq!(variant_key("app", "Main"), "app");
/// assert_eq!(variant_key("app", "paid"), "app:paid");
/// ```
pub fn variant_key(project: &str, flavor: &str) -> SmolStr {
    if flavor.eq_ignore_ascii_case(MAIN_FLAVOR) {
        SmolStr::new(project)
    } else {
        format_smolstr!("{project}:{flavor}")
    }
}

/// The level of the tree a [`ResultNode`] sits at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// All results in the report.
    Root,

    /// All results within a package.
    Package,

    /// All results within a class.
    Class,

    /// A rollup of results on a single device.
    Device,

    /// A rollup of results for a single build variant.
    Variant,
}

impl NodeKind {
    /// Returns true for the device and variant rollups.
    pub fn is_rollup(self) -> bool {
        matches!(self, Self::Device | Self::Variant)
    }
}

/// Aggregated counts, durations and failure sets for one node of the report.
///
/// Root, package and class levels embed a `ResultNode` and keep device and variant rollups
/// underneath it. Rollups are `ResultNode`s themselves, with empty rollup maps of their own.
#[derive(Clone, Debug)]
pub struct ResultNode {
    kind: NodeKind,
    name: SmolStr,
    test_count: usize,
    duration: Duration,
    failures: BTreeSet<OutcomeId>,
    ignored: BTreeSet<OutcomeId>,
    devices: BTreeMap<SmolStr, ResultNode>,
    variants: BTreeMap<SmolStr, ResultNode>,
}

impl ResultNode {
    /// Creates an empty node.
    pub fn new(kind: NodeKind, name: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            name: name.into(),
            test_count: 0,
            duration: Duration::ZERO,
            failures: BTreeSet::new(),
            ignored: BTreeSet::new(),
            devices: BTreeMap::new(),
            variants: BTreeMap::new(),
        }
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The name of this node: a package or class name, a device name, or a variant key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The title shown for this node in reports.
    pub fn title(&self) -> String {
        match self.kind {
            NodeKind::Root => "Test Summary".to_owned(),
            NodeKind::Package if self.name == crate::DEFAULT_PACKAGE => {
                "Default package".to_owned()
            }
            NodeKind::Package => format!("Package {}", self.name),
            NodeKind::Class => format!("Class {}", self.name),
            NodeKind::Device | NodeKind::Variant => self.name.to_string(),
        }
    }

    /// Counts the outcome once at this node.
    ///
    /// Rollups are not touched; see [`Self::record_outcome`].
    pub fn record_test(&mut self, outcome: &TestOutcome) {
        self.test_count += 1;
        self.duration += outcome.duration();
    }

    /// Counts the outcome at this node and at the matching device and variant rollups, creating
    /// them if necessary.
    pub(crate) fn record_outcome(&mut self, outcome: &TestOutcome) {
        self.record_test(outcome);
        self.ensure_device(outcome.device()).record_test(outcome);
        self.ensure_variant(outcome.project(), outcome.flavor())
            .record_test(outcome);
    }

    /// Records a failed outcome at this node and at the matching rollups, if they exist.
    ///
    /// Recording the same outcome more than once has no further effect. Returns true if the
    /// outcome was newly added to this node's failure set.
    pub fn record_failure(
        &mut self,
        id: &OutcomeId,
        device: &str,
        project: &str,
        flavor: &str,
    ) -> bool {
        if let Some(rollup) = self.devices.get_mut(device) {
            rollup.failures.insert(id.clone());
        }
        if let Some(rollup) = self.variants.get_mut(&variant_key(project, flavor)) {
            rollup.failures.insert(id.clone());
        }
        self.failures.insert(id.clone())
    }

    /// Records an ignored outcome at this node and at the matching rollups, if they exist.
    ///
    /// Returns true if the outcome was newly added to this node's ignored set.
    pub fn record_ignored(&mut self, outcome: &TestOutcome) -> bool {
        let id = outcome.id();
        if let Some(rollup) = self.devices.get_mut(outcome.device()) {
            rollup.ignored.insert(id.clone());
        }
        if let Some(rollup) = self.variants.get_mut(&outcome.variant_key()) {
            rollup.ignored.insert(id.clone());
        }
        self.ignored.insert(id.clone())
    }

    /// Returns the rollup for a device, creating it if it doesn't exist.
    pub fn ensure_device(&mut self, name: &str) -> &mut ResultNode {
        self.devices
            .entry(SmolStr::new(name))
            .or_insert_with(|| ResultNode::new(NodeKind::Device, name))
    }

    /// Returns the rollup for a project and flavor, creating it if it doesn't exist.
    pub fn ensure_variant(&mut self, project: &str, flavor: &str) -> &mut ResultNode {
        let key = variant_key(project, flavor);
        self.variants
            .entry(key.clone())
            .or_insert_with(|| ResultNode::new(NodeKind::Variant, key))
    }

    /// The number of outcomes recorded at this node.
    pub fn test_count(&self) -> usize {
        self.test_count
    }

    /// The number of distinct failed outcomes.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// The number of distinct ignored outcomes.
    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }

    /// The total time taken by all outcomes recorded at this node.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The total duration as shown in reports, or `-` if nothing was recorded.
    pub fn formatted_duration(&self) -> String {
        if self.test_count == 0 {
            "-".to_owned()
        } else {
            DisplayTestDuration(self.duration).to_string()
        }
    }

    /// The percentage of outcomes that did not fail, rounded down.
    ///
    /// Returns `None` if nothing was recorded.
    pub fn success_rate(&self) -> Option<u32> {
        if self.test_count == 0 {
            return None;
        }
        let passed = self.test_count.saturating_sub(self.failures.len());
        // Integer division truncates, which is what's wanted: 5 of 7 is 71%, not 72%.
        let rate = passed * 100 / self.test_count;
        Some(rate as u32)
    }

    /// The success rate as shown in reports, such as `71%`, or `-` if nothing was recorded.
    pub fn formatted_success_rate(&self) -> String {
        match self.success_rate() {
            Some(rate) => format!("{rate}%"),
            None => "-".to_owned(),
        }
    }

    /// [`ResultType::Failure`] if any outcome failed, [`ResultType::Success`] otherwise.
    ///
    /// Ignored outcomes don't affect the result.
    pub fn result_type(&self) -> ResultType {
        if self.failures.is_empty() {
            ResultType::Success
        } else {
            ResultType::Failure
        }
    }

    /// The failed outcomes, in outcome order.
    pub fn failures(&self) -> &BTreeSet<OutcomeId> {
        &self.failures
    }

    /// The ignored outcomes, in outcome order.
    pub fn ignored(&self) -> &BTreeSet<OutcomeId> {
        &self.ignored
    }

    /// The device rollups, keyed by device name.
    pub fn devices(&self) -> &BTreeMap<SmolStr, ResultNode> {
        &self.devices
    }

    /// The variant rollups, keyed by variant key.
    pub fn variants(&self) -> &BTreeMap<SmolStr, ResultNode> {
        &self.variants
    }

    /// Returns the rollup for a device, if any outcome was recorded on it.
    pub fn device(&self, name: &str) -> Option<&ResultNode> {
        self.devices.get(name)
    }

    /// Returns the rollup for a variant key, if any outcome was recorded for it.
    pub fn variant(&self, key: &str) -> Option<&ResultNode> {
        self.variants.get(key)
    }
}

/// Read access to the [`ResultNode`] behind each level of the tree.
///
/// Lets renderers treat roots, packages, classes and rollups uniformly.
pub trait AggregateResults {
    /// Returns the aggregated results for this node.
    fn results(&self) -> &ResultNode;

    /// See [`ResultNode::name`].
    fn name(&self) -> &str {
        self.results().name()
    }

    /// See [`ResultNode::title`].
    fn title(&self) -> String {
        self.results().title()
    }

    /// See [`ResultNode::test_count`].
    fn test_count(&self) -> usize {
        self.results().test_count()
    }

    /// See [`ResultNode::failure_count`].
    fn failure_count(&self) -> usize {
        self.results().failure_count()
    }

    /// See [`ResultNode::ignored_count`].
    fn ignored_count(&self) -> usize {
        self.results().ignored_count()
    }

    /// See [`ResultNode::duration`].
    fn duration(&self) -> Duration {
        self.results().duration()
    }

    /// See [`ResultNode::formatted_duration`].
    fn formatted_duration(&self) -> String {
        self.results().formatted_duration()
    }

    /// See [`ResultNode::success_rate`].
    fn success_rate(&self) -> Option<u32> {
        self.results().success_rate()
    }

    /// See [`ResultNode::formatted_success_rate`].
    fn formatted_success_rate(&self) -> String {
        self.results().formatted_success_rate()
    }

    /// See [`ResultNode::result_type`].
    fn result_type(&self) -> ResultType {
        self.results().result_type()
    }
}

impl AggregateResults for ResultNode {
    fn results(&self) -> &ResultNode {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("app", "main", "app"; "main flavor")]
    #[test_case("app", "Main", "app"; "main flavor is case insensitive")]
    #[test_case("app", "MAIN", "app"; "main flavor upper case")]
    #[test_case("app", "paid", "app:paid"; "other flavor")]
    #[test_case("app", "", "app:"; "empty flavor")]
    fn variant_keys(project: &str, flavor: &str, expected: &str) {
        assert_eq!(variant_key(project, flavor), expected);
    }

    fn outcome(test_name: &str, device: &str, seq: u64) -> TestOutcome {
        TestOutcome::new(
            OutcomeId::new("pkg.A", test_name, device, "main", seq),
            "app",
            Duration::from_millis(100),
        )
    }

    #[test_case(0, 0, None, "-"; "no tests")]
    #[test_case(1, 0, Some(100), "100%"; "all passed")]
    #[test_case(7, 2, Some(71), "71%"; "truncates instead of rounding")]
    #[test_case(3, 1, Some(66), "66%"; "two thirds")]
    #[test_case(3, 3, Some(0), "0%"; "all failed")]
    fn success_rate(tests: u64, failures: u64, rate: Option<u32>, formatted: &str) {
        let mut node = ResultNode::new(NodeKind::Class, "pkg.A");
        for seq in 0..tests {
            let outcome = outcome("t", "d1", seq);
            node.record_outcome(&outcome);
            if seq < failures {
                node.record_failure(outcome.id(), "d1", "app", "main");
            }
        }
        assert_eq!(node.success_rate(), rate);
        assert_eq!(node.formatted_success_rate(), formatted);
    }

    #[test]
    fn ensure_device_is_idempotent() {
        let mut node = ResultNode::new(NodeKind::Root, "root");
        let first = outcome("t1", "d1", 0);
        node.ensure_device("d1").record_test(&first);

        let first_ptr: *const ResultNode = node.ensure_device("d1");
        let second_ptr: *const ResultNode = node.ensure_device("d1");
        assert!(std::ptr::eq(first_ptr, second_ptr));
        assert_eq!(node.devices().len(), 1);
        assert_eq!(
            node.device("d1").map(ResultNode::test_count),
            Some(1),
            "counters are not reset"
        );
    }

    #[test]
    fn ensure_variant_collapses_main() {
        let mut node = ResultNode::new(NodeKind::Root, "root");
        node.ensure_variant("app", "main");
        node.ensure_variant("app", "Main");
        node.ensure_variant("app", "paid");
        let keys: Vec<_> = node.variants().keys().map(|key| key.as_str()).collect();
        assert_eq!(keys, ["app", "app:paid"]);
        assert_eq!(
            node.variant("app:paid").map(ResultNode::kind),
            Some(NodeKind::Variant)
        );
    }

    #[test]
    fn failures_reach_existing_rollups_only() {
        let mut node = ResultNode::new(NodeKind::Package, "pkg");
        let on_d1 = outcome("t1", "d1", 0);
        node.record_outcome(&on_d1);

        assert!(node.record_failure(on_d1.id(), "d1", "app", "main"));
        assert!(
            !node.record_failure(on_d1.id(), "d1", "app", "main"),
            "second record is a no-op"
        );
        assert_eq!(node.failure_count(), 1);
        assert_eq!(node.result_type(), ResultType::Failure);

        let d1 = node.device("d1").expect("device rollup exists");
        assert!(d1.failures().contains(on_d1.id()));
        let app = node.variant("app").expect("variant rollup exists");
        assert!(app.failures().contains(on_d1.id()));

        // No rollup for d2 exists, so none is created.
        let on_d2 = outcome("t1", "d2", 1);
        node.record_failure(on_d2.id(), "d2", "app", "main");
        assert!(node.device("d2").is_none());
        assert_eq!(node.failure_count(), 2);
    }

    #[test]
    fn ignored_outcomes_do_not_flip_result_type() {
        let mut node = ResultNode::new(NodeKind::Class, "pkg.A");
        let skipped = outcome("t1", "d1", 0);
        node.record_outcome(&skipped);
        node.record_ignored(&skipped);

        assert_eq!(node.ignored_count(), 1);
        assert_eq!(node.result_type(), ResultType::Success);
        assert_eq!(
            node.device("d1").map(ResultNode::ignored_count),
            Some(1)
        );
        assert_eq!(node.variant("app").map(ResultNode::ignored_count), Some(1));
    }

    #[test_case(NodeKind::Root, "root", "Test Summary"; "root")]
    #[test_case(NodeKind::Package, "com.foo", "Package com.foo"; "package")]
    #[test_case(NodeKind::Package, crate::DEFAULT_PACKAGE, "Default package"; "default package")]
    #[test_case(NodeKind::Class, "com.foo.Bar", "Class com.foo.Bar"; "class")]
    #[test_case(NodeKind::Device, "pixel-7", "pixel-7"; "device")]
    #[test_case(NodeKind::Variant, "app:paid", "app:paid"; "variant")]
    fn titles(kind: NodeKind, name: &str, expected: &str) {
        assert_eq!(ResultNode::new(kind, name).title(), expected);
    }

    #[test]
    fn formatted_duration_of_empty_node() {
        let mut node = ResultNode::new(NodeKind::Device, "d1");
        assert_eq!(node.formatted_duration(), "-");
        node.record_test(&outcome("t1", "d1", 0));
        assert_eq!(node.formatted_duration(), "0.100s");
    }
}
