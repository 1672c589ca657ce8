// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    AggregateResults, NodeKind, OutcomeId, ResultNode, TestFailure, TestOutcome,
    errors::UnknownOutcomeError,
};
use smol_str::SmolStr;
use std::{collections::BTreeMap, time::Duration};

/// The name of the package that classes without a package are placed in.
pub const DEFAULT_PACKAGE: &str = "default-package";

/// Returns the package a class belongs to: everything before the last `.`.
///
/// Classes without a package belong to [`DEFAULT_PACKAGE`].
///
/// ```
/// use devmatrix_model::{DEFAULT_PACKAGE, package_name_for};
///
/// assert_eq!(package_name_for("com.foo.Bar"), "com.foo");
/// assert_eq!(package_name_for("Bar"), DEFAULT_PACKAGE);
/// ```
pub fn package_name_for(class_name: &str) -> &str {
    match class_name.rfind('.') {
        Some(idx) if idx > 0 => &class_name[..idx],
        _ => DEFAULT_PACKAGE,
    }
}

/// All outcomes for a single class.
#[derive(Clone, Debug)]
pub struct ClassNode {
    node: ResultNode,
    outcomes: BTreeMap<OutcomeId, TestOutcome>,
    standard_output: String,
    standard_error: String,
}

impl ClassNode {
    fn new(name: &str) -> Self {
        Self {
            node: ResultNode::new(NodeKind::Class, name),
            outcomes: BTreeMap::new(),
            standard_output: String::new(),
            standard_error: String::new(),
        }
    }

    /// The class name without its package.
    pub fn simple_name(&self) -> &str {
        let name = self.node.name();
        match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => name,
        }
    }

    /// Iterates over the outcomes in this class, in outcome order.
    pub fn outcomes(&self) -> impl ExactSizeIterator<Item = &TestOutcome> + '_ {
        self.outcomes.values()
    }

    /// Returns the outcome with the given id.
    pub fn outcome(&self, id: &OutcomeId) -> Option<&TestOutcome> {
        self.outcomes.get(id)
    }

    /// Builds a lookup from device name to test name to outcome.
    ///
    /// If the same test ran more than once on the same device, only the last outcome in outcome
    /// order is kept.
    pub fn results_by_device_and_name(&self) -> BTreeMap<&str, BTreeMap<&str, &TestOutcome>> {
        let mut map: BTreeMap<&str, BTreeMap<&str, &TestOutcome>> = BTreeMap::new();
        for outcome in self.outcomes.values() {
            map.entry(outcome.device())
                .or_default()
                .insert(outcome.name(), outcome);
        }
        map
    }

    /// Appends captured standard output.
    pub fn add_standard_output(&mut self, text: &str) {
        self.standard_output.push_str(text);
    }

    /// Appends captured standard error.
    pub fn add_standard_error(&mut self, text: &str) {
        self.standard_error.push_str(text);
    }

    /// All standard output captured for this class, in the order it was added.
    pub fn standard_output(&self) -> &str {
        &self.standard_output
    }

    /// All standard error captured for this class, in the order it was added.
    pub fn standard_error(&self) -> &str {
        &self.standard_error
    }

    fn add_test(
        &mut self,
        seq: u64,
        test_name: &str,
        duration: Duration,
        device: &str,
        project: &str,
        flavor: &str,
    ) -> &TestOutcome {
        let id = OutcomeId::new(self.node.name(), test_name, device, flavor, seq);
        let outcome = TestOutcome::new(id.clone(), project, duration);
        self.node.record_outcome(&outcome);
        self.outcomes.entry(id).or_insert(outcome)
    }
}

impl AggregateResults for ClassNode {
    fn results(&self) -> &ResultNode {
        &self.node
    }
}

/// All classes within a package.
#[derive(Clone, Debug)]
pub struct PackageNode {
    node: ResultNode,
    classes: BTreeMap<SmolStr, ClassNode>,
}

impl PackageNode {
    fn new(name: &str) -> Self {
        Self {
            node: ResultNode::new(NodeKind::Package, name),
            classes: BTreeMap::new(),
        }
    }

    /// Iterates over the classes in this package, ordered by name.
    pub fn classes(&self) -> impl ExactSizeIterator<Item = &ClassNode> + '_ {
        self.classes.values()
    }

    /// Returns the class with the given fully qualified name.
    pub fn class(&self, class_name: &str) -> Option<&ClassNode> {
        self.classes.get(class_name)
    }

    fn ensure_class(&mut self, class_name: &str) -> &mut ClassNode {
        self.classes
            .entry(SmolStr::new(class_name))
            .or_insert_with(|| ClassNode::new(class_name))
    }

    #[expect(clippy::too_many_arguments)]
    fn add_test(
        &mut self,
        seq: u64,
        class_name: &str,
        test_name: &str,
        duration: Duration,
        device: &str,
        project: &str,
        flavor: &str,
    ) -> &TestOutcome {
        let class = self
            .classes
            .entry(SmolStr::new(class_name))
            .or_insert_with(|| ClassNode::new(class_name));
        let outcome = class.add_test(seq, test_name, duration, device, project, flavor);
        self.node.record_outcome(outcome);
        outcome
    }
}

impl AggregateResults for PackageNode {
    fn results(&self) -> &ResultNode {
        &self.node
    }
}

/// The root of the results tree, and the entry point for merging results into it.
///
/// # Examples
///
/// ```
/// use devmatrix_model::{AggregateResults, RootNode, TestFailure};
/// use std::time::Duration;
///
/// let mut root = RootNode::new();
/// let id = root.add_test("pkg.A", "t1", Duration::from_millis(300), "d2", "app", "main");
/// root.add_failure(&id, TestFailure::new("boom", "at pkg.A.t1"))?;
///
/// assert_eq!(root.test_count(), 1);
/// assert_eq!(root.failure_count(), 1);
/// # Ok::<_, devmatrix_model::errors::UnknownOutcomeError>(())
/// ```
#[derive(Clone, Debug)]
pub struct RootNode {
    node: ResultNode,
    packages: BTreeMap<SmolStr, PackageNode>,
    next_seq: u64,
}

impl Default for RootNode {
    fn default() -> Self {
        Self::new()
    }
}

impl RootNode {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            node: ResultNode::new(NodeKind::Root, "root"),
            packages: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Adds an outcome for a single test, creating its package and class if necessary.
    ///
    /// The outcome is counted once at the class, package and root levels, and once in the
    /// device and variant rollups of each of those levels.
    pub fn add_test(
        &mut self,
        class_name: &str,
        test_name: &str,
        duration: Duration,
        device: &str,
        project: &str,
        flavor: &str,
    ) -> OutcomeId {
        let seq = self.next_seq;
        self.next_seq += 1;

        let package_name = package_name_for(class_name);
        let package = self
            .packages
            .entry(SmolStr::new(package_name))
            .or_insert_with(|| PackageNode::new(package_name));
        let outcome = package.add_test(
            seq, class_name, test_name, duration, device, project, flavor,
        );
        self.node.record_outcome(outcome);
        outcome.id().clone()
    }

    /// Returns the class with the given name, creating it and its package if necessary.
    ///
    /// No outcome is added. This is used to attach output that isn't tied to a single test.
    pub fn add_test_class(&mut self, class_name: &str) -> &mut ClassNode {
        self.ensure_package(package_name_for(class_name))
            .ensure_class(class_name)
    }

    /// Attaches a failure to an outcome and records the outcome as failed at every level.
    ///
    /// Attaching more than one failure to the same outcome keeps every failure on the outcome,
    /// but the outcome is counted as failed only once.
    pub fn add_failure(
        &mut self,
        id: &OutcomeId,
        failure: TestFailure,
    ) -> Result<(), UnknownOutcomeError> {
        let package = self
            .packages
            .get_mut(package_name_for(id.class_name()))
            .ok_or_else(|| UnknownOutcomeError::new(id))?;
        let class = package
            .classes
            .get_mut(id.class_name())
            .ok_or_else(|| UnknownOutcomeError::new(id))?;
        let outcome = class
            .outcomes
            .get_mut(id)
            .ok_or_else(|| UnknownOutcomeError::new(id))?;
        outcome.push_failure(failure);

        let project = outcome.project();
        for node in [&mut class.node, &mut package.node, &mut self.node] {
            node.record_failure(id, id.device(), project, id.flavor());
        }
        Ok(())
    }

    /// Marks an outcome as ignored and records it as ignored at every level.
    pub fn mark_ignored(&mut self, id: &OutcomeId) -> Result<(), UnknownOutcomeError> {
        let package = self
            .packages
            .get_mut(package_name_for(id.class_name()))
            .ok_or_else(|| UnknownOutcomeError::new(id))?;
        let class = package
            .classes
            .get_mut(id.class_name())
            .ok_or_else(|| UnknownOutcomeError::new(id))?;
        let outcome = class
            .outcomes
            .get_mut(id)
            .ok_or_else(|| UnknownOutcomeError::new(id))?;
        outcome.set_ignored();

        let outcome = &*outcome;
        for node in [&mut class.node, &mut package.node, &mut self.node] {
            node.record_ignored(outcome);
        }
        Ok(())
    }

    /// Iterates over the packages in this tree, ordered by name.
    pub fn packages(&self) -> impl ExactSizeIterator<Item = &PackageNode> + '_ {
        self.packages.values()
    }

    /// Returns the package with the given name.
    pub fn package(&self, package_name: &str) -> Option<&PackageNode> {
        self.packages.get(package_name)
    }

    /// Returns the class with the given fully qualified name.
    pub fn class(&self, class_name: &str) -> Option<&ClassNode> {
        self.package(package_name_for(class_name))?
            .class(class_name)
    }

    /// Iterates over every class in this tree, ordered by package and then by name.
    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> + '_ {
        self.packages.values().flat_map(PackageNode::classes)
    }

    /// Returns the outcome with the given id.
    pub fn outcome(&self, id: &OutcomeId) -> Option<&TestOutcome> {
        self.outcome_in_packages(id)
    }

    /// Iterates over every failed outcome, in outcome order.
    pub fn failed_outcomes(&self) -> impl Iterator<Item = &TestOutcome> + '_ {
        self.node
            .failures()
            .iter()
            .filter_map(|id| self.outcome_in_packages(id))
    }

    fn ensure_package(&mut self, package_name: &str) -> &mut PackageNode {
        self.packages
            .entry(SmolStr::new(package_name))
            .or_insert_with(|| PackageNode::new(package_name))
    }

    fn outcome_in_packages(&self, id: &OutcomeId) -> Option<&TestOutcome> {
        self.packages
            .get(package_name_for(id.class_name()))?
            .classes
            .get(id.class_name())?
            .outcomes
            .get(id)
    }
}

impl AggregateResults for RootNode {
    fn results(&self) -> &ResultNode {
        &self.node
    }
}
