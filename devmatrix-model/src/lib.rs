// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation model for test results gathered across devices and build variants.
//!
//! The model is a tree of composite nodes: a [`RootNode`] owns [`PackageNode`]s, which own
//! [`ClassNode`]s, which own the individual [`TestOutcome`]s. Every level also keeps two rollup
//! indexes, one keyed by device name and one keyed by [variant key](variant_key), so that a
//! renderer can ask what happened on a given device or variant without re-walking the tree.
//!
//! Records are merged in through [`RootNode::add_test`], [`RootNode::add_failure`] and
//! [`RootNode::mark_ignored`]. Once merging is complete, the tree is only ever read.

#![warn(missing_docs)]

mod duration;
pub mod errors;
mod node;
mod outcome;
mod tree;

pub use duration::DisplayTestDuration;
pub use node::{AggregateResults, MAIN_FLAVOR, NodeKind, ResultNode, variant_key};
pub use outcome::{OutcomeId, ResultType, TestFailure, TestOutcome};
pub use tree::{ClassNode, DEFAULT_PACKAGE, PackageNode, RootNode, package_name_for};
