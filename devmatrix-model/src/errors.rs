// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the aggregation model.

use crate::OutcomeId;
use thiserror::Error;

/// An [`OutcomeId`] was passed to a [`RootNode`](crate::RootNode) that does not contain it.
///
/// Returned by [`RootNode::add_failure`](crate::RootNode::add_failure) and
/// [`RootNode::mark_ignored`](crate::RootNode::mark_ignored).
#[derive(Clone, Debug, Error)]
#[error(
    "test `{}#{}` on device `{}` is not part of this report",
    .id.class_name(),
    .id.test_name(),
    .id.device()
)]
pub struct UnknownOutcomeError {
    id: OutcomeId,
}

impl UnknownOutcomeError {
    pub(crate) fn new(id: &OutcomeId) -> Self {
        Self { id: id.clone() }
    }

    /// Returns the id that could not be found.
    pub fn id(&self) -> &OutcomeId {
        &self.id
    }
}
