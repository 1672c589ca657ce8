// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregates test results from many devices and build variants.
//!
//! `devmatrix generate` writes a browsable HTML report, and `devmatrix summary` prints counts for
//! every package, class, device and variant. See [`devmatrix_runner::DevmatrixExitCode`] for the
//! exit codes produced on failure.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
