// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Loading, rendering and summarizing device-matrix test results.
//!
//! The basic flow is:
//!
//! 1. Read a [`config::DevmatrixConfig`].
//! 2. Load result files into a [`devmatrix_model::RootNode`] with a [`load::ResultsLoader`].
//! 3. Write an HTML report with a [`render::ReportWriter`], or print a
//!    [`summary::ReportSummary`].

pub mod config;
pub mod errors;
mod exit_codes;
mod helpers;
pub mod load;
pub mod render;
pub mod screenshots;
pub mod summary;

pub use exit_codes::DevmatrixExitCode;
pub use helpers::parse_decimal_seconds;
