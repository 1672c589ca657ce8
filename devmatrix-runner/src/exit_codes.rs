// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `devmatrix` failures.
///
/// Unknown or unexpected failures always result in exit code 1.
pub enum DevmatrixExitCode {}

impl DevmatrixExitCode {
    /// No errors occurred and devmatrix exited normally.
    pub const OK: i32 = 0;

    /// One or more tests failed, and `--fail-on-test-failure` was passed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// Loading test results produced an error.
    pub const LOAD_RESULTS_FAILED: i32 = 104;

    /// Writing the report, or writing to stdout or stderr, produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a devmatrix invocation, such as an invalid config
    /// file or screenshot manifest.
    pub const SETUP_ERROR: i32 = 96;
}
