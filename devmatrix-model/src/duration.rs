// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display helpers for durations.

use std::{fmt, time::Duration};

const MILLIS_PER_SECOND: u128 = 1000;
const MILLIS_PER_MINUTE: u128 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u128 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u128 = 24 * MILLIS_PER_HOUR;

/// Displays a test duration in the compact form used throughout reports.
///
/// Durations under a minute are shown with millisecond precision (`0.500s`). Longer durations
/// gain day, hour and minute components, and the seconds drop to hundredths, rounded half up
/// (`1m30.05s`, `2h0m0.00s`). A zero duration is shown as `0s`.
#[derive(Clone, Copy, Debug)]
pub struct DisplayTestDuration(pub Duration);

impl fmt::Display for DisplayTestDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut millis = self.0.as_millis();
        if millis == 0 {
            return f.write_str("0s");
        }

        let days = millis / MILLIS_PER_DAY;
        millis %= MILLIS_PER_DAY;
        let hours = millis / MILLIS_PER_HOUR;
        millis %= MILLIS_PER_HOUR;
        let minutes = millis / MILLIS_PER_MINUTE;
        millis %= MILLIS_PER_MINUTE;

        let mut has_prefix = false;
        if days > 0 {
            write!(f, "{days}d")?;
            has_prefix = true;
        }
        if hours > 0 || has_prefix {
            write!(f, "{hours}h")?;
            has_prefix = true;
        }
        if minutes > 0 || has_prefix {
            write!(f, "{minutes}m")?;
            has_prefix = true;
        }

        if has_prefix {
            // Hundredths, rounded half up. This can produce "60.00s", which is kept as is.
            let hundredths = (millis + 5) / 10;
            write!(f, "{}.{:02}s", hundredths / 100, hundredths % 100)
        } else {
            write!(
                f,
                "{}.{:03}s",
                millis / MILLIS_PER_SECOND,
                millis % MILLIS_PER_SECOND
            )
        }
    }
}
