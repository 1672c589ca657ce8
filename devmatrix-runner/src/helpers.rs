// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ParseDecimalError;
use std::time::Duration;

/// Parses a non-negative decimal number of seconds, such as the `time` attribute on a JUnit test
/// case, into a duration truncated to whole milliseconds.
///
/// `,` is accepted as a grouping separator and `.` is always the decimal point, independent of
/// the current locale. Digits past the third decimal place are dropped.
pub fn parse_decimal_seconds(input: &str) -> Result<Duration, ParseDecimalError> {
    let trimmed = input.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(ParseDecimalError::new(input, "no digits"));
    }
    if whole.starts_with(',') || whole.ends_with(',') {
        return Err(ParseDecimalError::new(input, "misplaced grouping separator"));
    }

    let mut seconds: u64 = 0;
    for c in whole.chars().filter(|&c| c != ',') {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| ParseDecimalError::new(input, "unexpected character"))?;
        seconds = seconds
            .checked_mul(10)
            .and_then(|s| s.checked_add(u64::from(digit)))
            .ok_or_else(|| ParseDecimalError::new(input, "value too large"))?;
    }

    let mut millis: u64 = 0;
    for (idx, c) in fraction.chars().enumerate() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| ParseDecimalError::new(input, "unexpected character"))?;
        if idx < 3 {
            millis += u64::from(digit) * 10u64.pow(2 - idx as u32);
        }
    }

    let millis = seconds
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(|| ParseDecimalError::new(input, "value too large"))?;
    Ok(Duration::from_millis(millis))
}

/// Returns the file name, without extension, used for a package or class page.
///
/// Characters that are unsafe in file names on common platforms are replaced with `-`.
pub(crate) fn page_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}
