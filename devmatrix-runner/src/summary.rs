// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A serializable summary of aggregated results.

use crate::errors::WriteSummaryError;
use devmatrix_model::{AggregateResults, ResultNode, ResultType, RootNode};
use serde::Serialize;
use std::{collections::BTreeMap, io};

/// The format a [`ReportSummary`] is written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    /// One line per node, for people.
    #[default]
    Human,

    /// Compact JSON.
    Json,

    /// Indented JSON.
    JsonPretty,
}

/// Counts for a single node in the tree or a rollup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SummaryCounts {
    /// The number of outcomes.
    pub tests: usize,

    /// The number of failed outcomes.
    pub failures: usize,

    /// The number of ignored outcomes.
    pub ignored: usize,

    /// The total duration in milliseconds.
    pub duration_ms: u64,

    /// The success rate as a percentage, or `None` if there were no outcomes.
    pub success_rate: Option<u32>,

    /// The combined result.
    pub result: ResultType,
}

impl SummaryCounts {
    fn new(results: &ResultNode) -> Self {
        Self {
            tests: results.test_count(),
            failures: results.failure_count(),
            ignored: results.ignored_count(),
            duration_ms: u64::try_from(results.duration().as_millis()).unwrap_or(u64::MAX),
            success_rate: results.success_rate(),
            result: results.result_type(),
        }
    }
}

/// A summary of a [`RootNode`]: totals, plus counts for each package, class, device and variant.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportSummary {
    /// Counts across all results.
    pub totals: SummaryCounts,

    /// Counts per package.
    pub packages: BTreeMap<String, SummaryCounts>,

    /// Counts per class, keyed by fully qualified class name.
    pub classes: BTreeMap<String, SummaryCounts>,

    /// Counts per device.
    pub devices: BTreeMap<String, SummaryCounts>,

    /// Counts per variant key.
    pub variants: BTreeMap<String, SummaryCounts>,
}

impl ReportSummary {
    /// Summarizes a tree.
    pub fn new(root: &RootNode) -> Self {
        let results = root.results();
        Self {
            totals: SummaryCounts::new(results),
            packages: root
                .packages()
                .map(|package| (package.name().to_owned(), SummaryCounts::new(package.results())))
                .collect(),
            classes: root
                .classes()
                .map(|class| (class.name().to_owned(), SummaryCounts::new(class.results())))
                .collect(),
            devices: rollup_counts(results.devices()),
            variants: rollup_counts(results.variants()),
        }
    }

    /// Returns true if any outcome failed.
    pub fn has_failures(&self) -> bool {
        self.totals.failures > 0
    }

    /// Writes the summary in the given format.
    pub fn write(
        &self,
        format: SummaryFormat,
        mut writer: impl io::Write,
    ) -> Result<(), WriteSummaryError> {
        match format {
            SummaryFormat::Human => self.write_human(&mut writer)?,
            SummaryFormat::Json => {
                serde_json::to_writer(&mut writer, self)?;
                writeln!(writer)?;
            }
            SummaryFormat::JsonPretty => {
                serde_json::to_writer_pretty(&mut writer, self)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_human(&self, writer: &mut impl io::Write) -> io::Result<()> {
        write_human_line(writer, "total", &self.totals)?;
        for (heading, section) in [
            ("packages", &self.packages),
            ("classes", &self.classes),
            ("devices", &self.devices),
            ("variants", &self.variants),
        ] {
            if section.is_empty() {
                continue;
            }
            writeln!(writer, "{heading}:")?;
            for (name, counts) in section {
                write_human_line(writer, &format!("    {name}"), counts)?;
            }
        }
        Ok(())
    }
}

fn rollup_counts<'a>(
    rollups: impl IntoIterator<Item = (&'a smol_str::SmolStr, &'a ResultNode)>,
) -> BTreeMap<String, SummaryCounts> {
    rollups
        .into_iter()
        .map(|(name, node)| (name.to_string(), SummaryCounts::new(node)))
        .collect()
}

fn write_human_line(
    writer: &mut impl io::Write,
    name: &str,
    counts: &SummaryCounts,
) -> io::Result<()> {
    let success_rate = counts
        .success_rate
        .map_or_else(|| "-".to_owned(), |rate| format!("{rate}%"));
    writeln!(
        writer,
        "{name}: {} tests, {} failed, {} ignored, {}ms, {success_rate} successful",
        counts.tests, counts.failures, counts.ignored, counts.duration_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmatrix_model::TestFailure;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn sample_root() -> RootNode {
        let mut root = RootNode::new();
        let failed = root.add_test(
            "com.example.A",
            "t1",
            Duration::from_millis(1200),
            "pixel",
            "app",
            "main",
        );
        root.add_test("com.example.A", "t1", Duration::from_millis(800), "tablet", "app", "paid");
        let ignored = root.add_test("B", "t2", Duration::ZERO, "pixel", "app", "main");
        root.add_failure(&failed, TestFailure::new("boom", "trace"))
            .expect("outcome exists");
        root.mark_ignored(&ignored).expect("outcome exists");
        root
    }

    #[test]
    fn summarizes_every_level() {
        let summary = ReportSummary::new(&sample_root());
        assert!(summary.has_failures());
        assert_eq!(
            summary.totals,
            SummaryCounts {
                tests: 3,
                failures: 1,
                ignored: 1,
                duration_ms: 2000,
                success_rate: Some(66),
                result: ResultType::Failure,
            }
        );
        assert_eq!(
            summary.packages.keys().collect::<Vec<_>>(),
            ["com.example", "default-package"]
        );
        assert_eq!(summary.classes["B"].ignored, 1);
        assert_eq!(summary.devices["pixel"].failures, 1);
        assert_eq!(summary.devices["tablet"].result, ResultType::Success);
        assert_eq!(
            summary.variants.keys().collect::<Vec<_>>(),
            ["app", "app:paid"]
        );
    }

    #[test]
    fn human_output() {
        let mut out = Vec::new();
        ReportSummary::new(&sample_root())
            .write(SummaryFormat::Human, &mut out)
            .expect("summary written");

        assert_eq!(
            String::from_utf8(out).expect("valid UTF-8"),
            indoc! {"
                total: 3 tests, 1 failed, 1 ignored, 2000ms, 66% successful
                packages:
                    com.example: 2 tests, 1 failed, 0 ignored, 2000ms, 50% successful
                    default-package: 1 tests, 0 failed, 1 ignored, 0ms, 100% successful
                classes:
                    B: 1 tests, 0 failed, 1 ignored, 0ms, 100% successful
                    com.example.A: 2 tests, 1 failed, 0 ignored, 2000ms, 50% successful
                devices:
                    pixel: 2 tests, 1 failed, 1 ignored, 1200ms, 50% successful
                    tablet: 1 tests, 0 failed, 0 ignored, 800ms, 100% successful
                variants:
                    app: 2 tests, 1 failed, 1 ignored, 1200ms, 50% successful
                    app:paid: 1 tests, 0 failed, 0 ignored, 800ms, 100% successful
            "}
        );
    }

    #[test]
    fn json_output() {
        let mut out = Vec::new();
        ReportSummary::new(&RootNode::new())
            .write(SummaryFormat::Json, &mut out)
            .expect("summary written");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
        assert_eq!(
            value,
            serde_json::json!({
                "totals": {
                    "tests": 0,
                    "failures": 0,
                    "ignored": 0,
                    "duration-ms": 0,
                    "success-rate": null,
                    "result": "success",
                },
                "packages": {},
                "classes": {},
                "devices": {},
                "variants": {},
            })
        );
    }
}
