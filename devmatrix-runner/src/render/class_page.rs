// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    Crumb, Tab, finish_page, html::HtmlWriter, package_page_file_name, start_page,
    write_rollup_tab,
};
use camino::{Utf8Path, Utf8PathBuf};
use devmatrix_model::{AggregateResults, ClassNode, ResultType, TestOutcome};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

type DeviceLookup<'a> = BTreeMap<&'a str, BTreeMap<&'a str, &'a TestOutcome>>;

pub(super) fn render(report_dir: &Utf8Path, class: &ClassNode) -> String {
    let results = class.results();
    let lookup = class.results_by_device_and_name();

    let mut tabs = Vec::with_capacity(6);
    if results.failure_count() > 0 {
        tabs.push(Tab::FAILED_TESTS);
    }
    tabs.push(Tab::TESTS);
    if !class.standard_output().is_empty() {
        tabs.push(Tab::STANDARD_OUTPUT);
    }
    if !class.standard_error().is_empty() {
        tabs.push(Tab::STANDARD_ERROR);
    }
    tabs.extend([Tab::DEVICES, Tab::VARIANTS]);

    let package_name = devmatrix_model::package_name_for(class.name());
    let breadcrumbs = [
        Crumb {
            text: "all",
            href: Some("index.html".to_owned()),
        },
        Crumb {
            text: package_name,
            href: Some(package_page_file_name(package_name)),
        },
        Crumb {
            text: class.simple_name(),
            href: None,
        },
    ];

    let mut html = HtmlWriter::new();
    start_page(&mut html, &class.title(), &breadcrumbs, results, &tabs);

    if results.failure_count() > 0 {
        Tab::FAILED_TESTS.start(&mut html);
        for (outcome, heading) in failure_headings(class, &lookup) {
            write_failure(&mut html, report_dir, outcome, &heading);
        }
        html.end();
    }

    Tab::TESTS.start(&mut html);
    write_device_matrix(&mut html, &lookup);
    html.end();

    for (tab, text) in [
        (Tab::STANDARD_OUTPUT, class.standard_output()),
        (Tab::STANDARD_ERROR, class.standard_error()),
    ] {
        if !text.is_empty() {
            tab.start(&mut html);
            html.start("span", &[("class", "code")])
                .element("pre", &[], text)
                .end()
                .end();
        }
    }

    write_rollup_tab(&mut html, Tab::DEVICES, results.devices());
    write_rollup_tab(&mut html, Tab::VARIANTS, results.variants());

    finish_page(html)
}

/// Returns a heading for each failed outcome that should be listed, in outcome order.
///
/// A test that ran on a single device is listed by name. A test that failed on every device it
/// ran on is listed once, as `<name> [all devices]`. Otherwise each failure is listed as
/// `<name> [<device>] (on <failed>/<total> devices)`.
fn failure_headings<'a>(
    class: &'a ClassNode,
    lookup: &DeviceLookup<'a>,
) -> Vec<(&'a TestOutcome, String)> {
    let mut listed_everywhere = BTreeSet::new();
    let mut headings = Vec::new();

    for id in class.results().failures() {
        let Some(outcome) = class.outcome(id) else {
            continue;
        };
        let name = outcome.name();
        let (failed, total) = device_counts(lookup, name);
        let failed_everywhere = failed == total;
        if failed_everywhere && !listed_everywhere.insert(name) {
            continue;
        }

        let heading = if total == 1 {
            name.to_owned()
        } else if failed_everywhere {
            format!("{name} [all devices]")
        } else {
            format!(
                "{name} [{}] (on {failed}/{total} devices)",
                outcome.device()
            )
        };
        headings.push((outcome, heading));
    }

    headings
}

/// Returns (failed, total) for a test across devices. Ignored outcomes are not counted.
fn device_counts(lookup: &DeviceLookup<'_>, test_name: &str) -> (usize, usize) {
    lookup
        .values()
        .filter_map(|tests| tests.get(test_name))
        .fold((0, 0), |(failed, total), outcome| {
            match outcome.result_type() {
                ResultType::Failure => (failed + 1, total + 1),
                ResultType::Success => (failed, total + 1),
                ResultType::Skipped => (failed, total),
            }
        })
}

fn write_failure(
    html: &mut HtmlWriter,
    report_dir: &Utf8Path,
    outcome: &TestOutcome,
    heading: &str,
) {
    html.start("div", &[("class", "test")]);
    html.element("a", &[("name", &outcome.id().anchor())], "");
    html.element(
        "h3",
        &[("class", outcome.result_type().status_class())],
        heading,
    );

    for failure in outcome.failures() {
        if let Some(screenshot) = failure.screenshot_path() {
            if screenshot_exists(report_dir, screenshot) {
                html.start("div", &[("class", "screenshot")])
                    .element(
                        "a",
                        &[("href", screenshot.as_str()), ("target", "_blank")],
                        "Screenshot",
                    )
                    .end();
            } else {
                warn!(
                    "screenshot {screenshot} for {}#{} does not exist, omitting link",
                    outcome.class_name(),
                    outcome.name(),
                );
            }
        }
        html.start("span", &[("class", "code")])
            .element("pre", &[], &failure.stack_trace)
            .end();
    }

    html.end();
}

fn screenshot_exists(report_dir: &Utf8Path, screenshot: &Utf8Path) -> bool {
    let resolved: Utf8PathBuf = if screenshot.is_absolute() {
        screenshot.to_owned()
    } else {
        report_dir.join(screenshot)
    };
    resolved.is_file()
}

/// Writes a table with one row per test name and one column per device.
fn write_device_matrix(html: &mut HtmlWriter, lookup: &DeviceLookup<'_>) {
    let test_names: BTreeSet<&str> = lookup
        .values()
        .flat_map(|tests| tests.keys().copied())
        .collect();

    html.start("table", &[]).start("thead", &[]).start("tr", &[]);
    html.element("th", &[], "Test");
    for device in lookup.keys() {
        html.element("th", &[], device);
    }
    html.end().end().start("tbody", &[]);

    for name in test_names {
        let combined = lookup
            .values()
            .filter_map(|tests| tests.get(name))
            .map(|outcome| outcome.result_type())
            .fold(ResultType::default(), ResultType::combine);

        html.start("tr", &[])
            .element("td", &[("class", combined.status_class())], name);
        for tests in lookup.values() {
            match tests.get(name) {
                Some(outcome) => {
                    let result = outcome.result_type();
                    html.element(
                        "td",
                        &[("class", result.status_class())],
                        &format!("{result} ({})", outcome.formatted_duration()),
                    );
                }
                None => {
                    html.element("td", &[], "not run");
                }
            }
        }
        html.end();
    }
    html.end().end();
}
