// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of aggregated results as a static HTML report.
//!
//! The report consists of an overview page (`index.html`), one page per package, one page per
//! class and a stylesheet. Rendering only reads the tree.

mod class_page;
mod html;
mod overview_page;
mod package_page;

use crate::{errors::WriteReportError, helpers::page_file_stem};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use devmatrix_model::{AggregateResults, ResultNode, RootNode, TestOutcome};
use html::HtmlWriter;
use smol_str::SmolStr;
use std::{collections::BTreeMap, io::Write};
use tracing::{debug, info};

const STYLE_CSS: &str = include_str!("style.css");

/// Writes an HTML report for a [`RootNode`] into a directory.
#[derive(Clone, Debug)]
pub struct ReportWriter {
    report_dir: Utf8PathBuf,
    title: String,
}

impl ReportWriter {
    /// Creates a new writer. `title` is shown on the overview page.
    pub fn new(report_dir: impl Into<Utf8PathBuf>, title: impl Into<String>) -> Self {
        Self {
            report_dir: report_dir.into(),
            title: title.into(),
        }
    }

    /// The directory the report is written to.
    pub fn report_dir(&self) -> &Utf8Path {
        &self.report_dir
    }

    /// Writes the report, returning the path to the overview page.
    ///
    /// Existing files with the same names are replaced.
    pub fn write(&self, root: &RootNode) -> Result<Utf8PathBuf, WriteReportError> {
        fs_err::create_dir_all(&self.report_dir).map_err(|error| {
            WriteReportError::CreateDir {
                path: self.report_dir.clone(),
                error,
            }
        })?;

        self.write_file("style.css", STYLE_CSS)?;
        self.write_file("index.html", &overview_page::render(&self.title, root))?;

        let mut page_count = 1;
        for package in root.packages() {
            self.write_file(
                &package_page_file_name(package.name()),
                &package_page::render(root, package),
            )?;
            page_count += 1;
            for class in package.classes() {
                self.write_file(
                    &class_page_file_name(class.name()),
                    &class_page::render(&self.report_dir, class),
                )?;
                page_count += 1;
            }
        }
        debug!("wrote {page_count} pages to {}", self.report_dir);

        let index = self.report_dir.join("index.html");
        info!("HTML report written to {index}");
        Ok(index)
    }

    fn write_file(&self, file_name: &str, contents: &str) -> Result<(), WriteReportError> {
        let path = self.report_dir.join(file_name);
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(contents.as_bytes()))
            .map_err(|error| WriteReportError::Write { path, error })
    }
}

/// Package and class pages live side by side, so each kind gets its own prefix.
fn package_page_file_name(name: &str) -> String {
    format!("package-{}.html", page_file_stem(name))
}

fn class_page_file_name(name: &str) -> String {
    format!("class-{}.html", page_file_stem(name))
}

fn outcome_href(outcome: &TestOutcome) -> String {
    format!(
        "{}#{}",
        class_page_file_name(outcome.class_name()),
        outcome.id().anchor()
    )
}

/// A tab on a page: an id used for linking, and a heading.
#[derive(Clone, Copy, Debug)]
struct Tab {
    id: &'static str,
    title: &'static str,
}

impl Tab {
    const FAILED_TESTS: Self = Self::new("tab-failed", "Failed tests");
    const PACKAGES: Self = Self::new("tab-packages", "Packages");
    const CLASSES: Self = Self::new("tab-classes", "Classes");
    const TESTS: Self = Self::new("tab-tests", "Tests");
    const STANDARD_OUTPUT: Self = Self::new("tab-stdout", "Standard output");
    const STANDARD_ERROR: Self = Self::new("tab-stderr", "Standard error");
    const DEVICES: Self = Self::new("tab-devices", "Devices");
    const VARIANTS: Self = Self::new("tab-variants", "Variants");

    const fn new(id: &'static str, title: &'static str) -> Self {
        Self { id, title }
    }

    /// Opens the tab's container and writes its heading. Close it with [`HtmlWriter::end`].
    fn start(self, html: &mut HtmlWriter) {
        html.start("div", &[("class", "tab"), ("id", self.id)])
            .element("h2", &[], self.title);
    }
}

/// A link in the breadcrumb trail. `href` is `None` for the current page.
struct Crumb<'a> {
    text: &'a str,
    href: Option<String>,
}

/// Writes everything up to and including the tab links.
fn start_page(
    html: &mut HtmlWriter,
    heading: &str,
    breadcrumbs: &[Crumb<'_>],
    results: &ResultNode,
    tabs: &[Tab],
) {
    html.start("html", &[]).start("head", &[]);
    html.void("meta", &[("charset", "utf-8")])
        .element("title", &[], heading);
    html.void("link", &[("rel", "stylesheet"), ("href", "style.css")]);
    html.end();

    html.start("body", &[]).start("div", &[("id", "content")]);
    html.element("h1", &[], heading);
    if !breadcrumbs.is_empty() {
        html.start("div", &[("class", "breadcrumbs")]);
        for (idx, crumb) in breadcrumbs.iter().enumerate() {
            if idx > 0 {
                html.text(" > ");
            }
            match &crumb.href {
                Some(href) => html.element("a", &[("href", href)], crumb.text),
                None => html.text(crumb.text),
            };
        }
        html.end();
    }

    write_summary(html, results);

    html.start("ul", &[("class", "tabLinks")]);
    for tab in tabs {
        html.start("li", &[])
            .element("a", &[("href", &format!("#{}", tab.id))], tab.title)
            .end();
    }
    html.end();
}

fn finish_page(mut html: HtmlWriter) -> String {
    // Close #content before adding the footer.
    html.end();
    html.start("div", &[("id", "footer")])
        .element("p", &[], "Generated by devmatrix")
        .end();
    html.finish()
}

fn write_summary(html: &mut HtmlWriter, results: &ResultNode) {
    html.start("div", &[("id", "summary")])
        .start("table", &[])
        .start("tr", &[]);
    for (id, value, label) in [
        ("tests", results.test_count().to_string(), "tests"),
        ("failures", results.failure_count().to_string(), "failures"),
        ("ignored", results.ignored_count().to_string(), "ignored"),
        ("duration", results.formatted_duration(), "duration"),
    ] {
        html.start("td", &[])
            .start("div", &[("class", "infoBox"), ("id", id)])
            .element("div", &[("class", "counter")], &value)
            .element("p", &[], label)
            .end()
            .end();
    }
    let status = format!("infoBox {}", results.result_type().status_class());
    html.start("td", &[])
        .start("div", &[("class", &status), ("id", "successRate")])
        .element("div", &[("class", "percent")], &results.formatted_success_rate())
        .element("p", &[], "successful")
        .end()
        .end();
    html.end().end().end();
}

/// Writes a table with one row per node: name, counts, duration and success rate.
fn write_results_table<'a>(
    html: &mut HtmlWriter,
    name_heading: &str,
    rows: impl IntoIterator<Item = (&'a str, Option<String>, &'a ResultNode)>,
) {
    html.start("table", &[]).start("thead", &[]).start("tr", &[]);
    for heading in [
        name_heading,
        "Tests",
        "Failures",
        "Ignored",
        "Duration",
        "Success rate",
    ] {
        html.element("th", &[], heading);
    }
    html.end().end().start("tbody", &[]);

    for (name, href, results) in rows {
        let status = results.result_type().status_class();
        html.start("tr", &[]).start("td", &[("class", status)]);
        match href {
            Some(href) => html.element("a", &[("href", &href)], name),
            None => html.text(name),
        };
        html.end();
        html.element("td", &[], &results.test_count().to_string())
            .element("td", &[], &results.failure_count().to_string())
            .element("td", &[], &results.ignored_count().to_string())
            .element("td", &[], &results.formatted_duration())
            .element("td", &[("class", status)], &results.formatted_success_rate())
            .end();
    }
    html.end().end();
}

fn write_rollup_tab(html: &mut HtmlWriter, tab: Tab, rollups: &BTreeMap<SmolStr, ResultNode>) {
    tab.start(html);
    let name_heading = if tab.id == Tab::DEVICES.id {
        "Device"
    } else {
        "Variant"
    };
    write_results_table(
        html,
        name_heading,
        rollups.values().map(|node| (node.name(), None, node)),
    );
    html.end();
}

/// Writes a list of links to failed outcomes, as shown on the overview and package pages.
fn write_failed_tests_tab<'a>(
    html: &mut HtmlWriter,
    outcomes: impl IntoIterator<Item = &'a TestOutcome>,
) {
    Tab::FAILED_TESTS.start(html);
    html.start("ul", &[("class", "linkList")]);
    for outcome in outcomes {
        let class_href = class_page_file_name(outcome.class_name());
        html.start("li", &[])
            .element("a", &[("href", &class_href)], outcome.class_name())
            .text(".")
            .element("a", &[("href", &outcome_href(outcome))], outcome.name())
            .text(&format!(" [{}]", outcome.device()))
            .end();
    }
    html.end().end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmatrix_model::TestFailure;
    use std::time::Duration;

    fn sample_root() -> RootNode {
        let mut root = RootNode::new();
        let failed = root.add_test(
            "com.example.LoginTest",
            "rejects <bad> password",
            Duration::from_millis(1500),
            "pixel",
            "app",
            "main",
        );
        root.add_test(
            "com.example.LoginTest",
            "rejects <bad> password",
            Duration::from_millis(900),
            "tablet",
            "app",
            "paid",
        );
        root.add_test(
            "Standalone",
            "works",
            Duration::from_millis(10),
            "pixel",
            "app",
            "main",
        );
        root.add_failure(
            &failed,
            TestFailure::new("expected true", "java.lang.AssertionError: expected true"),
        )
        .expect("outcome exists");
        root.add_test_class("com.example.LoginTest")
            .add_standard_output("logging in & out\n");
        root
    }

    #[test]
    fn writes_all_pages() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let report_dir = dir.path().join("report");
        let writer = ReportWriter::new(&report_dir, "Nightly");

        let index = writer.write(&sample_root()).expect("report written");
        assert_eq!(index, report_dir.join("index.html"));

        for file in [
            "index.html",
            "style.css",
            "package-com.example.html",
            "package-default-package.html",
            "class-com.example.LoginTest.html",
            "class-Standalone.html",
        ] {
            assert!(report_dir.join(file).is_file(), "{file} was written");
        }

        let index = fs_err::read_to_string(&index).expect("read index");
        assert!(index.contains("<h1>Nightly</h1>"), "{index}");
        assert!(index.contains("<div class=\"percent\">66%</div>"), "{index}");
        assert!(
            index.contains("href=\"class-com.example.LoginTest.html#rejects &lt;bad&gt; password-0\""),
            "failed test links to its anchor: {index}"
        );
        assert!(index.contains("<td class=\"failures\"><a href=\"package-com.example.html\">com.example</a></td>"));
        assert!(index.contains("<td class=\"success\">app:paid</td>"), "{index}");
    }

    #[test]
    fn package_and_class_pages_do_not_collide() {
        let mut root = RootNode::new();
        root.add_test("com.Widget", "draws", Duration::ZERO, "pixel", "app", "main");
        root.add_test("com", "loads", Duration::ZERO, "pixel", "app", "main");

        let dir = camino_tempfile::tempdir().expect("created temp dir");
        ReportWriter::new(dir.path(), "Report")
            .write(&root)
            .expect("report written");

        let package_page =
            fs_err::read_to_string(dir.path().join("package-com.html")).expect("read package");
        assert!(package_page.contains("<h1>Package com</h1>"), "{package_page}");
        let class_page =
            fs_err::read_to_string(dir.path().join("class-com.html")).expect("read class");
        assert!(class_page.contains("<h1>Class com</h1>"), "{class_page}");
    }

    #[test]
    fn rewriting_replaces_files() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let writer = ReportWriter::new(dir.path(), "Report");
        writer.write(&RootNode::new()).expect("first write");
        writer.write(&sample_root()).expect("second write");

        let index = fs_err::read_to_string(dir.path().join("index.html")).expect("read index");
        assert!(index.contains("<div class=\"counter\">3</div>"), "{index}");
    }

    #[test]
    fn empty_report_has_no_success_rate() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        ReportWriter::new(dir.path(), "Empty")
            .write(&RootNode::new())
            .expect("report written");

        let index = fs_err::read_to_string(dir.path().join("index.html")).expect("read index");
        assert!(index.contains("<div class=\"percent\">-</div>"), "{index}");
        assert!(!index.contains("Failed tests"), "no failures tab: {index}");
    }

    #[test]
    fn write_error_names_the_file() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        // A file where the report directory should be.
        let report_dir = dir.path().join("occupied");
        fs_err::write(&report_dir, "").expect("wrote file");

        let error = ReportWriter::new(&report_dir, "Report")
            .write(&RootNode::new())
            .expect_err("cannot create report directory");
        assert!(
            matches!(&error, WriteReportError::CreateDir { path, .. } if *path == report_dir),
            "unexpected error: {error:?}"
        );
    }
}
