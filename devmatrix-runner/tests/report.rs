// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use devmatrix_model::{AggregateResults, ResultType, RootNode};
use devmatrix_runner::{
    config::DevmatrixConfig,
    errors::LoadResultsErrorKind,
    load::ResultsLoader,
    render::ReportWriter,
    screenshots::ScreenshotManifest,
    summary::{ReportSummary, SummaryFormat},
};
use indoc::{formatdoc, indoc};
use pretty_assertions::assert_eq;

fn suite_xml(device: &str, flavor: &str, passes: bool) -> String {
    let failure = if passes {
        String::new()
    } else {
        formatdoc! {r#"
            <failure message="timed out" type="java.util.concurrent.TimeoutException">java.util.concurrent.TimeoutException: timed out on {device}</failure>
        "#}
    };
    formatdoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <testsuite name="com.example.CartTest">
          <properties>
            <property name="device" value="{device}" />
            <property name="project" value="shop" />
            <property name="flavor" value="{flavor}" />
          </properties>
          <testcase name="addsItem" classname="com.example.CartTest" time="0.250" />
          <testcase name="checksOut" classname="com.example.CartTest" time="1.000">
            {failure}
          </testcase>
          <system-out>cart ready on {device}</system-out>
        </testsuite>
    "#}
}

fn write_results(dir: &Utf8TempDir) -> Vec<camino::Utf8PathBuf> {
    let phone = dir.path().join("phone");
    let tablet = dir.path().join("tablet");
    fs_err::create_dir_all(&phone).expect("created phone dir");
    fs_err::create_dir_all(&tablet).expect("created tablet dir");

    fs_err::write(
        phone.join("TEST-com.example.CartTest.xml"),
        suite_xml("phone", "main", false),
    )
    .expect("wrote phone results");
    fs_err::write(
        tablet.join("TEST-com.example.CartTest.xml"),
        suite_xml("tablet", "free", true),
    )
    .expect("wrote tablet results");
    // Not a result file.
    fs_err::write(tablet.join("output.txt"), "ignored").expect("wrote other file");

    vec![phone, tablet]
}

fn load(dirs: &[camino::Utf8PathBuf], root_dir: &Utf8Path) -> RootNode {
    let config = DevmatrixConfig::from_sources(root_dir, None).expect("default config parses");
    let screenshots = ScreenshotManifest::new();
    let loader = ResultsLoader::new(&config, &screenshots);

    let mut root = RootNode::new();
    let loaded = loader
        .load_dirs(dirs.iter().map(|dir| dir.as_path()), &mut root)
        .expect("results load");
    assert_eq!(loaded, 2);
    root
}

#[test]
fn two_devices_end_to_end() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let dirs = write_results(&dir);
    let root = load(&dirs, dir.path());

    assert_eq!(root.test_count(), 4);
    assert_eq!(root.failure_count(), 1);
    assert_eq!(root.formatted_success_rate(), "75%");
    assert_eq!(root.results().devices().len(), 2);
    assert_eq!(
        root.results()
            .variants()
            .keys()
            .map(|key| key.as_str())
            .collect::<Vec<_>>(),
        ["shop", "shop:free"]
    );

    let class = root.class("com.example.CartTest").expect("class exists");
    assert_eq!(
        class.standard_output(),
        "cart ready on phonecart ready on tablet"
    );

    let report_dir = dir.path().join("report");
    let index = ReportWriter::new(&report_dir, "Cart run")
        .write(&root)
        .expect("report written");
    let index = fs_err::read_to_string(index).expect("read index");
    assert!(index.contains("<h1>Cart run</h1>"), "{index}");

    let class_page =
        fs_err::read_to_string(report_dir.join("class-com.example.CartTest.html")).expect("read class");
    assert!(
        class_page.contains("checksOut [phone] (on 1/2 devices)"),
        "{class_page}"
    );
    assert!(class_page.contains("TimeoutException: timed out on phone"));

    let summary = ReportSummary::new(&root);
    assert!(summary.has_failures());
    assert_eq!(summary.devices["tablet"].result, ResultType::Success);
    assert_eq!(summary.devices["phone"].result, ResultType::Failure);

    let mut json = Vec::new();
    summary
        .write(SummaryFormat::JsonPretty, &mut json)
        .expect("summary written");
    let value: serde_json::Value = serde_json::from_slice(&json).expect("valid JSON");
    assert_eq!(value["totals"]["tests"], 4);
    assert_eq!(value["classes"]["com.example.CartTest"]["failures"], 1);
}

#[test]
fn malformed_file_names_the_file() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let dirs = write_results(&dir);
    let broken = dirs[1].join("TEST-com.example.Broken.xml");
    fs_err::write(
        &broken,
        indoc! {r#"
            <testsuite name="com.example.Broken">
              <testcase name="a" classname="com.example.Broken" time="soon" />
            </testsuite>
        "#},
    )
    .expect("wrote broken results");

    let config = DevmatrixConfig::from_sources(dir.path(), None).expect("default config parses");
    let screenshots = ScreenshotManifest::new();
    let mut root = RootNode::new();
    let error = ResultsLoader::new(&config, &screenshots)
        .load_dirs(dirs.iter().map(|dir| dir.as_path()), &mut root)
        .expect_err("broken file aborts the load");

    assert_eq!(error.path(), &broken);
    assert!(
        matches!(error.kind(), LoadResultsErrorKind::InvalidTime { test_name, .. } if test_name == "a"),
        "unexpected error: {error:?}"
    );
}
