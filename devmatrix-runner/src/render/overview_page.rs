// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    Tab, class_page_file_name, finish_page, html::HtmlWriter, package_page_file_name, start_page,
    write_failed_tests_tab, write_results_table, write_rollup_tab,
};
use devmatrix_model::{AggregateResults, RootNode};

pub(super) fn render(title: &str, root: &RootNode) -> String {
    let results = root.results();
    let mut tabs = Vec::with_capacity(5);
    if results.failure_count() > 0 {
        tabs.push(Tab::FAILED_TESTS);
    }
    tabs.extend([Tab::PACKAGES, Tab::CLASSES, Tab::DEVICES, Tab::VARIANTS]);

    let mut html = HtmlWriter::new();
    start_page(&mut html, title, &[], results, &tabs);

    if results.failure_count() > 0 {
        write_failed_tests_tab(&mut html, root.failed_outcomes());
    }

    Tab::PACKAGES.start(&mut html);
    write_results_table(
        &mut html,
        "Package",
        root.packages().map(|package| {
            (
                package.name(),
                Some(package_page_file_name(package.name())),
                package.results(),
            )
        }),
    );
    html.end();

    Tab::CLASSES.start(&mut html);
    write_results_table(
        &mut html,
        "Class",
        root.classes()
            .map(|class| (class.name(), Some(class_page_file_name(class.name())), class.results())),
    );
    html.end();

    write_rollup_tab(&mut html, Tab::DEVICES, results.devices());
    write_rollup_tab(&mut html, Tab::VARIANTS, results.variants());

    finish_page(html)
}
