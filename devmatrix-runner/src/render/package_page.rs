// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    Crumb, Tab, class_page_file_name, finish_page, html::HtmlWriter, start_page,
    write_failed_tests_tab, write_results_table, write_rollup_tab,
};
use devmatrix_model::{AggregateResults, PackageNode, RootNode};

pub(super) fn render(root: &RootNode, package: &PackageNode) -> String {
    let results = package.results();
    let mut tabs = Vec::with_capacity(4);
    if results.failure_count() > 0 {
        tabs.push(Tab::FAILED_TESTS);
    }
    tabs.extend([Tab::CLASSES, Tab::DEVICES, Tab::VARIANTS]);

    let breadcrumbs = [
        Crumb {
            text: "all",
            href: Some("index.html".to_owned()),
        },
        Crumb {
            text: package.name(),
            href: None,
        },
    ];

    let mut html = HtmlWriter::new();
    start_page(&mut html, &package.title(), &breadcrumbs, results, &tabs);

    if results.failure_count() > 0 {
        write_failed_tests_tab(
            &mut html,
            results.failures().iter().filter_map(|id| root.outcome(id)),
        );
    }

    Tab::CLASSES.start(&mut html);
    write_results_table(
        &mut html,
        "Class",
        package.classes().map(|class| {
            (
                class.simple_name(),
                Some(class_page_file_name(class.name())),
                class.results(),
            )
        }),
    );
    html.end();

    write_rollup_tab(&mut html, Tab::DEVICES, results.devices());
    write_rollup_tab(&mut html, Tab::VARIANTS, results.variants());

    finish_page(html)
}
