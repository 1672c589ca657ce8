// Copyright (c) The devmatrix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::escape::escape;
use swrite::{SWrite, swrite};

/// A minimal HTML writer. All text and attribute values are escaped.
#[derive(Debug, Default)]
pub(super) struct HtmlWriter {
    out: String,
    open: Vec<&'static str>,
}

impl HtmlWriter {
    pub(super) fn new() -> Self {
        let mut out = String::with_capacity(16 * 1024);
        out.push_str("<!DOCTYPE html>\n");
        Self {
            out,
            open: Vec::new(),
        }
    }

    /// Opens an element. It must be closed with [`Self::end`].
    pub(super) fn start(&mut self, tag: &'static str, attrs: &[(&str, &str)]) -> &mut Self {
        self.write_tag(tag, attrs, false);
        self.open.push(tag);
        self
    }

    /// Writes an element with no content, such as `<meta>`.
    pub(super) fn void(&mut self, tag: &'static str, attrs: &[(&str, &str)]) -> &mut Self {
        self.write_tag(tag, attrs, true);
        self
    }

    /// Closes the most recently opened element.
    pub(super) fn end(&mut self) -> &mut Self {
        if let Some(tag) = self.open.pop() {
            swrite!(self.out, "</{tag}>");
            if !matches!(tag, "a" | "span" | "td" | "th" | "h1" | "h2" | "h3" | "title" | "pre") {
                self.out.push('\n');
            }
        }
        self
    }

    pub(super) fn text(&mut self, text: &str) -> &mut Self {
        self.out.push_str(&escape(text));
        self
    }

    /// Writes `<tag attrs>text</tag>`.
    pub(super) fn element(
        &mut self,
        tag: &'static str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> &mut Self {
        self.start(tag, attrs).text(text).end()
    }

    pub(super) fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end();
        }
        self.out
    }

    fn write_tag(&mut self, tag: &str, attrs: &[(&str, &str)], is_void: bool) {
        swrite!(self.out, "<{tag}");
        for (name, value) in attrs {
            swrite!(self.out, " {name}=\"{}\"", escape(*value));
        }
        self.out.push('>');
        if is_void {
            self.out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let mut writer = HtmlWriter::new();
        writer
            .start("div", &[("class", "a\"b")])
            .element("a", &[("href", "x.html#t<1>")], "<script> & co")
            .end();
        let html = writer.finish();
        assert_eq!(
            html,
            "<!DOCTYPE html>\n<div class=\"a&quot;b\"><a href=\"x.html#t&lt;1&gt;\">&lt;script&gt; &amp; co</a></div>\n"
        );
    }

    #[test]
    fn finish_closes_open_elements() {
        let mut writer = HtmlWriter::new();
        writer.start("html", &[]).start("body", &[]).text("hi");
        assert_eq!(
            writer.finish(),
            "<!DOCTYPE html>\n<html><body>hi</body>\n</html>\n"
        );
    }
}
