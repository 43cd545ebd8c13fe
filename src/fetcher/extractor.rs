// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plain-text extraction from HTML markup.
//!
//! Script and style blocks are removed before parsing, remaining tags
//! are stripped by walking the parsed document's text nodes (entity
//! decoding happens in the parser), and whitespace is collapsed.

use regex::Regex;
use scraper::{Html, Selector};

pub struct TextExtractor {
    script_re: Regex,
    style_re: Regex,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self {
            script_re: Regex::new(r"(?is)<script\b[^>]*>.*?</script>")
                .expect("invalid script regex"),
            style_re: Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("invalid style regex"),
        }
    }

    /// Reduce HTML markup to collapsed plain text.
    pub fn extract(&self, html: &str) -> String {
        let without_scripts = self.script_re.replace_all(html, " ");
        let without_styles = self.style_re.replace_all(&without_scripts, " ");

        let document = Html::parse_document(&without_styles);

        let text = match Selector::parse("body") {
            Ok(selector) => document
                .select(&selector)
                .next()
                .map(|body| body.text().collect::<Vec<_>>().join(" "))
                .unwrap_or_else(|| document.root_element().text().collect::<Vec<_>>().join(" ")),
            Err(_) => document.root_element().text().collect::<Vec<_>>().join(" "),
        };

        collapse_whitespace(&text)
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
