// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Heuristic detection of policy/terms pages.
//!
//! A fixed list of indicator patterns is matched against the extracted
//! text and the URL path. This backs the extension's "is this page a
//! policy?" probe and makes no inference calls.

use regex::Regex;
use serde::Serialize;
use url::Url;

/// Minimum number of matched indicators before a page counts as a
/// policy document (a path hint alone is enough).
const MIN_TEXT_INDICATORS: usize = 2;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionOutcome {
    pub is_policy: bool,
    pub indicators: Vec<String>,
}

pub struct PolicyDetector {
    text_patterns: Vec<(&'static str, Regex)>,
    path_pattern: Regex,
}

impl PolicyDetector {
    pub fn new() -> Self {
        let patterns = [
            ("privacy policy", r"(?i)privacy\s+(policy|notice|statement)"),
            ("terms of service", r"(?i)terms\s+(of\s+(service|use)|and\s+conditions)"),
            ("personal data", r"(?i)personal\s+(data|information)"),
            ("cookies", r"(?i)\bcookies?\b"),
            ("data controller", r"(?i)data\s+(controller|processor)"),
            ("regulation reference", r"(?i)\b(gdpr|ccpa|data\s+protection\s+act)\b"),
            ("user rights", r"(?i)(your|user)\s+rights"),
            ("data retention", r"(?i)(data\s+retention|retain\s+your)"),
            ("third parties", r"(?i)third[\s-]part(y|ies)"),
            ("consent", r"(?i)\b(consent|opt[\s-]?out)\b"),
        ];

        Self {
            text_patterns: patterns
                .into_iter()
                .map(|(label, pattern)| {
                    (label, Regex::new(pattern).expect("invalid indicator regex"))
                })
                .collect(),
            path_pattern: Regex::new(r"(?i)/(privacy|terms|tos|legal|policy|policies)(/|\.|$|-)")
                .expect("invalid path regex"),
        }
    }

    pub fn detect(&self, url: &Url, text: &str) -> DetectionOutcome {
        let mut indicators: Vec<String> = self
            .text_patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(label, _)| label.to_string())
            .collect();

        let path_hint = self.path_pattern.is_match(url.path());
        if path_hint {
            indicators.push("url path".to_string());
        }

        let is_policy = path_hint || indicators.len() >= MIN_TEXT_INDICATORS;

        DetectionOutcome {
            is_policy,
            indicators,
        }
    }
}

impl Default for PolicyDetector {
    fn default() -> Self {
        Self::new()
    }
}
