// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Structured finding types and lenient parsing of model output.
//!
//! Models return free-form text that is expected to contain a JSON
//! object. Parse failures degrade to a placeholder finding; the tagged
//! result type lets aggregation and tests tell genuine findings apart
//! from placeholders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const PLACEHOLDER_KEY_POINT: &str = "Unable to analyze this section";

/// Structured extraction result for one analyzed chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkFinding {
    pub key_points: Vec<String>,
    pub red_flags: Vec<String>,
    pub compliance_tags: HashMap<String, String>,
    pub mentioned_rights: Vec<String>,
}

impl ChunkFinding {
    /// Placeholder substituted when a chunk's inference call fails or
    /// returns output that cannot be parsed as the expected shape.
    pub fn placeholder() -> Self {
        let mut compliance_tags = HashMap::new();
        compliance_tags.insert("compliance".to_string(), "unknown".to_string());
        Self {
            key_points: vec![PLACEHOLDER_KEY_POINT.to_string()],
            red_flags: Vec::new(),
            compliance_tags,
            mentioned_rights: Vec::new(),
        }
    }
}

/// Outcome of parsing one chunk's model output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFinding {
    Parsed(ChunkFinding),
    Degraded(String),
}

impl ParsedFinding {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ParsedFinding::Degraded(_))
    }

    /// The finding to aggregate: the genuine one, or the placeholder.
    pub fn into_finding(self) -> ChunkFinding {
        match self {
            ParsedFinding::Parsed(finding) => finding,
            ParsedFinding::Degraded(_) => ChunkFinding::placeholder(),
        }
    }
}

/// Parse model output into a `ChunkFinding`, tolerating prose around
/// the JSON object.
pub fn parse_chunk_finding(raw: &str) -> ParsedFinding {
    let Some(value) = extract_json_object(raw) else {
        return ParsedFinding::Degraded("no JSON object in model output".to_string());
    };

    match serde_json::from_value::<ChunkFinding>(value) {
        Ok(finding) => ParsedFinding::Parsed(finding),
        Err(e) => ParsedFinding::Degraded(format!("unexpected shape: {}", e)),
    }
}

/// Summary-call output shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryPayload {
    pub executive_summary: String,
    pub recommendations: Vec<String>,
}

/// Parse the second-pass summary output; `None` means the caller
/// should fall back to a static summary.
pub fn parse_summary(raw: &str) -> Option<SummaryPayload> {
    let value = extract_json_object(raw)?;
    let payload: SummaryPayload = serde_json::from_value(value).ok()?;
    if payload.executive_summary.trim().is_empty() {
        return None;
    }
    Some(payload)
}

/// Extract the outermost JSON object from free-form text: everything
/// between the first `{` and the last `}`.
fn extract_json_object(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}
