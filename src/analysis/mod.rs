// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chunk-level analysis orchestration.
//!
//! Drives one structured-extraction inference call per sampled chunk,
//! merges the findings, and issues a second call for the executive
//! summary. A failed or unparsable chunk call degrades to a
//! placeholder finding; a failed summary call falls back to static
//! text. The request as a whole never fails because of inference.

pub mod risk;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::chunker::ContentChunk;
use crate::inference::{
    parse_chunk_finding, parse_summary, prompts, ChunkFinding, InferenceClient, InferencePrompt,
    ParsedFinding,
};

pub use risk::{score, RiskAssessment, RiskLevel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Privacy,
    Terms,
}

impl DocumentType {
    pub fn description(&self) -> &'static str {
        match self {
            DocumentType::Privacy => "privacy policy",
            DocumentType::Terms => "terms of service",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Privacy => write!(f, "privacy"),
            DocumentType::Terms => write!(f, "terms"),
        }
    }
}

/// Merged findings for a whole document. List caps are enforced after
/// merge, preserving encounter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedAnalysis {
    pub executive_summary: String,
    pub key_points: Vec<String>,
    pub red_flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub compliance_tags: HashMap<String, String>,
    pub per_chunk_findings: Vec<ChunkFinding>,
    /// How many analyzed chunks degraded to placeholder findings.
    pub degraded_chunks: usize,
}

/// The analyzed result for one URL, as cached and as returned to the
/// extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub analysis: AggregatedAnalysis,
    pub risk_scores: RiskAssessment,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Only the first N chunks are analyzed, bounding inference cost.
    pub max_analyzed_chunks: usize,
    pub max_key_points: usize,
    pub max_red_flags: usize,
    pub max_recommendations: usize,
    pub chunk_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub temperature: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_analyzed_chunks: 3,
            max_key_points: 10,
            max_red_flags: 5,
            max_recommendations: 5,
            chunk_max_tokens: 1024,
            summary_max_tokens: 512,
            temperature: 0.3,
        }
    }
}

pub struct AnalysisOrchestrator {
    client: Arc<dyn InferenceClient>,
    config: OrchestratorConfig,
}

impl AnalysisOrchestrator {
    pub fn new(client: Arc<dyn InferenceClient>, config: OrchestratorConfig) -> Self {
        Self { client, config }
    }

    /// Analyze the first N chunks sequentially and aggregate the
    /// findings. Infallible: degradation is absorbed per chunk.
    pub async fn analyze(
        &self,
        chunks: &[ContentChunk],
        doc_type: DocumentType,
    ) -> AggregatedAnalysis {
        let system_prompt = prompts::auditor_system_prompt(doc_type);

        let mut parsed_findings: Vec<ParsedFinding> = Vec::new();
        for chunk in chunks.iter().take(self.config.max_analyzed_chunks) {
            let prompt = InferencePrompt {
                system_prompt: system_prompt.clone(),
                user_prompt: prompts::chunk_user_prompt(&chunk.text),
                max_tokens: self.config.chunk_max_tokens,
                temperature: self.config.temperature,
            };

            // Awaited one after another, never fanned out: merge order
            // must follow chunk order.
            let parsed = match self.client.complete(prompt).await {
                Ok(raw) => parse_chunk_finding(&raw),
                Err(e) => {
                    warn!("Inference call failed for chunk {}: {}", chunk.ordinal, e);
                    ParsedFinding::Degraded(e.to_string())
                }
            };

            if let ParsedFinding::Degraded(reason) = &parsed {
                debug!("Chunk {} degraded: {}", chunk.ordinal, reason);
            }
            parsed_findings.push(parsed);
        }

        let degraded_chunks = parsed_findings.iter().filter(|p| p.is_degraded()).count();
        let findings: Vec<ChunkFinding> = parsed_findings
            .into_iter()
            .map(ParsedFinding::into_finding)
            .collect();

        let mut analysis = merge_findings(&findings, &self.config);
        analysis.degraded_chunks = degraded_chunks;

        self.summarize(&mut analysis, doc_type).await;

        analysis
    }

    async fn summarize(&self, analysis: &mut AggregatedAnalysis, doc_type: DocumentType) {
        let prompt = InferencePrompt {
            system_prompt: prompts::auditor_system_prompt(doc_type),
            user_prompt: prompts::summary_user_prompt(&analysis.per_chunk_findings),
            max_tokens: self.config.summary_max_tokens,
            temperature: self.config.temperature,
        };

        let payload = match self.client.complete(prompt).await {
            Ok(raw) => parse_summary(&raw),
            Err(e) => {
                warn!("Summary inference call failed: {}", e);
                None
            }
        };

        match payload {
            Some(summary) => {
                analysis.executive_summary = summary.executive_summary;
                analysis.recommendations = summary.recommendations;
            }
            None => {
                analysis.executive_summary = fallback_summary(doc_type, analysis);
                analysis.recommendations =
                    vec!["Review the full document before accepting it.".to_string()];
            }
        }

        analysis
            .recommendations
            .truncate(self.config.max_recommendations);
    }
}

/// Merge per-chunk findings in encounter order and apply list caps.
/// For duplicated compliance tags the first-seen value wins; the
/// scorer reads the per-chunk findings so nothing is lost.
fn merge_findings(findings: &[ChunkFinding], config: &OrchestratorConfig) -> AggregatedAnalysis {
    let mut key_points = Vec::new();
    let mut red_flags = Vec::new();
    let mut compliance_tags: HashMap<String, String> = HashMap::new();

    for finding in findings {
        key_points.extend(finding.key_points.iter().cloned());
        red_flags.extend(finding.red_flags.iter().cloned());
        for (tag, value) in &finding.compliance_tags {
            compliance_tags
                .entry(tag.clone())
                .or_insert_with(|| value.clone());
        }
    }

    key_points.truncate(config.max_key_points);
    red_flags.truncate(config.max_red_flags);

    AggregatedAnalysis {
        executive_summary: String::new(),
        key_points,
        red_flags,
        recommendations: Vec::new(),
        compliance_tags,
        per_chunk_findings: findings.to_vec(),
        degraded_chunks: 0,
    }
}

/// Static fallback when the summary call fails or is unparsable.
fn fallback_summary(doc_type: DocumentType, analysis: &AggregatedAnalysis) -> String {
    if analysis.red_flags.is_empty() {
        format!(
            "This {} was analyzed section by section; no red flags were \
             identified in the sampled sections.",
            doc_type.description()
        )
    } else {
        format!(
            "This {} was analyzed section by section; {} potential red \
             flag(s) were identified in the sampled sections.",
            doc_type.description(),
            analysis.red_flags.len()
        )
    }
}
