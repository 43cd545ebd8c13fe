// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fakes and fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use policy_audit_node::analysis::{
    AggregatedAnalysis, AnalysisResult, DocumentType, RiskAssessment, RiskLevel,
};
use policy_audit_node::fetcher::{ContentFetcher, ExtractedDocument, FetchError};
use policy_audit_node::inference::{InferenceClient, InferenceError, InferencePrompt};

/// Inference client that replays a scripted sequence of completions.
pub struct FakeInferenceClient {
    responses: Mutex<VecDeque<Result<String, InferenceError>>>,
    calls: AtomicUsize,
}

impl FakeInferenceClient {
    pub fn scripted(responses: Vec<Result<String, InferenceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceClient for FakeInferenceClient {
    async fn complete(&self, _prompt: InferencePrompt) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::Request("no scripted response".to_string())))
    }
}

/// Fetcher serving canned plain-text documents keyed by URL.
pub struct FakeFetcher {
    documents: HashMap<String, String>,
}

impl FakeFetcher {
    pub fn with_document(url: &str, text: &str) -> Self {
        let mut documents = HashMap::new();
        documents.insert(url.to_string(), text.to_string());
        Self { documents }
    }
}

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<ExtractedDocument, FetchError> {
        match self.documents.get(url.as_str()) {
            Some(text) => Ok(ExtractedDocument {
                raw_length: text.len(),
                plain_text: text.clone(),
            }),
            None => Err(FetchError::Status(404, url.to_string())),
        }
    }
}

/// Fetcher that always fails with the given error.
pub struct FailingFetcher(pub FetchError);

#[async_trait]
impl ContentFetcher for FailingFetcher {
    async fn fetch(&self, _url: &Url) -> Result<ExtractedDocument, FetchError> {
        Err(self.0.clone())
    }
}

pub fn compliant_chunk_json() -> String {
    r#"{
        "keyPoints": ["Data is encrypted in transit and at rest"],
        "redFlags": [],
        "complianceTags": {"GDPR": "compliant", "CCPA": "compliant"},
        "mentionedRights": ["access", "deletion"]
    }"#
    .to_string()
}

pub fn flagged_chunk_json() -> String {
    r#"{
        "keyPoints": ["Data may be shared with partners"],
        "redFlags": ["Sells personal data to third parties"],
        "complianceTags": {"GDPR": "non-compliant"},
        "mentionedRights": []
    }"#
    .to_string()
}

pub fn summary_json() -> String {
    r#"{
        "executiveSummary": "A short, readable privacy policy.",
        "recommendations": ["No action needed"]
    }"#
    .to_string()
}

/// A document long enough to survive the chunker's minimum-size filter
/// and small enough to produce a single chunk.
pub fn policy_document() -> String {
    "This privacy policy explains how we collect and use your personal data. \
     We retain your data for as long as your account exists. You may request \
     access to or deletion of your personal data at any time."
        .to_string()
}

pub fn sample_result(url: &str) -> AnalysisResult {
    AnalysisResult {
        url: url.to_string(),
        doc_type: DocumentType::Privacy,
        analysis: AggregatedAnalysis {
            executive_summary: "Nothing alarming.".to_string(),
            key_points: vec!["Short retention period".to_string()],
            red_flags: Vec::new(),
            recommendations: vec!["No action needed".to_string()],
            compliance_tags: HashMap::new(),
            per_chunk_findings: Vec::new(),
            degraded_chunks: 0,
        },
        risk_scores: RiskAssessment::from_axes(
            RiskLevel::Green,
            RiskLevel::Green,
            RiskLevel::Green,
        ),
    }
}
