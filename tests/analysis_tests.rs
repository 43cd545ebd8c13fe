// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Orchestrator behavior against a scripted inference client:
//! aggregation, degradation and summary fallback.

mod common;

use std::sync::Arc;

use policy_audit_node::analysis::{
    risk, AnalysisOrchestrator, DocumentType, OrchestratorConfig, RiskLevel,
};
use policy_audit_node::chunker::ContentChunk;
use policy_audit_node::inference::{InferenceError, PLACEHOLDER_KEY_POINT};

use common::{compliant_chunk_json, flagged_chunk_json, summary_json, FakeInferenceClient};

fn chunk(text: &str, ordinal: usize) -> ContentChunk {
    ContentChunk {
        text: text.to_string(),
        ordinal,
    }
}

fn orchestrator(client: FakeInferenceClient) -> (Arc<FakeInferenceClient>, AnalysisOrchestrator) {
    let client = Arc::new(client);
    let orchestrator =
        AnalysisOrchestrator::new(client.clone(), OrchestratorConfig::default());
    (client, orchestrator)
}

#[tokio::test]
async fn test_clean_document_scores_green() {
    let (_, orchestrator) = orchestrator(FakeInferenceClient::scripted(vec![
        Ok(compliant_chunk_json()),
        Ok(summary_json()),
    ]));

    let analysis = orchestrator
        .analyze(&[chunk("We encrypt your data.", 0)], DocumentType::Privacy)
        .await;

    assert_eq!(analysis.degraded_chunks, 0);
    assert_eq!(analysis.executive_summary, "A short, readable privacy policy.");
    assert_eq!(analysis.recommendations, vec!["No action needed"]);
    assert!(analysis.red_flags.is_empty());

    let scores = risk::score(&analysis);
    assert_eq!(scores.overall, RiskLevel::Green);
    assert_eq!(scores.regulatory, RiskLevel::Green);
    assert_eq!(scores.user_rights, RiskLevel::Green);
}

#[tokio::test]
async fn test_red_flags_raise_risk() {
    let (_, orchestrator) = orchestrator(FakeInferenceClient::scripted(vec![
        Ok(flagged_chunk_json()),
        Ok(summary_json()),
    ]));

    let analysis = orchestrator
        .analyze(&[chunk("We sell your data.", 0)], DocumentType::Privacy)
        .await;

    assert_eq!(analysis.red_flags.len(), 1);

    let scores = risk::score(&analysis);
    assert_eq!(scores.regulatory, RiskLevel::Red);
    assert_eq!(scores.transparency, RiskLevel::Yellow);
    assert_eq!(scores.user_rights, RiskLevel::Yellow);
    assert_eq!(scores.overall, RiskLevel::Red);
}

#[tokio::test]
async fn test_failed_chunk_degrades_to_placeholder() {
    let (_, orchestrator) = orchestrator(FakeInferenceClient::scripted(vec![
        Err(InferenceError::Timeout),
        Ok(compliant_chunk_json()),
        Ok(summary_json()),
    ]));

    let analysis = orchestrator
        .analyze(
            &[chunk("Section one.", 0), chunk("Section two.", 1)],
            DocumentType::Privacy,
        )
        .await;

    assert_eq!(analysis.degraded_chunks, 1);
    assert_eq!(analysis.per_chunk_findings.len(), 2);
    // The placeholder occupies the failed chunk's slot in order.
    assert_eq!(
        analysis.per_chunk_findings[0].key_points,
        vec![PLACEHOLDER_KEY_POINT]
    );
    assert!(analysis
        .key_points
        .iter()
        .any(|p| p == PLACEHOLDER_KEY_POINT));
}

#[tokio::test]
async fn test_unparsable_output_degrades() {
    let (_, orchestrator) = orchestrator(FakeInferenceClient::scripted(vec![
        Ok("I could not find any JSON to emit, sorry!".to_string()),
        Ok(summary_json()),
    ]));

    let analysis = orchestrator
        .analyze(&[chunk("Some section.", 0)], DocumentType::Terms)
        .await;

    assert_eq!(analysis.degraded_chunks, 1);
    assert_eq!(
        analysis.per_chunk_findings[0]
            .compliance_tags
            .get("compliance")
            .map(String::as_str),
        Some("unknown")
    );
}

#[tokio::test]
async fn test_summary_failure_falls_back_to_static_text() {
    let (_, orchestrator) = orchestrator(FakeInferenceClient::scripted(vec![
        Ok(compliant_chunk_json()),
        Err(InferenceError::Status(503)),
    ]));

    let analysis = orchestrator
        .analyze(&[chunk("We encrypt your data.", 0)], DocumentType::Privacy)
        .await;

    assert!(analysis
        .executive_summary
        .contains("analyzed section by section"));
    assert_eq!(
        analysis.recommendations,
        vec!["Review the full document before accepting it."]
    );
}

#[tokio::test]
async fn test_max_analyzed_chunks_caps_inference_calls() {
    let client = Arc::new(FakeInferenceClient::scripted(vec![
        Ok(compliant_chunk_json()),
        Ok(compliant_chunk_json()),
        Ok(summary_json()),
    ]));
    let orchestrator = AnalysisOrchestrator::new(
        client.clone(),
        OrchestratorConfig {
            max_analyzed_chunks: 2,
            ..Default::default()
        },
    );

    let chunks: Vec<ContentChunk> = (0..5).map(|i| chunk("Section text.", i)).collect();
    let analysis = orchestrator.analyze(&chunks, DocumentType::Privacy).await;

    // Two chunk calls plus one summary call.
    assert_eq!(client.calls(), 3);
    assert_eq!(analysis.per_chunk_findings.len(), 2);
}
