// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analysis::{AnalysisResult, DocumentType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default, rename = "type")]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub options: AnalyzeOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOptions {
    /// Skip the cache lookup and recompute, still refreshing the
    /// cached entry afterwards.
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub result: AnalysisResult,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub success: bool,
    pub is_policy: bool,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsQuery {
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub success: bool,
    pub result: AnalysisResult,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub checks: HashMap<String, serde_json::Value>,
}

impl AnalyzeRequest {
    pub fn validate(&self) -> Result<(), crate::api::ApiError> {
        use crate::api::ApiError;

        if self.url.trim().is_empty() {
            return Err(ApiError::ValidationError {
                field: "url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_request_defaults() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"url": "https://example.com/privacy"}"#).unwrap();
        assert_eq!(req.doc_type, DocumentType::Privacy);
        assert!(!req.options.force_refresh);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_analyze_request_type_field() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"url": "https://example.com/tos", "type": "terms"}"#).unwrap();
        assert_eq!(req.doc_type, DocumentType::Terms);
    }

    #[test]
    fn test_analyze_request_rejects_blank_url() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"url": "   "}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_options_force_refresh() {
        let req: AnalyzeRequest = serde_json::from_str(
            r#"{"url": "https://example.com/privacy", "options": {"forceRefresh": true}}"#,
        )
        .unwrap();
        assert!(req.options.force_refresh);
    }
}
