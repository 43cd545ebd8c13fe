// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for the external inference service.
//!
//! The service accepts a system/user prompt pair and returns free-form
//! text. Callers are responsible for treating unparsable output as a
//! recoverable per-call error, never a fatal one.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferencePrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(String),

    #[error("inference endpoint returned HTTP {0}")]
    Status(u16),

    #[error("inference request timed out")]
    Timeout,

    #[error("inference response had no content field")]
    EmptyResponse,
}

/// Capability interface for structured-extraction calls, injected into
/// the orchestrator so tests can substitute canned completions.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, prompt: InferencePrompt) -> Result<String, InferenceError>;
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Bounds every inference call so a stuck upstream cannot block a
    /// request indefinitely.
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8081/v1/inference".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    content: Option<String>,
}

pub struct HttpInferenceClient {
    client: Client,
    config: InferenceConfig,
}

impl HttpInferenceClient {
    pub fn new(config: InferenceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn complete(&self, prompt: InferencePrompt) -> Result<String, InferenceError> {
        debug!(
            "Issuing inference call ({} max tokens) to {}",
            prompt.max_tokens, self.config.endpoint
        );

        let mut request = self.client.post(&self.config.endpoint).json(&prompt);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout
            } else {
                InferenceError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        body.content.ok_or(InferenceError::EmptyResponse)
    }
}
