// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP document fetching with bounded timeouts and plain-text
//! extraction from markup.
//!
//! No JavaScript execution or rendering happens here; pages whose
//! policy text is injected client-side will yield degraded or empty
//! content. That is an accepted limitation of static extraction.

pub mod extractor;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use extractor::TextExtractor;

/// A fetched document reduced to plain text. Discarded after chunking,
/// never persisted.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Length of the raw markup in bytes.
    pub raw_length: usize,
    pub plain_text: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("timeout fetching: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {0} for: {1}")]
    Status(u16, String),

    #[error("unsupported content type '{0}' for: {1}")]
    NotHtml(String, String),
}

impl FetchError {
    /// Upstream status code, when one was received.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code, _) => Some(*code),
            _ => None,
        }
    }
}

/// Capability interface for document retrieval, injected into the API
/// server so tests can substitute canned documents.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<ExtractedDocument, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (compatible; PolicyAuditBot/1.0)".to_string(),
            max_redirects: 5,
        }
    }
}

/// Production fetcher backed by reqwest.
pub struct HttpContentFetcher {
    client: Client,
    extractor: TextExtractor,
}

impl HttpContentFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            extractor: TextExtractor::new(),
        }
    }

    fn is_html(content_type: &str) -> bool {
        let lowered = content_type.to_lowercase();
        lowered.contains("text/html") || lowered.contains("application/xhtml")
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &Url) -> Result<ExtractedDocument, FetchError> {
        debug!("Fetching document from: {}", url);

        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !Self::is_html(&content_type) {
            return Err(FetchError::NotHtml(content_type, url.to_string()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let plain_text = self.extractor.extract(&html);

        info!(
            "Extracted {} chars from {} bytes of markup at: {}",
            plain_text.len(),
            html.len(),
            url
        );

        Ok(ExtractedDocument {
            raw_length: html.len(),
            plain_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html_content_types() {
        assert!(HttpContentFetcher::is_html("text/html"));
        assert!(HttpContentFetcher::is_html("text/html; charset=utf-8"));
        assert!(HttpContentFetcher::is_html("application/xhtml+xml"));
        assert!(!HttpContentFetcher::is_html("application/json"));
        assert!(!HttpContentFetcher::is_html("image/png"));
        assert!(!HttpContentFetcher::is_html(""));
    }

    #[test]
    fn test_fetcher_creation() {
        let fetcher = HttpContentFetcher::new(FetchConfig::default());
        let _ = fetcher;
    }
}
