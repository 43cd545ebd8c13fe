// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline: validate, admit, consult the cache, then fetch,
//! chunk, analyze, score and cache.
//!
//! Each inbound request runs as its own task; the only shared state is
//! the rate limiter's window map and the cache partition. All awaits
//! within one request are sequential.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

use super::handlers::{
    AnalyzeRequest, AnalyzeResponse, DetectRequest, DetectResponse, HealthResponse, ResultsQuery,
    ResultsResponse,
};
use super::rate_limiter::{RateLimitError, RateLimiter};
use super::ApiError;
use crate::analysis::{risk, AnalysisOrchestrator, AnalysisResult};
use crate::cache::{Storage, TtlCacheStore};
use crate::chunker::{chunk_text, ChunkerConfig};
use crate::config::AppConfig;
use crate::detect::PolicyDetector;
use crate::fetcher::ContentFetcher;
use crate::inference::InferenceClient;
use crate::validator::validate_url;

pub struct ApiServer {
    rate_limiter: RateLimiter,
    fetcher: Arc<dyn ContentFetcher>,
    orchestrator: AnalysisOrchestrator,
    cache: TtlCacheStore,
    detector: PolicyDetector,
    chunker_config: ChunkerConfig,
    sweep_max_age: std::time::Duration,
    inference_configured: bool,
    started_at: Instant,
}

impl ApiServer {
    pub async fn new(
        config: &AppConfig,
        fetcher: Arc<dyn ContentFetcher>,
        inference_client: Arc<dyn InferenceClient>,
        storage: Arc<dyn Storage>,
    ) -> anyhow::Result<Self> {
        let cache = TtlCacheStore::new(config.cache.clone(), storage).await?;

        Ok(Self {
            rate_limiter: RateLimiter::new(config.rate_limit.clone()),
            fetcher,
            orchestrator: AnalysisOrchestrator::new(
                inference_client,
                config.orchestrator.clone(),
            ),
            cache,
            detector: PolicyDetector::new(),
            chunker_config: config.chunker.clone(),
            sweep_max_age: config.sweep_max_age,
            inference_configured: !config.inference.endpoint.is_empty(),
            started_at: Instant::now(),
        })
    }

    pub fn cache(&self) -> &TtlCacheStore {
        &self.cache
    }

    /// Analyze a document, serving from the cache when possible.
    pub async fn handle_analyze(
        &self,
        request: AnalyzeRequest,
        client_ip: &str,
    ) -> Result<AnalyzeResponse, ApiError> {
        request.validate()?;
        let url = validate_url(&request.url)?;

        // Admission control happens before any network or inference
        // work is spent on the request.
        self.admit(client_ip).await?;

        let key = url.to_string();

        if !request.options.force_refresh {
            if let Some(hit) = self.cache.get(&key).await {
                info!("Cache hit for: {}", key);
                return Ok(AnalyzeResponse {
                    success: true,
                    result: hit.value,
                    cached: true,
                    timestamp: hit.created_at,
                });
            }
        }

        let document = self.fetcher.fetch(&url).await?;
        let chunks = chunk_text(&document.plain_text, &self.chunker_config);
        info!(
            "Analyzing {} ({} chars extracted, {} chunks)",
            key,
            document.plain_text.len(),
            chunks.len()
        );

        let analysis = self.orchestrator.analyze(&chunks, request.doc_type).await;
        let risk_scores = risk::score(&analysis);

        let result = AnalysisResult {
            url: key.clone(),
            doc_type: request.doc_type,
            analysis,
            risk_scores,
        };

        // A storage failure loses the cache entry, not the response.
        if let Err(e) = self.cache.put_default(&key, result.clone()).await {
            warn!("Caching analysis for {} failed: {}", key, e);
        }

        Ok(AnalyzeResponse {
            success: true,
            result,
            cached: false,
            timestamp: Utc::now(),
        })
    }

    /// Probe whether a page looks like a policy document.
    pub async fn handle_detect(
        &self,
        request: DetectRequest,
        client_ip: &str,
    ) -> Result<DetectResponse, ApiError> {
        let url = validate_url(&request.url)?;
        self.admit(client_ip).await?;

        let document = self.fetcher.fetch(&url).await?;
        let outcome = self.detector.detect(&url, &document.plain_text);

        Ok(DetectResponse {
            success: true,
            is_policy: outcome.is_policy,
            indicators: outcome.indicators,
        })
    }

    /// Look up a cached result by id or URL.
    pub async fn handle_results(&self, query: ResultsQuery) -> Result<ResultsResponse, ApiError> {
        let hit = if let Some(id) = &query.id {
            self.cache.get_by_id(id).await
        } else if let Some(url) = &query.url {
            let url = validate_url(url)?;
            self.cache.get(url.as_str()).await
        } else {
            return Err(ApiError::InvalidRequest(
                "either 'id' or 'url' query parameter is required".to_string(),
            ));
        };

        match hit {
            Some(hit) => Ok(ResultsResponse {
                success: true,
                result: hit.value,
                timestamp: hit.created_at,
                expires_at: hit.expires_at,
            }),
            None => Err(ApiError::NotFound(
                "no cached result for that id or URL".to_string(),
            )),
        }
    }

    /// Health report plus whether the node should answer 200 or 503.
    /// An unresponsive cache partition makes the node unhealthy; a
    /// missing inference endpoint only degrades it.
    pub async fn health_check(&self) -> (HealthResponse, bool) {
        let cache_stats =
            tokio::time::timeout(std::time::Duration::from_secs(1), self.cache.stats()).await;

        let mut checks: HashMap<String, serde_json::Value> = HashMap::new();
        let cache_responsive = match &cache_stats {
            Ok(stats) => {
                checks.insert(
                    "cache".to_string(),
                    serde_json::json!({
                        "responsive": true,
                        "entries": stats.entries,
                        "hits": stats.hits,
                        "misses": stats.misses,
                        "evictions": stats.evictions,
                        "hit_rate": stats.hit_rate(),
                    }),
                );
                true
            }
            Err(_) => {
                checks.insert(
                    "cache".to_string(),
                    serde_json::json!({ "responsive": false }),
                );
                false
            }
        };
        checks.insert(
            "inference".to_string(),
            serde_json::json!({ "configured": self.inference_configured }),
        );
        checks.insert(
            "rate_limiter".to_string(),
            serde_json::json!({
                "tracked_identifiers": self.rate_limiter.tracked_identifiers().await
            }),
        );
        checks.insert(
            "uptime_seconds".to_string(),
            serde_json::json!(self.started_at.elapsed().as_secs()),
        );
        checks.insert(
            "version".to_string(),
            serde_json::json!({
                "number": crate::version::VERSION_NUMBER,
                "build_date": crate::version::BUILD_DATE,
                "features": crate::version::FEATURES,
            }),
        );

        let status = if !cache_responsive {
            "unhealthy"
        } else if self.inference_configured {
            "healthy"
        } else {
            "degraded"
        };

        (
            HealthResponse {
                status: status.to_string(),
                checks,
            },
            cache_responsive,
        )
    }

    /// Periodic maintenance: bulk-sweep old cache entries and drop
    /// idle rate-limit windows.
    pub async fn run_maintenance(&self) {
        let swept = self.cache.sweep(self.sweep_max_age).await;
        let idle = self.rate_limiter.sweep_idle().await;
        if swept > 0 || idle > 0 {
            info!(
                "Maintenance pass: {} cache entries swept, {} idle windows dropped",
                swept, idle
            );
        }
    }

    async fn admit(&self, client_ip: &str) -> Result<(), ApiError> {
        self.rate_limiter.admit(client_ip).await.map_err(
            |RateLimitError::Exceeded { retry_after_secs }| ApiError::RateLimited {
                retry_after: retry_after_secs,
            },
        )
    }
}
