// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod detect;
pub mod fetcher;
pub mod inference;
pub mod validator;
pub mod version;

// Re-export the types most callers wire together
pub use analysis::{
    AggregatedAnalysis, AnalysisOrchestrator, AnalysisResult, DocumentType, OrchestratorConfig,
    RiskAssessment, RiskLevel,
};
pub use api::{ApiError, ApiServer, RateLimitConfig, RateLimiter};
pub use cache::{CacheConfig, MemoryStorage, Storage, TtlCacheStore};
pub use chunker::{chunk_text, ChunkerConfig, ContentChunk};
pub use config::{AppConfig, HttpConfig};
pub use detect::{DetectionOutcome, PolicyDetector};
pub use fetcher::{ContentFetcher, ExtractedDocument, FetchConfig, HttpContentFetcher};
pub use inference::{HttpInferenceClient, InferenceClient, InferenceConfig};
pub use validator::{validate_url, InvalidUrl};
