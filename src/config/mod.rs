// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process configuration assembled from environment variables.
//!
//! Every knob has a default that works for local development, so a
//! bare `cargo run` starts a functional node.

use std::env;
use std::time::Duration;

use crate::api::RateLimitConfig;
use crate::cache::CacheConfig;
use crate::chunker::ChunkerConfig;
use crate::fetcher::FetchConfig;
use crate::inference::InferenceConfig;
use crate::analysis::OrchestratorConfig;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub listen_addr: String,
    pub max_body_bytes: usize,
    /// Extra origins accepted alongside browser-extension origins,
    /// used when exercising the API from a local web page.
    pub allowed_dev_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            max_body_bytes: 64 * 1024,
            allowed_dev_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub inference: InferenceConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub orchestrator: OrchestratorConfig,
    pub chunker: ChunkerConfig,
    /// Entries older than this are removed by the periodic sweep even
    /// if their TTL has not fired yet.
    pub sweep_max_age: Duration,
    pub maintenance_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            inference: InferenceConfig::default(),
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            chunker: ChunkerConfig::default(),
            sweep_max_age: Duration::from_secs(60 * 60),
            maintenance_interval: Duration::from_secs(5 * 60),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        let http = HttpConfig {
            listen_addr: env::var("API_LISTEN_ADDR")
                .unwrap_or(defaults.http.listen_addr),
            max_body_bytes: env_parsed("MAX_BODY_BYTES", defaults.http.max_body_bytes),
            allowed_dev_origins: env::var("ALLOWED_DEV_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.http.allowed_dev_origins),
        };

        let inference = InferenceConfig {
            endpoint: env::var("INFERENCE_ENDPOINT")
                .unwrap_or(defaults.inference.endpoint),
            api_key: env::var("INFERENCE_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(env_parsed(
                "INFERENCE_TIMEOUT_SECS",
                defaults.inference.timeout.as_secs(),
            )),
        };

        let fetch = FetchConfig {
            timeout: Duration::from_secs(env_parsed(
                "FETCH_TIMEOUT_SECS",
                defaults.fetch.timeout.as_secs(),
            )),
            ..defaults.fetch
        };

        let cache = CacheConfig {
            ttl: Duration::from_secs(env_parsed(
                "CACHE_TTL_SECS",
                defaults.cache.ttl.as_secs(),
            )),
            ..defaults.cache
        };

        let rate_limit = RateLimitConfig {
            window_secs: env_parsed("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs),
            max_requests: env_parsed(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit.max_requests,
            ),
        };

        let sweep_max_age = Duration::from_secs(
            env_parsed("SWEEP_MAX_AGE_MINUTES", defaults.sweep_max_age.as_secs() / 60) * 60,
        );
        let maintenance_interval = Duration::from_secs(env_parsed(
            "SWEEP_INTERVAL_SECS",
            defaults.maintenance_interval.as_secs(),
        ));

        Self {
            http,
            inference,
            fetch,
            cache,
            rate_limit,
            orchestrator: defaults.orchestrator,
            chunker: defaults.chunker,
            sweep_max_age,
            maintenance_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.http.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.cache.ttl, Duration::from_secs(1800));
        assert_eq!(config.rate_limit.max_requests, 10);
        assert!(config.sweep_max_age > config.cache.ttl);
    }
}
