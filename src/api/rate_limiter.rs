// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-identifier sliding-window admission control.
//!
//! The window store is process-local memory. Under multiple server
//! instances the limit is approximate, not a hard global cap.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 10,
        }
    }
}

impl RateLimitConfig {
    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    Exceeded { retry_after_secs: u64 },
}

/// Sliding-window rate limiter. Timestamps older than the window are
/// pruned lazily on each check; idle identifiers are dropped by the
/// periodic sweep.
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Admit or reject one request for `identifier`.
    pub async fn admit(&self, identifier: &str) -> Result<(), RateLimitError> {
        let now = Instant::now();
        let window = self.config.window();

        let mut windows = self.windows.write().await;
        let entry = windows.entry(identifier.to_string()).or_default();

        entry.retain(|&t| now.duration_since(t) < window);

        if entry.len() >= self.config.max_requests {
            let oldest = entry.iter().min().copied().unwrap_or(now);
            let elapsed = now.duration_since(oldest);
            let retry_after_secs = window.saturating_sub(elapsed).as_secs().max(1);
            return Err(RateLimitError::Exceeded { retry_after_secs });
        }

        entry.push(now);
        Ok(())
    }

    /// Drop identifiers whose every timestamp has aged out of the
    /// window. Called from the periodic maintenance task.
    pub async fn sweep_idle(&self) -> usize {
        let now = Instant::now();
        let window = self.config.window();

        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, timestamps| {
            timestamps.iter().any(|&t| now.duration_since(t) < window)
        });
        let removed = before - windows.len();
        if removed > 0 {
            debug!("Swept {} idle rate-limit windows", removed);
        }
        removed
    }

    pub async fn tracked_identifiers(&self) -> usize {
        self.windows.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_secs: u64, max_requests: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window_secs,
            max_requests,
        })
    }

    #[tokio::test]
    async fn test_admits_up_to_cap() {
        let limiter = limiter(60, 5);
        for i in 0..5 {
            assert!(
                limiter.admit("client-a").await.is_ok(),
                "request {} should be admitted",
                i
            );
        }
        assert!(limiter.admit("client-a").await.is_err());
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = limiter(60, 2);
        limiter.admit("a").await.unwrap();
        limiter.admit("a").await.unwrap();
        assert!(limiter.admit("a").await.is_err());
        assert!(limiter.admit("b").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_resumes_after_window() {
        let limiter = limiter(60, 2);
        limiter.admit("a").await.unwrap();
        limiter.admit("a").await.unwrap();
        assert!(limiter.admit("a").await.is_err());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.admit("a").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = limiter(60, 2);
        limiter.admit("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(40)).await;
        limiter.admit("a").await.unwrap();
        assert!(limiter.admit("a").await.is_err());

        // First timestamp ages out, second is still inside the window.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.admit("a").await.is_ok());
        assert!(limiter.admit("a").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint() {
        let limiter = limiter(60, 1);
        limiter.admit("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;
        match limiter.admit("a").await {
            Err(RateLimitError::Exceeded { retry_after_secs }) => {
                assert_eq!(retry_after_secs, 40);
            }
            Ok(()) => panic!("should have been limited"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_idle_drops_stale_windows() {
        let limiter = limiter(60, 5);
        limiter.admit("a").await.unwrap();
        limiter.admit("b").await.unwrap();
        assert_eq!(limiter.tracked_identifiers().await, 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.admit("b").await.unwrap();

        assert_eq!(limiter.sweep_idle().await, 1);
        assert_eq!(limiter.tracked_identifiers().await, 1);
    }
}
