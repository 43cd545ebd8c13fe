// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TTL cache for analysis results, keyed by normalized source URL.
//!
//! Each partition keeps its live entries in memory, mirrors them to an
//! injected `Storage` after every mutation, and runs one eviction task
//! holding a single outstanding timer armed for the minimum expiry
//! across all entries. Expiry is also applied lazily on `get`, so an
//! expired-but-unswept entry is a miss before the timer fires.
//!
//! All mutations of one partition are serialized behind its mutex:
//! concurrent `put`s for different keys are strictly ordered, never
//! interleaved at the field level.

pub mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::analysis::AnalysisResult;

pub use storage::{MemoryStorage, PersistedEntry, Storage};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub partition: String,
    /// Time-to-live applied to entries inserted through `put_default`.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            partition: "analysis".to_string(),
            ttl: Duration::from_secs(1800),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("TTL must be greater than zero")]
    InvalidTtl,

    #[error("storage error: {0}")]
    Storage(String),
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub value: AnalysisResult,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct LiveEntry {
    value: AnalysisResult,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    created_instant: Instant,
    expires_instant: Instant,
}

#[derive(Default)]
struct PartitionState {
    entries: HashMap<String, LiveEntry>,
    /// Hex SHA-256 of the key -> key, for id-based result lookups.
    id_index: HashMap<String, String>,
    /// Min-heap of (expiry, key). Stale heads (entry replaced or
    /// already removed) are skipped when popped.
    expirations: BinaryHeap<Reverse<(Instant, String)>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl PartitionState {
    fn snapshot(&self) -> Vec<PersistedEntry> {
        self.entries
            .iter()
            .map(|(key, entry)| PersistedEntry {
                key: key.clone(),
                value: entry.value.clone(),
                created_at: entry.created_at,
                expires_at: entry.expires_at,
            })
            .collect()
    }

    fn remove(&mut self, key: &str) -> Option<LiveEntry> {
        let entry = self.entries.remove(key)?;
        self.id_index.remove(&TtlCacheStore::hash_key(key));
        Some(entry)
    }

    /// Next deadline the eviction timer should arm for, skipping heap
    /// entries that no longer match a live entry.
    fn next_deadline(&mut self) -> Option<Instant> {
        loop {
            let (deadline, key) = match self.expirations.peek() {
                Some(Reverse((deadline, key))) => (*deadline, key.clone()),
                None => return None,
            };
            match self.entries.get(&key) {
                Some(entry) if entry.expires_instant == deadline => return Some(deadline),
                _ => {
                    self.expirations.pop();
                }
            }
        }
    }
}

/// A single cache partition with TTL expiry and scheduled eviction.
pub struct TtlCacheStore {
    partition: String,
    ttl: Duration,
    state: Arc<Mutex<PartitionState>>,
    storage: Arc<dyn Storage>,
    reschedule: Arc<Notify>,
}

impl TtlCacheStore {
    /// Load any persisted entries (dropping ones already expired) and
    /// start the partition's eviction task.
    pub async fn new(config: CacheConfig, storage: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let mut state = PartitionState::default();

        let now_wall = Utc::now();
        let now = Instant::now();
        for persisted in storage.load(&config.partition).await? {
            let Ok(remaining) = (persisted.expires_at - now_wall).to_std() else {
                continue; // already expired
            };
            let age = (now_wall - persisted.created_at).to_std().unwrap_or_default();
            let expires_instant = now + remaining;
            state
                .expirations
                .push(Reverse((expires_instant, persisted.key.clone())));
            state
                .id_index
                .insert(Self::hash_key(&persisted.key), persisted.key.clone());
            state.entries.insert(
                persisted.key.clone(),
                LiveEntry {
                    value: persisted.value,
                    created_at: persisted.created_at,
                    expires_at: persisted.expires_at,
                    created_instant: now.checked_sub(age).unwrap_or(now),
                    expires_instant,
                },
            );
        }

        debug!(
            "Cache partition '{}' loaded with {} live entries",
            config.partition,
            state.entries.len()
        );

        let store = Self {
            partition: config.partition,
            ttl: config.ttl,
            state: Arc::new(Mutex::new(state)),
            storage,
            reschedule: Arc::new(Notify::new()),
        };
        store.spawn_eviction_task();
        Ok(store)
    }

    /// Hex SHA-256 of a cache key; doubles as the public result id.
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn default_ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert a live entry and re-arm the eviction timer. At most one
    /// live entry per key: an existing entry is replaced.
    pub async fn put(
        &self,
        key: &str,
        value: AnalysisResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }

        let mut state = self.state.lock().await;

        let created_instant = Instant::now();
        let expires_instant = created_instant + ttl;
        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(ttl).map_err(|e| CacheError::Storage(e.to_string()))?;

        state
            .expirations
            .push(Reverse((expires_instant, key.to_string())));
        state.id_index.insert(Self::hash_key(key), key.to_string());
        state.entries.insert(
            key.to_string(),
            LiveEntry {
                value,
                created_at,
                expires_at,
                created_instant,
                expires_instant,
            },
        );

        // Persisted while the lock is held so snapshots reach storage
        // in mutation order.
        let snapshot = state.snapshot();
        let persisted = self.storage.persist(&self.partition, &snapshot).await;
        drop(state);

        self.reschedule.notify_one();

        persisted.map_err(|e| CacheError::Storage(e.to_string()))
    }

    /// Insert with the partition's configured TTL.
    pub async fn put_default(&self, key: &str, value: AnalysisResult) -> Result<(), CacheError> {
        self.put(key, value, self.ttl).await
    }

    /// Lookup with lazy expiry: an entry past its expiry is a miss
    /// even if the eviction timer has not fired yet.
    pub async fn get(&self, key: &str) -> Option<CacheHit> {
        let mut state = self.state.lock().await;

        match state.entries.get(key) {
            Some(entry) if entry.expires_instant > Instant::now() => {
                let hit = CacheHit {
                    value: entry.value.clone(),
                    created_at: entry.created_at,
                    expires_at: entry.expires_at,
                };
                state.hits += 1;
                Some(hit)
            }
            Some(_) => {
                state.remove(key);
                state.evictions += 1;
                state.misses += 1;
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Lookup by the public result id (hex SHA-256 of the key).
    pub async fn get_by_id(&self, id: &str) -> Option<CacheHit> {
        let key = {
            let state = self.state.lock().await;
            state.id_index.get(id).cloned()
        }?;
        self.get(&key).await
    }

    /// Bulk cleanup: remove entries older than `max_age` by creation
    /// time, independent of per-entry TTL.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let stale: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.created_instant) >= max_age)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            state.remove(key);
        }
        state.evictions += stale.len() as u64;

        if !stale.is_empty() {
            let snapshot = state.snapshot();
            if let Err(e) = self.storage.persist(&self.partition, &snapshot).await {
                warn!("Failed to persist cache partition after sweep: {}", e);
            }
            debug!(
                "Swept {} entries older than {:?} from partition '{}'",
                stale.len(),
                max_age,
                self.partition
            );
        }

        stale.len()
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            entries: state.entries.len(),
        }
    }

    /// One task per partition; its single timer is re-armed whenever a
    /// `put` changes the minimum expiry.
    fn spawn_eviction_task(&self) {
        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);
        let reschedule = Arc::clone(&self.reschedule);
        let partition = self.partition.clone();

        tokio::spawn(async move {
            loop {
                let deadline = {
                    let mut state = state.lock().await;
                    state.next_deadline()
                };

                match deadline {
                    None => reschedule.notified().await,
                    Some(deadline) => {
                        tokio::select! {
                            _ = tokio::time::sleep_until(deadline) => {
                                Self::evict_expired(&state, storage.as_ref(), &partition).await;
                            }
                            _ = reschedule.notified() => {}
                        }
                    }
                }
            }
        });
    }

    async fn evict_expired(
        state: &Mutex<PartitionState>,
        storage: &dyn Storage,
        partition: &str,
    ) {
        let mut state = state.lock().await;
        let now = Instant::now();
        let mut removed = 0usize;

        while let Some(Reverse((deadline, key))) = state.expirations.peek().cloned() {
            if deadline > now {
                break;
            }
            state.expirations.pop();
            let live = matches!(
                state.entries.get(&key),
                Some(entry) if entry.expires_instant == deadline
            );
            if live {
                state.remove(&key);
                removed += 1;
            }
        }

        if removed > 0 {
            state.evictions += removed as u64;
            let snapshot = state.snapshot();
            if let Err(e) = storage.persist(partition, &snapshot).await {
                warn!("Failed to persist cache partition after eviction: {}", e);
            }
            debug!(
                "Evicted {} expired entries from partition '{}'",
                removed, partition
            );
        }
    }
}
