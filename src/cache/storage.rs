// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistence capability for cache partitions.
//!
//! The store snapshots a partition's live entries after every
//! mutation. The default backing is process memory; the trait exists
//! so deployments (and tests) can swap the backing without touching
//! the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::analysis::AnalysisResult;

/// One cache entry as written to persistent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry {
    pub key: String,
    pub value: AnalysisResult,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn persist(&self, partition: &str, entries: &[PersistedEntry]) -> anyhow::Result<()>;
    async fn load(&self, partition: &str) -> anyhow::Result<Vec<PersistedEntry>>;
}

/// In-memory storage. Not a distributed-consistency primitive: each
/// server instance has its own copy, initialized at startup and gone
/// at shutdown.
#[derive(Default)]
pub struct MemoryStorage {
    partitions: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn persist(&self, partition: &str, entries: &[PersistedEntry]) -> anyhow::Result<()> {
        let encoded = serde_json::to_vec(entries)?;
        self.partitions
            .write()
            .await
            .insert(partition.to_string(), encoded);
        Ok(())
    }

    async fn load(&self, partition: &str) -> anyhow::Result<Vec<PersistedEntry>> {
        let partitions = self.partitions.read().await;
        match partitions.get(partition) {
            Some(encoded) => Ok(serde_json::from_slice(encoded)?),
            None => Ok(Vec::new()),
        }
    }
}
