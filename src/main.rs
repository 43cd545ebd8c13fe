// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use policy_audit_node::{
    api::{http_server, ApiServer},
    cache::MemoryStorage,
    config::AppConfig,
    fetcher::HttpContentFetcher,
    inference::HttpInferenceClient,
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting Policy Audit Node...");
    info!("Build version: {}", policy_audit_node::version::VERSION);

    let config = AppConfig::from_env();
    info!(
        "Inference endpoint: {} (timeout {}s)",
        config.inference.endpoint,
        config.inference.timeout.as_secs()
    );
    info!(
        "Cache TTL: {}s, rate limit: {} requests per {}s",
        config.cache.ttl.as_secs(),
        config.rate_limit.max_requests,
        config.rate_limit.window_secs
    );

    let fetcher = Arc::new(HttpContentFetcher::new(config.fetch.clone()));
    let inference_client = Arc::new(HttpInferenceClient::new(config.inference.clone()));
    let storage = Arc::new(MemoryStorage::new());

    let api_server = Arc::new(
        ApiServer::new(&config, fetcher, inference_client, storage).await?,
    );

    // Periodic maintenance alongside the per-entry eviction timers.
    let maintenance_server = api_server.clone();
    let maintenance_interval = config.maintenance_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(maintenance_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            maintenance_server.run_maintenance().await;
        }
    });

    http_server::start_server(api_server, &config.http).await
}
