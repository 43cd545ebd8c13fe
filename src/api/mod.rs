// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod rate_limiter;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{
    AnalyzeOptions, AnalyzeRequest, AnalyzeResponse, DetectRequest, DetectResponse,
    HealthResponse, ResultsQuery, ResultsResponse,
};
pub use http_server::{build_router, start_server};
pub use rate_limiter::{RateLimitConfig, RateLimitError, RateLimiter};
pub use server::ApiServer;
