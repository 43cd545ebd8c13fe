// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::fetcher::FetchError;
use crate::validator::InvalidUrl;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    InvalidUrl(String),
    Forbidden(String),
    NotFound(String),
    PayloadTooLarge,
    RateLimited { retry_after: u64 },
    FetchFailed { message: String, upstream_status: Option<u16> },
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::InvalidUrl(msg) => ("invalid_url", msg.clone(), None),
            ApiError::Forbidden(msg) => ("forbidden", msg.clone(), None),
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::PayloadTooLarge => (
                "payload_too_large",
                "Request body exceeds the size limit".to_string(),
                None,
            ),
            ApiError::RateLimited { retry_after } => {
                let mut details = HashMap::new();
                details.insert(
                    "retry_after".to_string(),
                    serde_json::Value::Number((*retry_after).into()),
                );
                (
                    "rate_limit_exceeded",
                    "Rate limit exceeded".to_string(),
                    Some(details),
                )
            }
            ApiError::FetchFailed {
                message,
                upstream_status,
            } => {
                let details = upstream_status.map(|status| {
                    let mut details = HashMap::new();
                    details.insert(
                        "upstream_status".to_string(),
                        serde_json::Value::Number(status.into()),
                    );
                    details
                });
                ("fetch_failed", message.clone(), details)
            }
            // Detailed cause is logged server-side only.
            ApiError::InternalError(_) => (
                "internal_error",
                "Internal server error".to_string(),
                None,
            ),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::InvalidUrl(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::PayloadTooLarge => 413,
            ApiError::RateLimited { .. } => 429,
            // A 5xx upstream is the upstream's fault, not the caller's.
            ApiError::FetchFailed {
                upstream_status, ..
            } => match upstream_status {
                Some(status) if *status >= 500 => 502,
                _ => 400,
            },
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::PayloadTooLarge => write!(f, "Payload too large"),
            ApiError::RateLimited { retry_after } => {
                write!(f, "Rate limit exceeded, retry after {} seconds", retry_after)
            }
            ApiError::FetchFailed { message, .. } => write!(f, "Fetch failed: {}", message),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<InvalidUrl> for ApiError {
    fn from(e: InvalidUrl) -> Self {
        ApiError::InvalidUrl(e.to_string())
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::FetchFailed {
            upstream_status: e.upstream_status(),
            message: e.to_string(),
        }
    }
}
