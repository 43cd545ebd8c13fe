// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Axum router and HTTP front door.
//!
//! All routes except the health probe sit behind the extension gate:
//! requests must carry a plausible `x-extension-version` header and an
//! `Origin` header naming a browser-extension origin or a configured
//! development origin. The gate fails closed: no Origin means 403.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, DefaultBodyLimit, Query, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use regex::Regex;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers::{AnalyzeRequest, DetectRequest, ResultsQuery};
use super::{ApiError, ApiServer};
use crate::config::HttpConfig;

const EXTENSION_VERSION_HEADER: &str = "x-extension-version";

#[derive(Clone)]
struct AppState {
    api_server: Arc<ApiServer>,
}

#[derive(Clone)]
struct GateState {
    version_pattern: Arc<Regex>,
    allowed_dev_origins: Arc<Vec<String>>,
}

#[derive(Clone)]
pub struct RequestId(pub String);

pub fn build_router(api_server: Arc<ApiServer>, config: &HttpConfig) -> Router {
    let state = AppState { api_server };
    let gate = GateState {
        version_pattern: Arc::new(
            Regex::new(r"^\d+\.\d+\.\d+$").expect("invalid version pattern"),
        ),
        allowed_dev_origins: Arc::new(config.allowed_dev_origins.clone()),
    };

    let cors_origins = config.allowed_dev_origins.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin_allowed(origin, &cors_origins)
        }))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(EXTENSION_VERSION_HEADER),
        ]);

    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/detect", post(detect_handler))
        .route("/api/results", get(results_handler))
        .route("/api/health", get(health_handler))
        .layer(middleware::from_fn_with_state(gate, extension_gate))
        .layer(middleware::from_fn(assign_request_id))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(
    api_server: Arc<ApiServer>,
    config: &HttpConfig,
) -> anyhow::Result<()> {
    let app = build_router(api_server.clone(), config);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

/// Tag every request with an id that shows up in error payloads and
/// the `x-request-id` response header.
async fn assign_request_id(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = RequestId(Uuid::new_v4().to_string());
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

async fn extension_gate(
    State(gate): State<GateState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // The health probe stays reachable without extension headers so
    // that load balancers and uptime checks work unauthenticated.
    if req.uri().path() == "/api/health" {
        return next.run(req).await;
    }

    let request_id = req.extensions().get::<RequestId>().map(|id| id.0.clone());

    let version_ok = req
        .headers()
        .get(EXTENSION_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| gate.version_pattern.is_match(v))
        .unwrap_or(false);

    if !version_ok {
        return forbidden("missing or malformed extension version header", request_id);
    }

    // Fail closed: a request with no Origin at all is not a browser
    // extension and does not pass.
    let origin_ok = req
        .headers()
        .get(axum::http::header::ORIGIN)
        .map(|origin| origin_allowed(origin, &gate.allowed_dev_origins))
        .unwrap_or(false);

    if !origin_ok {
        return forbidden("missing or unpermitted origin", request_id);
    }

    next.run(req).await
}

fn origin_allowed(origin: &HeaderValue, allowed_dev_origins: &[String]) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    origin.starts_with("chrome-extension://")
        || origin.starts_with("moz-extension://")
        || allowed_dev_origins.iter().any(|allowed| allowed == origin)
}

fn forbidden(message: &str, request_id: Option<String>) -> Response {
    ApiErrorResponse {
        error: ApiError::Forbidden(message.to_string()),
        request_id,
    }
    .into_response()
}

async fn analyze_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, request_id),
    };

    let ip = client_ip(&headers, connect_info);
    match state.api_server.handle_analyze(request, &ip).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => ApiErrorResponse {
            error,
            request_id: Some(request_id.0),
        }
        .into_response(),
    }
}

async fn detect_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, request_id),
    };

    let ip = client_ip(&headers, connect_info);
    match state.api_server.handle_detect(request, &ip).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => ApiErrorResponse {
            error,
            request_id: Some(request_id.0),
        }
        .into_response(),
    }
}

async fn results_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ResultsQuery>,
) -> Response {
    match state.api_server.handle_results(query).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => ApiErrorResponse {
            error,
            request_id: Some(request_id.0),
        }
        .into_response(),
    }
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let (health, healthy) = state.api_server.health_check().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health)).into_response()
}

fn client_ip(headers: &HeaderMap, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    // First hop in x-forwarded-for when behind a proxy, otherwise the
    // socket peer address.
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn rejection_response(rejection: JsonRejection, request_id: RequestId) -> Response {
    let error = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::InvalidRequest(rejection.body_text())
    };
    ApiErrorResponse {
        error,
        request_id: Some(request_id.0),
    }
    .into_response()
}

// Error response wrapper
struct ApiErrorResponse {
    error: ApiError,
    request_id: Option<String>,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.error.to_response(self.request_id.clone());

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after } = self.error {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
        }
        response
    }
}
