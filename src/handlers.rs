// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the question intake service.
//!
//! The portal posts community submissions here. Requests are validated,
//! then handed to the submission pipeline which rate-limits, checks for
//! duplicates and appends the routed row to the question store.

use crate::config::Config;
use crate::error::SubmissionError;
use crate::limiter::RateLimitInfo;
use crate::metrics::Outcome;
use crate::model::{PersistedRow, SubmissionCandidate, SubmissionRequest};
use crate::pipeline::SubmissionPipeline;
use crate::validator::{SubmissionValidator, ValidationResult};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

/// Shared application state.
pub struct AppState {
    pub pipeline: SubmissionPipeline,
    pub validator: SubmissionValidator,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Accepted submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub table: &'static str,
    pub row: PersistedRow,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

const PERSISTENCE_FAILED_MESSAGE: &str =
    "Your question could not be saved, please try again later";
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/questions", post(submit_question))
        .route("/api/questions/rate-limit", get(rate_limit_status));

    if state.config.metrics.enabled {
        let path = state.config.metrics.path.clone();
        app = app.route(&path, get(metrics));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "question-intake",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Accept a community question.
pub async fn submit_question(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Response {
    let identifier = client_identifier(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.trust_forwarded_for,
    );
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            info!(identifier = %identifier, error = %rejection, "Unreadable submission body");
            state.pipeline.metrics().record(Outcome::Invalid);
            return invalid_submission(rejection.body_text());
        }
    };
    debug!(
        identifier = %identifier,
        question_type = %req.question_type,
        "Processing submission"
    );

    if let ValidationResult::Invalid(err) = state.validator.validate(&req) {
        info!(identifier = %identifier, error = %err, "Submission failed validation");
        state.pipeline.metrics().record(Outcome::Invalid);
        return invalid_submission(err.to_string());
    }

    let candidate = match SubmissionCandidate::try_from(req) {
        Ok(candidate) => candidate,
        Err(err) => {
            error!(identifier = %identifier, error = %err, "Validated submission has no known type");
            state.pipeline.metrics().record(Outcome::UnsupportedType);
            return error_response(&err, state.config.diagnostics);
        }
    };

    match state.pipeline.submit(&identifier, &candidate).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(SubmitResponse {
                success: true,
                table: receipt.table,
                row: receipt.row,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err, state.config.diagnostics),
    }
}

/// Remaining submission allowance for the caller.
pub async fn rate_limit_status(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<RateLimitInfo> {
    let identifier = client_identifier(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.trust_forwarded_for,
    );
    Json(state.pipeline.limiter().check_info(&identifier).await)
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.pipeline.metrics().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn invalid_submission(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: "INVALID_SUBMISSION",
            retry_after_secs: None,
        }),
    )
        .into_response()
}

/// Map a pipeline error to its HTTP response.
///
/// Backend details are only exposed when `diagnostics` is set.
pub fn error_response(err: &SubmissionError, diagnostics: bool) -> Response {
    let (status, message, retry_after_secs) = match err {
        SubmissionError::RateLimitExceeded { retry_after_secs } => {
            (StatusCode::TOO_MANY_REQUESTS, err.to_string(), Some(*retry_after_secs))
        }
        SubmissionError::DuplicateQuestion => (StatusCode::CONFLICT, err.to_string(), None),
        SubmissionError::UnsupportedQuestionType(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            detail_or(err, diagnostics, INTERNAL_ERROR_MESSAGE),
            None,
        ),
        SubmissionError::Persistence(_) => (
            StatusCode::BAD_GATEWAY,
            detail_or(err, diagnostics, PERSISTENCE_FAILED_MESSAGE),
            None,
        ),
    };

    let body = Json(ErrorResponse {
        error: message,
        code: err.code(),
        retry_after_secs,
    });

    match retry_after_secs {
        Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
        None => (status, body).into_response(),
    }
}

fn detail_or(err: &SubmissionError, diagnostics: bool, generic: &str) -> String {
    if diagnostics {
        err.to_string()
    } else {
        generic.to_string()
    }
}

/// Rate limit key for a request: the peer IP, or the first forwarded
/// address when `trust_forwarded_for` is set.
fn client_identifier(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    let forwarded = if trust_forwarded_for {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
