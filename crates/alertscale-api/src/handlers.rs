//! HTTP handlers.
//!
//! The alert webhook answers in plain text, as Alertmanager only looks at
//! the status code. Registry handlers answer with the JSON envelope.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use alertscale_autoscale::format_errors;
use alertscale_core::{PrometheusAlert, get_namespace};
use alertscale_state::{FunctionReplicas, function_key};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Alerts ─────────────────────────────────────────────────────

/// POST /system/alert
///
/// 200 when every alert was applied or skipped, 500 with one
/// `[index] message` line per failed write otherwise.
pub async fn handle_alert(State(state): State<ApiState>, body: Bytes) -> Response {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "A body is required for this endpoint",
        )
            .into_response();
    }

    let req: PrometheusAlert = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "unable to parse alert");
            return (StatusCode::BAD_REQUEST, "Unable to parse alert, bad format.").into_response();
        }
    };

    info!(
        receiver = %req.receiver,
        status = %req.status,
        alerts = req.alerts.len(),
        "alert received"
    );

    let errors = state.autoscaler.handle_alerts(&req.alerts);
    if errors.is_empty() {
        return StatusCode::OK.into_response();
    }

    warn!(failed = errors.len(), "alert batch finished with errors");
    (StatusCode::INTERNAL_SERVER_ERROR, format_errors(&errors)).into_response()
}

// ── Functions ──────────────────────────────────────────────────

#[derive(Debug, Default, serde::Deserialize)]
pub struct ListQuery {
    pub namespace: Option<String>,
}

/// GET /system/functions
pub async fn list_functions(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let result = match query.namespace.as_deref() {
        Some(ns) => state.store.list_functions_in_namespace(ns),
        None => state.store.list_functions(),
    };
    match result {
        Ok(functions) => ApiResponse::ok(functions).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /system/functions
///
/// An empty namespace is filled with the default namespace.
pub async fn register_function(
    State(state): State<ApiState>,
    Json(mut record): Json<FunctionReplicas>,
) -> impl IntoResponse {
    if record.namespace.is_empty() {
        record.namespace = state.autoscaler.default_namespace().to_string();
    }

    if let Err(e) = record.validate() {
        return error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    match state.store.put_function(&record) {
        Ok(()) => {
            info!(function = %record.qualified_name(), replicas = record.replicas, "function registered");
            (StatusCode::CREATED, ApiResponse::ok(record)).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /system/function/{name}
pub async fn get_function(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let key = resolve_key(&state, &name);
    match state.store.get_function(&key) {
        Ok(Some(record)) => ApiResponse::ok(record).into_response(),
        Ok(None) => error_response("function not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// DELETE /system/function/{name}
pub async fn delete_function(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let key = resolve_key(&state, &name);
    match state.store.delete_function(&key) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("function not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

fn resolve_key(state: &ApiState, qualified_name: &str) -> String {
    let (name, namespace) = get_namespace(state.autoscaler.default_namespace(), qualified_name);
    function_key(&name, &namespace)
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let functions = state.store.list_functions().unwrap_or_else(|e| {
        warn!(error = %e, "unable to list functions for metrics");
        Vec::new()
    });
    let counters = state.autoscaler.metrics().snapshot();

    let body = alertscale_metrics::render_prometheus(&counters, &functions);
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
