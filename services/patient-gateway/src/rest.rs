// REST ingress for patient records
// GET/POST/PUT/PATCH on /patient map onto query/add/replace/update transactions

use crate::error::GatewayError;
use crate::metrics::METRICS;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dispatch_core::{Operation, OperationResolver, TransactionOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub ledger_session: bool,
    pub events_enabled: bool,
    pub active_subscriptions: usize,
}

#[derive(Debug, Deserialize)]
pub struct PatientQuery {
    pub id: Option<String>,
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route(
            "/patient",
            get(query_patient)
                .post(add_patient)
                .put(replace_patient)
                .patch(update_patient),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// Health check endpoint; reaching it at all means the ledger session exists
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let active_subscriptions = state
        .events
        .as_ref()
        .map(|events| events.active_subscriptions())
        .unwrap_or(0);
    let events_enabled = state.events.is_some();

    Json(HealthResponse {
        status: if events_enabled && active_subscriptions == 0 {
            "degraded"
        } else {
            "ready"
        },
        service: "patient-gateway",
        version: env!("CARGO_PKG_VERSION"),
        ledger_session: true,
        events_enabled,
        active_subscriptions,
    })
}

// Prometheus metrics endpoint
async fn metrics_handler() -> Result<String, GatewayError> {
    METRICS
        .export()
        .map_err(|e| GatewayError::Internal(format!("Failed to export metrics: {}", e)))
}

async fn query_patient(
    State(state): State<AppState>,
    Query(query): Query<PatientQuery>,
) -> Response {
    let id = match query.id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return reject_early("GET", "missing required query parameter: id"),
    };

    dispatch(&state, "GET", vec![Value::String(id)]).await
}

async fn add_patient(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    with_record(&state, "POST", body).await
}

async fn replace_patient(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    with_record(&state, "PUT", body).await
}

async fn update_patient(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    with_record(&state, "PATCH", body).await
}

async fn with_record(
    state: &AppState,
    method: &'static str,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    match record_arguments(body) {
        Ok(arguments) => dispatch(state, method, arguments).await,
        Err(message) => reject_early(method, &message),
    }
}

/// Arguments for a record-carrying request: `[record.id, record]`
pub fn record_arguments(body: Result<Json<Value>, JsonRejection>) -> Result<Vec<Value>, String> {
    let Json(record) = body.map_err(|e| e.body_text())?;

    let id = match &record {
        Value::Object(fields) => fields.get("id").filter(|id| !id.is_null()).cloned(),
        _ => return Err("request body must be a JSON object".to_string()),
    };
    let id = id.ok_or_else(|| "request body is missing the id field".to_string())?;

    Ok(vec![id, record])
}

/// Map a transaction outcome onto an HTTP response
pub fn outcome_response(outcome: TransactionOutcome) -> Response {
    match outcome {
        TransactionOutcome::Success(Some(payload)) => (StatusCode::OK, Json(payload)).into_response(),
        TransactionOutcome::Success(None) => StatusCode::OK.into_response(),
        TransactionOutcome::RequestError(msg) => GatewayError::Rejected(msg).into_response(),
        TransactionOutcome::TransportError(msg) => GatewayError::Internal(msg).into_response(),
    }
}

async fn dispatch(state: &AppState, method: &'static str, arguments: Vec<Value>) -> Response {
    let start = Instant::now();

    let operation = match OperationResolver::resolve_method(method) {
        Some(op) => op,
        None => {
            return GatewayError::Internal(format!("no operation for method {}", method))
                .into_response()
        }
    };

    // Accepted submissions run to completion even if the client goes away
    let submitter = state.submitter.clone();
    let submission = tokio::spawn(async move {
        METRICS.http_requests_in_flight.inc();
        let outcome = submitter.submit_values(operation, &arguments).await;
        METRICS.http_requests_in_flight.dec();
        outcome
    });

    let outcome = match submission.await {
        Ok(outcome) => outcome,
        Err(e) => TransactionOutcome::TransportError(format!("submission task failed: {}", e)),
    };

    log_outcome(method, operation, &outcome);
    let response = outcome_response(outcome);

    METRICS.track_request(
        method,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

fn log_outcome(method: &str, operation: Operation, outcome: &TransactionOutcome) {
    match outcome {
        TransactionOutcome::Success(_) => {
            info!("{} /patient: {} succeeded", method, operation.function_name())
        }
        TransactionOutcome::RequestError(msg) => {
            warn!("{} /patient: {} rejected: {}", method, operation.function_name(), msg)
        }
        TransactionOutcome::TransportError(msg) => {
            error!("{} /patient: {} failed: {}", method, operation.function_name(), msg)
        }
    }
}

fn reject_early(method: &str, message: &str) -> Response {
    warn!("{} /patient: bad request: {}", method, message);
    let response = GatewayError::BadRequest(message.to_string()).into_response();
    METRICS.track_request(method, response.status().as_u16(), 0.0);
    response
}
