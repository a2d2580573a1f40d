//! HTTP API over the ingestion gateway.
//!
//! Thin plumbing: JSON update/value endpoints for the agent protocol,
//! plain-text path variants, an HTML listing of current values, and a
//! durable-backend health probe.

use crate::core::{MetricKind, MetricUpdate, MetrondError};
use crate::gateway::IngestionGateway;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<IngestionGateway>,
}

/// Build the router over a gateway.
pub fn create_router(gateway: Arc<IngestionGateway>) -> Router {
    let state = ApiState { gateway };

    Router::new()
        .route("/", get(list_handler))
        .route("/ping", get(ping_handler))
        .route("/update/", post(update_handler))
        .route("/updates/", post(updates_handler))
        .route("/value/", post(value_handler))
        .route("/update/:kind/:name/:value", post(update_path_handler))
        .route("/value/:kind/:name", get(value_path_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// POST /update/ - apply one JSON metric update.
async fn update_handler(
    State(state): State<ApiState>,
    Json(update): Json<MetricUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.apply(&update).await?;
    Ok(StatusCode::OK)
}

/// POST /updates/ - apply a JSON batch of metric updates.
async fn updates_handler(
    State(state): State<ApiState>,
    Json(updates): Json<Vec<MetricUpdate>>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.apply_batch(&updates).await?;
    Ok(StatusCode::OK)
}

/// POST /value/ - fetch the current value for `{id, type}`.
async fn value_handler(
    State(state): State<ApiState>,
    Json(query): Json<MetricUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let value = state.gateway.value(&query.id, &query.kind)?;
    Ok(Json(value))
}

/// POST /update/{type}/{name}/{value} - plain-text update path.
async fn update_path_handler(
    State(state): State<ApiState>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let update = match MetricKind::from_str(&kind)? {
        MetricKind::Gauge => {
            let value: f64 = value.parse().map_err(|_| {
                MetrondError::validation(format!("value {} not acceptable for '{}'", value, name))
            })?;
            MetricUpdate::gauge(name, value)
        },
        MetricKind::Counter => {
            let delta: i64 = value.parse().map_err(|_| {
                MetrondError::validation(format!("value {} not acceptable for '{}'", value, name))
            })?;
            MetricUpdate::counter(name, delta)
        },
    };

    state.gateway.apply(&update).await?;
    Ok(StatusCode::OK)
}

/// GET /value/{type}/{name} - plain-text value fetch.
async fn value_path_handler(
    State(state): State<ApiState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let value = state.gateway.value(&name, &kind)?;
    let body = match MetricKind::from_str(&kind)? {
        MetricKind::Gauge => value.value.unwrap_or_default().to_string(),
        MetricKind::Counter => value.delta.unwrap_or_default().to_string(),
    };
    Ok(body)
}

/// GET / - HTML listing of all current metrics, sorted by name.
async fn list_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.gateway.snapshot();

    let mut gauges: Vec<_> = snapshot.gauges.into_iter().collect();
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    let mut counters: Vec<_> = snapshot.counters.into_iter().collect();
    counters.sort_by(|a, b| a.0.cmp(&b.0));

    let mut body = String::from("<h1>Current metrics data:</h1>");
    body.push_str("<div><h2>Gauges</h2>");
    for (name, value) in gauges {
        body.push_str(&format!("<div>{} - {}</div>", name, value));
    }
    body.push_str("</div><div><h2>Counters</h2>");
    for (name, value) in counters {
        body.push_str(&format!("<div>{} - {}</div>", name, value));
    }
    body.push_str("</div>");

    Html(body)
}

/// GET /ping - durable backend health probe.
async fn ping_handler(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    state.gateway.ping().await?;
    Ok(StatusCode::OK)
}

/// HTTP error wrapper mapping the engine taxonomy to status codes.
#[derive(Debug)]
pub struct ApiError(MetrondError);

impl From<MetrondError> for ApiError {
    fn from(err: MetrondError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MetrondError::Validation(_) | MetrondError::Integrity(_) => StatusCode::BAD_REQUEST,
            MetrondError::UnsupportedKind(_) => StatusCode::NOT_IMPLEMENTED,
            MetrondError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(category = self.0.category(), error = %self.0, "request failed");
        } else {
            tracing::debug!(category = self.0.category(), error = %self.0, "request rejected");
        }

        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}
