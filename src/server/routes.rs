use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::MonitorError;
use crate::models::{QuoteRecord, Symbol};
use crate::monitor::{ActiveMonitor, QuoteMonitor};

/// Error body returned by every handler
pub struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MonitorError::Validation(_) => StatusCode::BAD_REQUEST,
            MonitorError::NotFound(_) => StatusCode::NOT_FOUND,
            MonitorError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            MonitorError::Fetch(e) => {
                warn!("Quote fetch failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SymbolRequest {
    symbol: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StartMonitoringRequest {
    symbol: Option<Value>,
    minutes: Option<Value>,
    seconds: Option<Value>,
}

/// Build the HTTP router
pub fn create_router(monitor: Arc<QuoteMonitor>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/history", get(history))
        .route("/refresh", post(refresh))
        .route("/start-monitoring", post(start_monitoring))
        .route("/stop-monitoring", post(stop_monitoring))
        .route("/monitoring", get(active_monitors))
        .layer(TraceLayer::new_for_http())
        .with_state(monitor)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "SCE Stock Exchange API" }))
}

/// GET /history?symbol=AAPL
async fn history(
    State(monitor): State<Arc<QuoteMonitor>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<QuoteRecord>> {
    let symbol = query
        .symbol
        .as_deref()
        .and_then(|raw| Symbol::parse(raw).ok())
        .ok_or_else(|| MonitorError::Validation("Invalid symbol".to_string()))?;

    Ok(Json(monitor.get_history(&symbol).await))
}

/// POST /refresh { "symbol": "AAPL" }
async fn refresh(
    State(monitor): State<Arc<QuoteMonitor>>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult<QuoteRecord> {
    let symbol = parse_symbol(request.symbol.as_ref())?;
    Ok(Json(monitor.refresh(&symbol).await?))
}

/// POST /start-monitoring { "symbol": "AAPL", "minutes": 0, "seconds": 10 }
async fn start_monitoring(
    State(monitor): State<Arc<QuoteMonitor>>,
    Json(request): Json<StartMonitoringRequest>,
) -> ApiResult<Value> {
    let symbol = parse_symbol(request.symbol.as_ref())?;

    let minutes = non_negative_integer(request.minutes.as_ref()).ok_or_else(|| {
        MonitorError::Validation("minutes must be a non-negative integer".to_string())
    })?;
    let seconds = non_negative_integer(request.seconds.as_ref()).ok_or_else(|| {
        MonitorError::Validation("seconds must be a non-negative integer".to_string())
    })?;

    let interval_secs = minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(|| MonitorError::Validation("refresh interval is too large".to_string()))?;
    if interval_secs == 0 {
        return Err(MonitorError::Validation(
            "refresh interval must be greater than 0".to_string(),
        )
        .into());
    }

    let started = monitor
        .start_monitoring(&symbol, Duration::from_secs(interval_secs))
        .await?;

    Ok(Json(json!({
        "message": format!("Started monitoring {}", started.symbol),
        "intervalMs": started.interval_ms,
        "firstRecord": started.first_record,
    })))
}

/// POST /stop-monitoring { "symbol": "AAPL" }
async fn stop_monitoring(
    State(monitor): State<Arc<QuoteMonitor>>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult<Value> {
    let symbol = parse_symbol(request.symbol.as_ref())?;
    monitor.stop_monitoring(&symbol).await?;

    Ok(Json(json!({ "message": format!("Stopped monitoring {}", symbol) })))
}

/// GET /monitoring
async fn active_monitors(State(monitor): State<Arc<QuoteMonitor>>) -> Json<Vec<ActiveMonitor>> {
    Json(monitor.active_monitors().await)
}

fn parse_symbol(value: Option<&Value>) -> Result<Symbol, MonitorError> {
    match value {
        Some(Value::String(raw)) => Symbol::parse(raw),
        _ => Err(MonitorError::Validation(
            "symbol must be a non-empty string".to_string(),
        )),
    }
}

/// Accept JSON integers and numeric strings, like the web client sends
fn non_negative_integer(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
