//! Historical tick retrieval handler

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use common::error::Error;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;

/// History query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoryQuery {
    /// Lookback window in hours
    #[serde(default = "default_hours")]
    pub hours: f64,
}

fn default_hours() -> f64 {
    1.0
}

/// Get synthesized tick history for an instrument
///
/// Feed problems are reported in the body rather than as a 5xx, so
/// chart frontends can render the empty state without special casing.
#[utoipa::path(
    get,
    path = "/history/{symbol}",
    params(
        ("symbol" = String, Path, description = "Instrument symbol"),
        ("hours" = Option<f64>, Query, description = "Lookback window in hours, clamped to [0.1, 24]")
    ),
    responses(
        (status = 200, description = "Tick history, or an in-band error for feed problems")
    ),
    tag = "history"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let hours = query.hours.clamp(0.1, 24.0);
    match state.history.convert(&symbol, hours).await {
        Ok(ticks) => Ok(Json(json!({
            "symbol": symbol.to_uppercase(),
            "hours": hours,
            "count": ticks.len(),
            "ticks": ticks,
        }))),
        Err(
            e @ (Error::FeedUnavailable
            | Error::FeedAuth(_)
            | Error::SymbolUnsupported(_)
            | Error::Transport(_)),
        ) => {
            warn!("history request for {} failed: {}", symbol, e);
            Ok(Json(json!({
                "error": e.to_string(),
                "ticks": [],
                "count": 0,
            })))
        }
        Err(e) => Err(ApiError::Common(e)),
    }
}
