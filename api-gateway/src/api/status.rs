//! Service status and stream control handlers

use std::sync::Arc;

use axum::{extract::Path, extract::State, Json};
use common::model::symbol;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service status retrieved successfully")
    ),
    tag = "status"
)]
pub async fn get_root(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let status = state.manager.status();
    Ok(Json(json!({
        "service": "quote-bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": status.mode,
        "symbol": status.symbol,
        "feed_available": status.feed_available,
        "feed_connected": status.feed_connected,
        "clients": status.clients,
    })))
}

/// Health probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "status"
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let status = state.manager.status();
    Ok(Json(json!({
        "status": "ok",
        "mode": status.mode,
        "symbol": status.symbol,
        "feed_connected": status.feed_connected,
        "tick_count": status.tick_count,
    })))
}

/// List known instruments
///
/// Delegates to the live source while connected; otherwise falls back
/// to the static registry.
#[utoipa::path(
    get,
    path = "/symbols",
    responses(
        (status = 200, description = "Instrument list retrieved successfully")
    ),
    tag = "status"
)]
pub async fn get_symbols(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let feed = state.manager.feed();
    let symbols: Vec<Value> = if feed.connected() {
        feed.symbols()
            .await
            .into_iter()
            .take(100)
            .map(|s| json!({ "name": s }))
            .collect()
    } else {
        symbol::known_symbols()
            .iter()
            .map(|s| json!({ "name": s }))
            .collect()
    };
    Ok(Json(json!({ "symbols": symbols })))
}

/// Switch the streamed instrument
#[utoipa::path(
    post,
    path = "/switch_symbol/{symbol}",
    params(
        ("symbol" = String, Path, description = "Instrument to stream")
    ),
    responses(
        (status = 200, description = "Switch attempted; see the success flag"),
        (status = 400, description = "Malformed symbol")
    ),
    tag = "stream"
)]
pub async fn post_switch_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !is_valid_symbol(&symbol) {
        return Err(ApiError::BadRequest(format!("malformed symbol: {}", symbol)));
    }
    let outcome = state.manager.switch_symbol(&symbol).await;
    Ok(Json(json!({
        "success": outcome.success,
        "mode": outcome.mode,
        "symbol": outcome.symbol,
    })))
}

// Broker symbols are short alphanumerics, sometimes with a suffix
// separator such as "EURUSD.m"
fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 32
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '#'))
}

/// Tear down and retry the live feed session
#[utoipa::path(
    post,
    path = "/reconnect",
    responses(
        (status = 200, description = "Reconnect attempted; see the success flag")
    ),
    tag = "stream"
)]
pub async fn post_reconnect(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state.manager.stop_live().await;
    let symbol = state.manager.active_symbol();
    let success = state.manager.start_live(&symbol).await;
    Ok(Json(json!({
        "success": success,
        "mode": state.manager.mode(),
    })))
}

#[cfg(test)]
mod tests {
    use super::is_valid_symbol;

    #[test]
    fn accepts_broker_symbols() {
        assert!(is_valid_symbol("EURUSD"));
        assert!(is_valid_symbol("eurusd"));
        assert!(is_valid_symbol("EURUSD.m"));
        assert!(is_valid_symbol("US-100_x#1"));
    }

    #[test]
    fn rejects_malformed_symbols() {
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("EUR USD"));
        assert!(!is_valid_symbol("sym/../../etc"));
        assert!(!is_valid_symbol(&"A".repeat(33)));
    }
}
