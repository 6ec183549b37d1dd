use super::{ApiMeta, ApiResponse, AppState};
use crate::error::Result;
use crate::types::Stock;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

/// Response for watch/unwatch calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub symbol: String,
    pub watching: bool,
}

/// GET /api/stocks
async fn list_stocks(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Stock>>>> {
    let stocks = state.stocks.list().await?;
    Ok(Json(ApiResponse {
        data: stocks,
        meta: ApiMeta::simple(),
    }))
}

/// GET /api/stocks/:symbol
async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<Stock>>> {
    let stock = state.stocks.get(&symbol).await?;
    Ok(Json(ApiResponse {
        data: stock,
        meta: ApiMeta::simple(),
    }))
}

/// POST /api/stocks/:symbol/watch
///
/// Starts the price update loop for a stock. Idempotent.
async fn watch_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<WatchResponse>>> {
    let stock = state.stocks.get(&symbol).await?;
    state.price_feed.start(&stock.symbol, stock.current_price);

    Ok(Json(ApiResponse {
        data: WatchResponse {
            symbol: stock.symbol,
            watching: true,
        },
        meta: ApiMeta::simple(),
    }))
}

/// DELETE /api/stocks/:symbol/watch
///
/// Stops the price update loop for a stock. No-op when untracked.
async fn unwatch_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<WatchResponse>>> {
    state.price_feed.stop(&symbol);

    Ok(Json(ApiResponse {
        data: WatchResponse {
            symbol: symbol.to_uppercase(),
            watching: false,
        },
        meta: ApiMeta::simple(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stocks))
        .route("/:symbol", get(get_stock))
        .route("/:symbol/watch", post(watch_stock).delete(unwatch_stock))
}
