pub mod games;
pub mod health;
pub mod leaderboard;
pub mod stocks;
pub mod stream;

use crate::config::Config;
use crate::services::{
    AuthService, GameService, LeaderboardService, PriceFeedService, StatsService, StockService,
};
use crate::store::HostedStore;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub stocks: Arc<StockService<HostedStore>>,
    pub games: Arc<GameService<HostedStore>>,
    pub stats: Arc<StatsService<HostedStore>>,
    pub leaderboard: Arc<LeaderboardService<HostedStore>>,
    pub price_feed: Arc<PriceFeedService<HostedStore>>,
}

/// API response wrapper matching client expectations.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub cached: bool,
}

impl ApiMeta {
    pub(crate) fn simple() -> Self {
        Self { cached: false }
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/stocks", stocks::router())
        .nest("/api/games", games::router())
        .nest("/api/leaderboard", leaderboard::router())
        .route("/api/stats", get(games::player_stats))
}
