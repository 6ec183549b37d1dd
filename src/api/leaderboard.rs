use super::{ApiMeta, ApiResponse, AppState};
use crate::error::Result;
use crate::types::LeaderboardEntry;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Query params for the leaderboard endpoint.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// GET /api/leaderboard
async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let limit = query.limit.clamp(1, 100);
    let entries = state.leaderboard.top(limit).await?;
    Ok(Json(ApiResponse {
        data: entries,
        meta: ApiMeta::simple(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_leaderboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_query_default_limit() {
        let query: LeaderboardQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_leaderboard_query_with_limit() {
        let query: LeaderboardQuery = serde_json::from_str(r#"{"limit": 25}"#).unwrap();
        assert_eq!(query.limit, 25);
    }
}
