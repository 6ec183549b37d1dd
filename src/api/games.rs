use super::{ApiMeta, ApiResponse, AppState};
use crate::error::Result;
use crate::types::{Difficulty, Game, PlayerStats, Prediction};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Request body for starting a game.
#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    pub difficulty: Difficulty,
}

/// Request body for submitting a prediction.
#[derive(Debug, Deserialize)]
pub struct PredictionRequest {
    pub prediction: Prediction,
}

/// Response for a resolution sweep.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: usize,
}

/// POST /api/games
async fn start_game(
    State(state): State<AppState>,
    Json(request): Json<StartGameRequest>,
) -> Result<Json<ApiResponse<Game>>> {
    let user_id = state.auth.current_user_id();
    let game = state.games.start_game(user_id, request.difficulty).await?;
    Ok(Json(ApiResponse {
        data: game,
        meta: ApiMeta::simple(),
    }))
}

/// GET /api/games/:id
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Game>>> {
    let game = state.games.get(&id).await?;
    Ok(Json(ApiResponse {
        data: game,
        meta: ApiMeta::simple(),
    }))
}

/// POST /api/games/:id/prediction
async fn make_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<ApiResponse<Game>>> {
    let game = state.games.make_prediction(&id, request.prediction).await?;
    Ok(Json(ApiResponse {
        data: game,
        meta: ApiMeta::simple(),
    }))
}

/// POST /api/games/resolve
///
/// Manual trigger for the resolution sweep; the server also runs it on a
/// timer.
async fn resolve_due(State(state): State<AppState>) -> Result<Json<ApiResponse<ResolveResponse>>> {
    let resolved = state.games.resolve_due_games().await?;
    Ok(Json(ApiResponse {
        data: ResolveResponse { resolved },
        meta: ApiMeta::simple(),
    }))
}

/// GET /api/stats
pub async fn player_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PlayerStats>>> {
    let user_id = state.auth.current_user_id();
    let stats = state.stats.player_stats(user_id).await?;
    Ok(Json(ApiResponse {
        data: stats,
        meta: ApiMeta::simple(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_game))
        .route("/resolve", post(resolve_due))
        .route("/:id", get(get_game))
        .route("/:id/prediction", post(make_prediction))
}
