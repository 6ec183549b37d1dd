//! Game Lifecycle
//!
//! Starts rounds, accepts the single prediction, and resolves games whose
//! window has closed. State transitions (prediction set-once, result
//! pending-to-terminal) are enforced with storage-layer update guards so
//! concurrent writers lose with a conflict instead of racing.

use crate::config::CollectionsConfig;
use crate::error::{AppError, Result};
use crate::services::leaderboard::LeaderboardService;
use crate::services::stocks::StockService;
use crate::store::{DocumentStore, Query, StoreError, UpdateGuard};
use crate::types::{Difficulty, Game, GameResult, Prediction, User};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Service for the games collection.
pub struct GameService<S> {
    store: Arc<S>,
    stocks: Arc<StockService<S>>,
    leaderboard: Arc<LeaderboardService<S>>,
    games_collection: String,
    users_collection: String,
}

impl<S: DocumentStore> GameService<S> {
    pub fn new(
        store: Arc<S>,
        stocks: Arc<StockService<S>>,
        leaderboard: Arc<LeaderboardService<S>>,
        collections: &CollectionsConfig,
    ) -> Self {
        Self {
            store,
            stocks,
            leaderboard,
            games_collection: collections.games.clone(),
            users_collection: collections.users.clone(),
        }
    }

    /// Start a new round for a user: a random stock, the difficulty's
    /// time window, and a pending result.
    pub async fn start_game(&self, user_id: &str, difficulty: Difficulty) -> Result<Game> {
        let stocks = self.stocks.list().await?;
        let stock = stocks
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| AppError::Internal("no stocks available".to_string()))?;

        self.ensure_user(user_id).await?;

        let game = Game::new(
            user_id.to_string(),
            stock.symbol.clone(),
            stock.current_price,
            difficulty,
            Utc::now(),
        );
        self.store
            .create(&self.games_collection, &game.id, serde_json::to_value(&game)?)
            .await?;

        info!(
            "Started {:?} game {} on {} for {}",
            difficulty, game.id, game.stock_symbol, user_id
        );
        Ok(game)
    }

    /// Fetch a game by id.
    pub async fn get(&self, game_id: &str) -> Result<Game> {
        let doc = self.store.get(&self.games_collection, game_id).await?;
        Ok(doc.to()?)
    }

    /// Record the player's call. The storage guard only lets the write
    /// through while the prediction is still unset, so a repeat attempt
    /// (or a concurrent one) fails with a conflict.
    pub async fn make_prediction(&self, game_id: &str, prediction: Prediction) -> Result<Game> {
        let game = self.get(game_id).await?;
        if game.is_expired(Utc::now()) {
            return Err(AppError::Conflict(format!(
                "game {} has already ended",
                game_id
            )));
        }

        let doc = self
            .store
            .update(
                &self.games_collection,
                game_id,
                json!({ "prediction": prediction }),
                UpdateGuard::field_is_null("prediction"),
            )
            .await?;

        info!("Prediction for game {}: {}", game_id, prediction);
        Ok(doc.to()?)
    }

    /// Resolve a game whose window has closed: read the stock's current
    /// price as the end price, compare against the prediction, and write
    /// end price, result, and points in one guarded update. The guard
    /// requires `result` to still be pending, so a game resolves at most
    /// once.
    pub async fn resolve_game(&self, game: &Game) -> Result<Game> {
        let now = Utc::now();
        if !game.is_expired(now) {
            return Err(AppError::Conflict(format!(
                "game {} has not ended yet",
                game.id
            )));
        }

        let end_price = self.stocks.current_price(&game.stock_symbol).await?;

        let correct = match game.prediction {
            Some(Prediction::Up) => end_price > game.start_price,
            Some(Prediction::Down) => end_price < game.start_price,
            // Never predicted: the round is forfeit
            None => false,
        };
        let (result, points) = if correct {
            (GameResult::Win, game.difficulty.points())
        } else {
            (GameResult::Lose, 0)
        };

        let doc = self
            .store
            .update(
                &self.games_collection,
                &game.id,
                json!({
                    "endPrice": end_price,
                    "result": result,
                    "points": points,
                }),
                UpdateGuard::field_equals("result", "pending"),
            )
            .await?;
        let resolved: Game = doc.to()?;

        info!(
            "Resolved game {}: {:?} ({} -> {}, +{} pts)",
            resolved.id, resolved.result, resolved.start_price, end_price, points
        );

        // The result is committed; standings updates are best-effort
        if let Err(e) = self.record_outcome(&resolved).await {
            warn!("Error updating standings for game {}: {}", resolved.id, e);
        }

        Ok(resolved)
    }

    /// Resolve every pending game whose end time has passed. One bad
    /// document cannot wedge the sweep; failures are logged and skipped.
    pub async fn resolve_due_games(&self) -> Result<usize> {
        let docs = self
            .store
            .list(
                &self.games_collection,
                &[Query::equal("result", "pending")],
            )
            .await?;

        let now = Utc::now();
        let mut resolved = 0;
        for doc in docs {
            let game: Game = match doc.to() {
                Ok(game) => game,
                Err(e) => {
                    warn!("Skipping malformed game {}: {}", doc.id, e);
                    continue;
                }
            };
            if !game.is_expired(now) {
                continue;
            }
            match self.resolve_game(&game).await {
                Ok(_) => resolved += 1,
                Err(e) => warn!("Error resolving game {}: {}", game.id, e),
            }
        }

        Ok(resolved)
    }

    /// Fetch the user document, creating it on first sight. Until real
    /// auth lands the name defaults to the user id.
    pub async fn ensure_user(&self, user_id: &str) -> Result<User> {
        match self.store.get(&self.users_collection, user_id).await {
            Ok(doc) => Ok(doc.to()?),
            Err(StoreError::NotFound { .. }) => {
                let user = User::new(user_id.to_string(), user_id.to_string());
                self.store
                    .create(&self.users_collection, user_id, serde_json::to_value(&user)?)
                    .await?;
                info!("Created user {}", user_id);
                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Push a resolved game into the user's cumulative score and the
    /// leaderboard.
    async fn record_outcome(&self, resolved: &Game) -> Result<()> {
        let user = self.ensure_user(&resolved.user_id).await?;
        match resolved.result {
            GameResult::Win => {
                self.store
                    .update(
                        &self.users_collection,
                        &user.id,
                        json!({ "score": user.score + resolved.points as i64 }),
                        UpdateGuard::None,
                    )
                    .await?;
                self.leaderboard
                    .record_win(&user.id, &user.name, resolved.points)
                    .await?;
            }
            GameResult::Lose => {
                self.leaderboard.record_loss(&user.id, &user.name).await?;
            }
            GameResult::Pending => {}
        }
        Ok(())
    }
}
