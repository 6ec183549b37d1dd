//! End-to-end game flow tests against the in-memory store.
//!
//! Covers the full round lifecycle: seeding, starting a game, the single
//! prediction, resolution, and the derived stats and leaderboard.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use stocksense::config::CollectionsConfig;
use stocksense::services::{GameService, LeaderboardService, StatsService, StockService};
use stocksense::store::{DocumentStore, MemoryStore, StoreError, UpdateGuard};
use stocksense::types::{Difficulty, GameResult, Prediction};

struct World {
    store: Arc<MemoryStore>,
    stocks: Arc<StockService<MemoryStore>>,
    games: GameService<MemoryStore>,
    stats: StatsService<MemoryStore>,
    leaderboard: Arc<LeaderboardService<MemoryStore>>,
}

async fn world() -> World {
    let store = Arc::new(MemoryStore::new());
    let collections = CollectionsConfig::default();
    let stocks = Arc::new(StockService::new(store.clone(), collections.stocks.clone()));
    let leaderboard = Arc::new(LeaderboardService::new(
        store.clone(),
        collections.leaderboard.clone(),
    ));
    let games = GameService::new(
        store.clone(),
        stocks.clone(),
        leaderboard.clone(),
        &collections,
    );
    let stats = StatsService::new(store.clone(), collections.games.clone());

    stocks.seed_defaults().await.unwrap();

    World {
        store,
        stocks,
        games,
        stats,
        leaderboard,
    }
}

impl World {
    /// Close a game's window, backdating its end so stats see the rounds
    /// in play order.
    async fn expire(&self, game_id: &str, seconds_ago: i64) {
        self.store
            .update(
                "games",
                game_id,
                json!({ "endTime": Utc::now() - Duration::seconds(seconds_ago) }),
                UpdateGuard::None,
            )
            .await
            .unwrap();
    }

    /// Play one full round with a forced outcome.
    async fn play_round(
        &self,
        user_id: &str,
        difficulty: Difficulty,
        prediction: Prediction,
        price_move: f64,
        ended_seconds_ago: i64,
    ) -> stocksense::types::Game {
        let game = self.games.start_game(user_id, difficulty).await.unwrap();
        self.games
            .make_prediction(&game.id, prediction)
            .await
            .unwrap();

        self.stocks
            .update_price(&game.stock_symbol, game.start_price + price_move)
            .await
            .unwrap();
        self.expire(&game.id, ended_seconds_ago).await;

        let game = self.games.get(&game.id).await.unwrap();
        self.games.resolve_game(&game).await.unwrap()
    }
}

// =============================================================================
// Full Round Tests
// =============================================================================

#[tokio::test]
async fn test_single_winning_round() {
    let world = world().await;

    let resolved = world
        .play_round("player", Difficulty::Easy, Prediction::Up, 5.0, 1)
        .await;

    assert_eq!(resolved.result, GameResult::Win);
    assert_eq!(resolved.points, 10);
    assert!(resolved.end_price.unwrap() > resolved.start_price);

    let stats = world.stats.player_stats("player").await.unwrap();
    assert_eq!(stats.total_games, 1);
    assert_eq!(stats.win_rate, 100.0);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.average_points, 10.0);
}

#[tokio::test]
async fn test_three_round_session_stats_and_leaderboard() {
    let world = world().await;

    // Two wins then a loss, in play order
    world
        .play_round("player", Difficulty::Easy, Prediction::Up, 2.0, 30)
        .await;
    world
        .play_round("player", Difficulty::Medium, Prediction::Down, -3.0, 20)
        .await;
    world
        .play_round("player", Difficulty::Hard, Prediction::Up, -1.0, 10)
        .await;

    let stats = world.stats.player_stats("player").await.unwrap();
    assert_eq!(stats.total_games, 3);
    assert_eq!(stats.win_rate, 66.67);
    assert_eq!(stats.best_streak, 2);
    assert_eq!(stats.current_streak, 0);
    // (10 + 25) points over 2 wins
    assert_eq!(stats.average_points, 17.5);

    let top = world.leaderboard.top(10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].user_id, "player");
    assert_eq!(top[0].total_score, 35);
    assert_eq!(top[0].win_streak, 0);
    assert_eq!(top[0].rank, 1);

    // Cumulative score also lands on the user document
    let user = world.store.get("users", "player").await.unwrap();
    assert_eq!(user.data["score"], 35);
}

#[tokio::test]
async fn test_two_players_ranked_by_score() {
    let world = world().await;

    world
        .play_round("alice", Difficulty::Hard, Prediction::Up, 4.0, 20)
        .await;
    world
        .play_round("bob", Difficulty::Easy, Prediction::Up, 4.0, 10)
        .await;

    let top = world.leaderboard.top(10).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].user_id, "alice"); // 50 points
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[1].user_id, "bob"); // 10 points
    assert_eq!(top[1].rank, 2);
}

// =============================================================================
// State Machine Guard Tests
// =============================================================================

#[tokio::test]
async fn test_prediction_is_immutable_once_set() {
    let world = world().await;
    let game = world
        .games
        .start_game("player", Difficulty::Easy)
        .await
        .unwrap();

    world
        .games
        .make_prediction(&game.id, Prediction::Down)
        .await
        .unwrap();

    let err = world
        .games
        .make_prediction(&game.id, Prediction::Up)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        stocksense::error::AppError::Store(StoreError::Conflict(_))
    ));

    let game = world.games.get(&game.id).await.unwrap();
    assert_eq!(game.prediction, Some(Prediction::Down));
}

#[tokio::test]
async fn test_result_transition_is_terminal() {
    let world = world().await;
    let resolved = world
        .play_round("player", Difficulty::Easy, Prediction::Up, 1.0, 1)
        .await;

    // A second resolution attempt loses against the guard
    let err = world.games.resolve_game(&resolved).await.unwrap_err();
    assert!(matches!(
        err,
        stocksense::error::AppError::Store(StoreError::Conflict(_))
    ));

    let game = world.games.get(&resolved.id).await.unwrap();
    assert_eq!(game.result, GameResult::Win);
    assert_eq!(game.points, resolved.points);
}

#[tokio::test]
async fn test_sweeper_resolves_unpredicted_game_as_loss() {
    let world = world().await;

    let game = world
        .games
        .start_game("player", Difficulty::Medium)
        .await
        .unwrap();
    world.expire(&game.id, 1).await;

    let resolved = world.games.resolve_due_games().await.unwrap();
    assert_eq!(resolved, 1);

    let game = world.games.get(&game.id).await.unwrap();
    assert_eq!(game.result, GameResult::Lose);
    assert_eq!(game.points, 0);

    let stats = world.stats.player_stats("player").await.unwrap();
    assert_eq!(stats.total_games, 1);
    assert_eq!(stats.win_rate, 0.0);
}

// =============================================================================
// Realtime Feed Tests
// =============================================================================

#[tokio::test]
async fn test_price_writes_reach_subscribers() {
    let world = world().await;
    let mut rx = world.stocks.subscribe_events();

    world.stocks.update_price("AAPL", 152.75).await.unwrap();

    let mut saw_update = false;
    while let Ok(event) = rx.try_recv() {
        if let Some(update) = StockService::<MemoryStore>::price_update_from_event(&event) {
            if update.symbol == "AAPL" && update.price == 152.75 {
                saw_update = true;
            }
        }
    }
    assert!(saw_update);
}
