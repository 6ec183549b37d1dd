//! Stats Aggregator
//!
//! Folds a user's completed games into win rate, streaks, and average
//! points. Streaks depend on play order, and the backend's fetch order is
//! unspecified, so games are sorted by end time before the fold. Every
//! value is recomputed from source data on each call; nothing is cached.

use crate::error::Result;
use crate::store::{DocumentStore, Query};
use crate::types::{Game, GameResult, PlayerStats};
use std::sync::Arc;

/// Fold completed games (in end-time order) into player statistics.
pub fn fold_stats(games: &[Game]) -> PlayerStats {
    let mut total_games = 0u32;
    let mut wins = 0u32;
    let mut current_streak = 0u32;
    let mut best_streak = 0u32;
    let mut win_points = 0u64;

    for game in games {
        total_games += 1;
        if game.result == GameResult::Win {
            wins += 1;
            current_streak += 1;
            best_streak = best_streak.max(current_streak);
            win_points += game.points as u64;
        } else {
            current_streak = 0;
        }
    }

    let win_rate = if total_games > 0 {
        round2(wins as f64 / total_games as f64 * 100.0)
    } else {
        0.0
    };
    let average_points = if wins > 0 {
        win_points as f64 / wins as f64
    } else {
        0.0
    };

    PlayerStats {
        total_games,
        win_rate,
        current_streak,
        best_streak,
        average_points,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Service computing statistics over the games collection.
pub struct StatsService<S> {
    store: Arc<S>,
    games_collection: String,
}

impl<S: DocumentStore> StatsService<S> {
    pub fn new(store: Arc<S>, games_collection: String) -> Self {
        Self {
            store,
            games_collection,
        }
    }

    /// Statistics over the user's completed (non-pending) games.
    pub async fn player_stats(&self, user_id: &str) -> Result<PlayerStats> {
        let docs = self
            .store
            .list(
                &self.games_collection,
                &[
                    Query::equal("userId", user_id),
                    Query::not_equal("result", "pending"),
                ],
            )
            .await?;

        let mut games = docs
            .iter()
            .map(|doc| doc.to::<Game>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        games.sort_by_key(|game| game.end_time);
        Ok(fold_stats(&games))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Difficulty, Prediction};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn completed_game(result: GameResult, points: u32, minutes_ago: i64) -> Game {
        let start = Utc::now() - Duration::minutes(minutes_ago + 5);
        let mut game = Game::new(
            "u1".to_string(),
            "AAPL".to_string(),
            150.0,
            Difficulty::Easy,
            start,
        );
        game.end_time = Utc::now() - Duration::minutes(minutes_ago);
        game.prediction = Some(Prediction::Up);
        game.end_price = Some(151.0);
        game.result = result;
        game.points = points;
        game
    }

    #[test]
    fn test_fold_over_empty_list_is_all_zero() {
        let stats = fold_stats(&[]);
        assert_eq!(stats, PlayerStats::empty());
    }

    #[test]
    fn test_fold_win_win_lose() {
        let games = vec![
            completed_game(GameResult::Win, 10, 30),
            completed_game(GameResult::Win, 20, 20),
            completed_game(GameResult::Lose, 0, 10),
        ];

        let stats = fold_stats(&games);
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.win_rate, 66.67);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 2);
        // Averaged over wins only
        assert_eq!(stats.average_points, 15.0);
    }

    #[test]
    fn test_fold_all_wins() {
        let games = vec![
            completed_game(GameResult::Win, 10, 30),
            completed_game(GameResult::Win, 25, 20),
            completed_game(GameResult::Win, 50, 10),
        ];

        let stats = fold_stats(&games);
        assert_eq!(stats.win_rate, 100.0);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.best_streak, 3);
        assert!((stats.average_points - 85.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_fold_streak_ends_at_most_recent_game() {
        let games = vec![
            completed_game(GameResult::Lose, 0, 40),
            completed_game(GameResult::Win, 10, 30),
            completed_game(GameResult::Lose, 0, 20),
            completed_game(GameResult::Win, 10, 10),
            completed_game(GameResult::Win, 10, 5),
        ];

        let stats = fold_stats(&games);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.best_streak, 2);
    }

    async fn insert_games(store: &MemoryStore, games: &[Game]) {
        for game in games {
            store
                .create("games", &game.id, serde_json::to_value(game).unwrap())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_player_stats_empty_store() {
        let service = StatsService::new(Arc::new(MemoryStore::new()), "games".to_string());
        let stats = service.player_stats("u1").await.unwrap();
        assert_eq!(stats, PlayerStats::empty());
    }

    #[tokio::test]
    async fn test_player_stats_sorts_by_end_time_before_folding() {
        let store = Arc::new(MemoryStore::new());
        // Insert newest-first; the fold must still see end-time order
        let games = vec![
            completed_game(GameResult::Lose, 0, 10),
            completed_game(GameResult::Win, 20, 20),
            completed_game(GameResult::Win, 10, 30),
        ];
        insert_games(&store, &games).await;

        let service = StatsService::new(store, "games".to_string());
        let stats = service.player_stats("u1").await.unwrap();

        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.best_streak, 2);
        // The loss is the most recent game, so the running streak is over
        assert_eq!(stats.current_streak, 0);
    }

    #[tokio::test]
    async fn test_player_stats_ignores_pending_and_other_users() {
        let store = Arc::new(MemoryStore::new());
        insert_games(&store, &[completed_game(GameResult::Win, 10, 10)]).await;

        // A pending game for the same user
        let pending = Game::new(
            "u1".to_string(),
            "AAPL".to_string(),
            150.0,
            Difficulty::Easy,
            Utc::now(),
        );
        store
            .create("games", &pending.id, serde_json::to_value(&pending).unwrap())
            .await
            .unwrap();

        // A completed game for someone else
        store
            .create(
                "games",
                "other",
                json!({
                    "id": "other",
                    "userId": "u2",
                    "stockSymbol": "TSLA",
                    "startPrice": 900.0,
                    "endPrice": 901.0,
                    "prediction": "up",
                    "result": "win",
                    "startTime": Utc::now(),
                    "endTime": Utc::now(),
                    "difficulty": "easy",
                    "points": 10
                }),
            )
            .await
            .unwrap();

        let service = StatsService::new(store, "games".to_string());
        let stats = service.player_stats("u1").await.unwrap();
        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.win_rate, 100.0);
    }
}
