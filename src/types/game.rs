use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The player's up/down call for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    Up,
    Down,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Up => write!(f, "up"),
            Prediction::Down => write!(f, "down"),
        }
    }
}

/// Round duration control. Shorter windows pay more points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Length of the prediction window for this difficulty.
    pub fn window(&self) -> Duration {
        match self {
            Difficulty::Easy => Duration::minutes(5),
            Difficulty::Medium => Duration::minutes(2),
            Difficulty::Hard => Duration::minutes(1),
        }
    }

    /// Points paid for a correct prediction at this difficulty.
    pub fn points(&self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 25,
            Difficulty::Hard => 50,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// Outcome of a round. `Pending` until resolution, then terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Pending,
    Win,
    Lose,
}

/// One round of prediction play: a user, a stock, and a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub user_id: String,
    pub stock_symbol: String,
    pub start_price: f64,
    /// Set once at resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_price: Option<f64>,
    /// Set at most once, while the game is still open.
    pub prediction: Option<Prediction>,
    pub result: GameResult,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub points: u32,
}

impl Game {
    /// Create a new pending game starting now.
    pub fn new(
        user_id: String,
        stock_symbol: String,
        start_price: f64,
        difficulty: Difficulty,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            stock_symbol,
            start_price,
            end_price: None,
            prediction: None,
            result: GameResult::Pending,
            start_time,
            end_time: start_time + difficulty.window(),
            difficulty,
            points: 0,
        }
    }

    /// Whether the prediction window has closed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    /// Whether the game is still awaiting resolution.
    pub fn is_pending(&self) -> bool {
        self.result == GameResult::Pending
    }
}

/// Derived per-player statistics. Recomputed on each request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub total_games: u32,
    /// Win percentage, rounded to two decimals. Zero when no games.
    pub win_rate: f64,
    /// Consecutive wins ending at the most recent completed game.
    pub current_streak: u32,
    pub best_streak: u32,
    /// Average points across winning games. Zero when no wins.
    pub average_points: f64,
}

impl PlayerStats {
    pub fn empty() -> Self {
        Self {
            total_games: 0,
            win_rate: 0.0,
            current_streak: 0,
            best_streak: 0,
            average_points: 0.0,
        }
    }
}
