use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Starting virtual currency balance for new players.
pub const STARTING_CURRENCY: i64 = 1000;

/// A player account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Cumulative score across all resolved games.
    pub score: i64,
    pub virtual_currency: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            virtual_currency: STARTING_CURRENCY,
            created_at: Utc::now(),
        }
    }
}

/// Denormalized per-user standing. `rank` is derived on read and never
/// trusted from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub user_name: String,
    pub total_score: i64,
    /// The user's current run of consecutive wins.
    pub win_streak: u32,
    #[serde(default)]
    pub rank: u32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("user-1".to_string(), "Alice".to_string());
        assert_eq!(user.score, 0);
        assert_eq!(user.virtual_currency, STARTING_CURRENCY);
    }

    #[test]
    fn test_user_serialization_field_names() {
        let user = User::new("user-1".to_string(), "Alice".to_string());
        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("\"virtualCurrency\":1000"));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn test_leaderboard_entry_serialization() {
        let entry = LeaderboardEntry {
            user_id: "user-1".to_string(),
            user_name: "Alice".to_string(),
            total_score: 120,
            win_streak: 3,
            rank: 1,
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"totalScore\":120"));
        assert!(json.contains("\"winStreak\":3"));
        assert!(json.contains("\"rank\":1"));
    }

    #[test]
    fn test_leaderboard_entry_rank_defaults_to_zero() {
        let json = r#"{
            "userId": "user-2",
            "userName": "Bob",
            "totalScore": 50,
            "winStreak": 1,
            "updatedAt": "2026-01-01T00:00:00Z"
        }"#;

        let entry: LeaderboardEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.rank, 0);
    }
}
