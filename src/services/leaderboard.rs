//! Leaderboard Service
//!
//! Keeps the denormalized per-user standings written at game resolution.
//! Ranks are computed on read; the stored rank field is never trusted.

use crate::error::Result;
use crate::store::{DocumentStore, StoreError, UpdateGuard};
use crate::types::LeaderboardEntry;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Service for the leaderboard collection. Entries are keyed by user id.
pub struct LeaderboardService<S> {
    store: Arc<S>,
    collection: String,
}

impl<S: DocumentStore> LeaderboardService<S> {
    pub fn new(store: Arc<S>, collection: String) -> Self {
        Self { store, collection }
    }

    /// Record a won game: add its points and extend the win streak.
    pub async fn record_win(&self, user_id: &str, user_name: &str, points: u32) -> Result<()> {
        match self.store.get(&self.collection, user_id).await {
            Ok(doc) => {
                let entry: LeaderboardEntry = doc.to()?;
                let patch = json!({
                    "totalScore": entry.total_score + points as i64,
                    "winStreak": entry.win_streak + 1,
                    "updatedAt": Utc::now(),
                });
                self.store
                    .update(&self.collection, user_id, patch, UpdateGuard::None)
                    .await?;
            }
            Err(StoreError::NotFound { .. }) => {
                self.create_entry(user_id, user_name, points as i64, 1).await?;
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Recorded win for {} (+{} pts)", user_id, points);
        Ok(())
    }

    /// Record a lost game: the win streak resets, the score keeps.
    pub async fn record_loss(&self, user_id: &str, user_name: &str) -> Result<()> {
        match self.store.get(&self.collection, user_id).await {
            Ok(_) => {
                let patch = json!({
                    "winStreak": 0,
                    "updatedAt": Utc::now(),
                });
                self.store
                    .update(&self.collection, user_id, patch, UpdateGuard::None)
                    .await?;
            }
            Err(StoreError::NotFound { .. }) => {
                self.create_entry(user_id, user_name, 0, 0).await?;
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Recorded loss for {}", user_id);
        Ok(())
    }

    async fn create_entry(
        &self,
        user_id: &str,
        user_name: &str,
        total_score: i64,
        win_streak: u32,
    ) -> Result<()> {
        let entry = LeaderboardEntry {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            total_score,
            win_streak,
            rank: 0,
            updated_at: Utc::now(),
        };
        self.store
            .create(&self.collection, user_id, serde_json::to_value(&entry)?)
            .await?;
        Ok(())
    }

    /// The top entries by total score, with dense 1-based ranks.
    pub async fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let docs = self.store.list(&self.collection, &[]).await?;
        let mut entries = docs
            .iter()
            .map(|doc| doc.to::<LeaderboardEntry>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        entries.truncate(limit);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = (i + 1) as u32;
        }
        Ok(entries)
    }
}
