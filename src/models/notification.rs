use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const KIND_XP_AWARDED: &str = "xp_awarded";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// One XP award produced by a check-in, queued for the reward worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardJob {
    pub user_id: i64,
    pub workshop_id: i64,
    pub workshop_title: String,
    pub amount: i64,
}

impl RewardJob {
    pub fn notification_title(&self) -> String {
        format!("+{} XP", self.amount)
    }

    pub fn notification_body(&self) -> String {
        format!(
            "You earned {} XP for attending \"{}\".",
            self.amount, self.workshop_title
        )
    }
}
