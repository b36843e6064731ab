use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub workshop_id: i64,
    pub user_id: i64,
    pub registered_at: DateTime<Utc>,
}
