use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CheckInMethod {
    Qr,
    Manual,
}

impl CheckInMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInMethod::Qr => "qr",
            CheckInMethod::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub workshop_id: i64,
    pub user_id: i64,
    pub checked_in_at: DateTime<Utc>,
    pub method: CheckInMethod,
    /// Admin who recorded a manual check-in.
    pub checked_in_by: Option<i64>,
}

/// Roster row: an attendance record joined with the attendee's display info.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttendanceWithUser {
    pub id: i64,
    pub workshop_id: i64,
    pub user_id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub checked_in_at: DateTime<Utc>,
    pub method: CheckInMethod,
    pub checked_in_by: Option<i64>,
    pub registered: bool,
}

impl AttendanceWithUser {
    /// Display name when set, otherwise the email.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}
