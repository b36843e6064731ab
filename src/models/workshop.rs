use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LocationMode {
    Online,
    Offline,
}

impl LocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationMode::Online => "online",
            LocationMode::Offline => "offline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" => Some(LocationMode::Online),
            "offline" => Some(LocationMode::Offline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Workshop {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub location_mode: LocationMode,
    pub venue: Option<String>,
    pub meeting_url: Option<String>,
    pub capacity: Option<i64>,
    /// Active check-in token. Only handed out through QR issuance.
    #[serde(skip_serializing, default)]
    pub qr_token: Option<String>,
    pub qr_expires_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workshop {
    /// Inclusive check-in window: the scheduled calendar day in UTC,
    /// 00:00:00 through 23:59:59.
    pub fn check_in_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let day = self.scheduled_at.date_naive();
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::seconds(1);
        (start, end)
    }

    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        self.qr_expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn summary(&self) -> WorkshopSummary {
        WorkshopSummary {
            id: self.id,
            title: self.title.clone(),
            scheduled_at: self.scheduled_at,
            location_mode: self.location_mode,
            venue: self.venue.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopSummary {
    pub id: i64,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    pub location_mode: LocationMode,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkshopRequest {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub location_mode: String,
    pub venue: Option<String>,
    pub meeting_url: Option<String>,
    pub capacity: Option<i64>,
}

/// Partial update. Absent fields keep their stored value. On the nullable
/// fields an explicit `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkshopRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location_mode: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub venue: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub meeting_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub capacity: Option<Option<i64>>,
}

/// Marks a field as present, so `null` becomes `Some(None)` instead of `None`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validated values written by the repository on create and update.
#[derive(Debug, Clone)]
pub struct WorkshopFields {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub location_mode: LocationMode,
    pub venue: Option<String>,
    pub meeting_url: Option<String>,
    pub capacity: Option<i64>,
}

impl WorkshopFields {
    pub fn from_workshop(workshop: &Workshop) -> Self {
        Self {
            title: workshop.title.clone(),
            description: workshop.description.clone(),
            scheduled_at: workshop.scheduled_at,
            location_mode: workshop.location_mode,
            venue: workshop.venue.clone(),
            meeting_url: workshop.meeting_url.clone(),
            capacity: workshop.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QrTokenIssued {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub workshop: WorkshopSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenVerification {
    pub valid: bool,
    pub expired: bool,
    pub workshop: WorkshopSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkshopStats {
    pub workshop_id: i64,
    pub registered: i64,
    pub attended: i64,
    /// attended / registered, or `None` when nobody registered.
    pub attendance_rate: Option<f64>,
}
