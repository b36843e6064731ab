//! Pure check-in gates. Nothing here touches storage or the clock; callers
//! pass `now` in and run the gates in order: window first, then token.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::Workshop;

/// Accepts `now` only inside the workshop's scheduled UTC calendar day.
pub fn check_window(workshop: &Workshop, now: DateTime<Utc>) -> Result<()> {
    let (start, end) = workshop.check_in_window();

    if now < start || now > end {
        tracing::debug!(
            workshop_id = workshop.id,
            %now,
            %start,
            %end,
            "Check-in outside window"
        );
        return Err(AppError::OutsideCheckInWindow);
    }

    Ok(())
}

/// Compares the presented token with the workshop's active one and applies
/// the stored expiry.
pub fn check_token(workshop: &Workshop, presented: &str, now: DateTime<Utc>) -> Result<()> {
    let Some(active) = workshop.qr_token.as_deref() else {
        return Err(AppError::NoQrConfigured);
    };

    if active != presented {
        tracing::debug!(workshop_id = workshop.id, "Presented token does not match");
        return Err(AppError::InvalidToken);
    }

    if workshop.token_expired(now) {
        tracing::debug!(workshop_id = workshop.id, "Presented token has expired");
        return Err(AppError::InvalidOrExpiredToken);
    }

    Ok(())
}

/// Both gates of the QR path, in order.
pub fn validate_qr(workshop: &Workshop, presented: &str, now: DateTime<Utc>) -> Result<()> {
    check_window(workshop, now)?;
    check_token(workshop, presented, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationMode;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn workshop(token: Option<&str>, expires_at: Option<DateTime<Utc>>) -> Workshop {
        let scheduled_at = at(2025, 3, 10, 18, 0, 0);
        Workshop {
            id: 1,
            title: "Async Rust".to_string(),
            description: None,
            scheduled_at,
            location_mode: LocationMode::Online,
            venue: None,
            meeting_url: Some("https://meet.example.com/rust".to_string()),
            capacity: None,
            qr_token: token.map(str::to_string),
            qr_expires_at: expires_at,
            created_by: 1,
            created_at: scheduled_at,
            updated_at: scheduled_at,
        }
    }

    #[test]
    fn morning_of_the_workshop_is_accepted() {
        let w = workshop(Some("abc123"), None);
        assert!(validate_qr(&w, "abc123", at(2025, 3, 10, 9, 0, 0)).is_ok());
    }

    #[test]
    fn window_edges_are_inclusive() {
        let w = workshop(Some("abc123"), None);
        assert!(check_window(&w, at(2025, 3, 10, 0, 0, 0)).is_ok());
        assert!(check_window(&w, at(2025, 3, 10, 23, 59, 59)).is_ok());
    }

    #[test]
    fn day_after_is_rejected() {
        let w = workshop(Some("abc123"), None);
        let result = check_window(&w, at(2025, 3, 11, 0, 0, 1));
        assert!(matches!(result, Err(AppError::OutsideCheckInWindow)));
    }

    #[test]
    fn day_before_is_rejected() {
        let w = workshop(Some("abc123"), None);
        let result = check_window(&w, at(2025, 3, 9, 23, 59, 59));
        assert!(matches!(result, Err(AppError::OutsideCheckInWindow)));
    }

    #[test]
    fn window_is_checked_before_token() {
        let w = workshop(Some("abc123"), None);
        let result = validate_qr(&w, "wrong", at(2025, 3, 12, 9, 0, 0));
        assert!(matches!(result, Err(AppError::OutsideCheckInWindow)));
    }

    #[test]
    fn workshop_without_token_reports_no_qr_configured() {
        let w = workshop(None, None);
        let result = check_token(&w, "abc123", at(2025, 3, 10, 9, 0, 0));
        assert!(matches!(result, Err(AppError::NoQrConfigured)));
    }

    #[test]
    fn mismatched_token_is_invalid() {
        let w = workshop(Some("abc123"), None);
        let result = check_token(&w, "abc124", at(2025, 3, 10, 9, 0, 0));
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expires_at = at(2025, 3, 10, 8, 0, 0);
        let w = workshop(Some("abc123"), Some(expires_at));

        assert!(check_token(&w, "abc123", expires_at).is_ok());

        let result = check_token(&w, "abc123", expires_at + Duration::seconds(1));
        assert!(matches!(result, Err(AppError::InvalidOrExpiredToken)));
    }
}
