use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    Attendance, AttendanceWithUser, CheckInMethod, Role, TokenVerification, User, Workshop,
};
use crate::repositories::{AttendanceStore, RepositoryError, UserRepository, WorkshopRepository};
use crate::services::access_guard::AccessGuard;
use crate::services::checkin_validator::{check_window, validate_qr};
use crate::services::reward_dispatcher::RewardSink;

/// Records attendance. Gates run in a fixed order: window, then token (QR) or
/// role (manual), then the idempotence check, then the insert. The UNIQUE
/// constraint on (workshop, user) decides concurrent duplicates.
pub struct CheckInService {
    guard: Arc<AccessGuard>,
    workshops: Arc<dyn WorkshopRepository>,
    users: Arc<dyn UserRepository>,
    attendance: Arc<dyn AttendanceStore>,
    rewards: Arc<dyn RewardSink>,
}

impl CheckInService {
    pub fn new(
        guard: Arc<AccessGuard>,
        workshops: Arc<dyn WorkshopRepository>,
        users: Arc<dyn UserRepository>,
        attendance: Arc<dyn AttendanceStore>,
        rewards: Arc<dyn RewardSink>,
    ) -> Self {
        Self {
            guard,
            workshops,
            users,
            attendance,
            rewards,
        }
    }

    /// Self check-in with a scanned token. `workshop_id`, when given, must be
    /// the workshop the token belongs to.
    pub async fn check_in_with_qr(
        &self,
        user: &User,
        workshop_id: Option<i64>,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Attendance> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Validation("token is required".to_string()));
        }

        let workshop = match workshop_id {
            Some(id) => self.load_workshop(id).await?,
            None => self
                .attendance
                .find_workshop_by_token(token)
                .await?
                .ok_or(AppError::InvalidToken)?,
        };

        validate_qr(&workshop, token, now)?;

        self.record(&workshop, user.id, CheckInMethod::Qr, None, now)
            .await
    }

    /// Admin records attendance for `target_user_id` without a token.
    pub async fn manual_check_in(
        &self,
        actor: &User,
        workshop_id: i64,
        target_user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Attendance> {
        self.guard.authorize(actor, Role::Admin).await?;

        let workshop = self.load_workshop(workshop_id).await?;
        check_window(&workshop, now)?;

        if self.users.find_by_id(target_user_id).await?.is_none() {
            return Err(AppError::not_found("User"));
        }

        self.record(
            &workshop,
            target_user_id,
            CheckInMethod::Manual,
            Some(actor.id),
            now,
        )
        .await
    }

    /// Read-only lookup for the scan page. Never writes.
    pub async fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<TokenVerification> {
        let workshop = self
            .attendance
            .find_workshop_by_token(token.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Token"))?;

        let expired = workshop.token_expired(now);

        Ok(TokenVerification {
            valid: !expired,
            expired,
            workshop: workshop.summary(),
        })
    }

    pub async fn list_attendance(
        &self,
        actor: &User,
        workshop_id: i64,
    ) -> Result<Vec<AttendanceWithUser>> {
        self.guard.authorize(actor, Role::Admin).await?;
        self.load_workshop(workshop_id).await?;

        Ok(self.attendance.list_attendance(workshop_id).await?)
    }

    async fn load_workshop(&self, workshop_id: i64) -> Result<Workshop> {
        self.workshops
            .find_by_id(workshop_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workshop"))
    }

    async fn record(
        &self,
        workshop: &Workshop,
        user_id: i64,
        method: CheckInMethod,
        checked_in_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Attendance> {
        if self.attendance.has_attended(workshop.id, user_id).await? {
            return Err(AppError::AlreadyCheckedIn);
        }

        let attendance = match self
            .attendance
            .insert_attendance(workshop.id, user_id, method, checked_in_by, now)
            .await
        {
            Ok(attendance) => attendance,
            Err(RepositoryError::AlreadyExists) => {
                tracing::debug!(
                    workshop_id = workshop.id,
                    user_id,
                    "Lost check-in race to a concurrent insert"
                );
                return Err(AppError::AlreadyCheckedIn);
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            workshop_id = workshop.id,
            user_id,
            method = method.as_str(),
            checked_in_by,
            "Check-in recorded"
        );

        self.rewards
            .on_attendance_recorded(user_id, workshop.id, &workshop.title);

        Ok(attendance)
    }
}
