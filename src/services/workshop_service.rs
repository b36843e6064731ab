use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    CreateWorkshopRequest, LocationMode, QrTokenIssued, Role, UpdateWorkshopRequest, User,
    Workshop, WorkshopFields, WorkshopStats,
};
use crate::repositories::{
    AttendanceStore, RegistrationRepository, RepositoryError, WorkshopRepository,
};
use crate::services::access_guard::AccessGuard;
use crate::services::token_generator::generate_token;

pub const MAX_TITLE_LEN: usize = 200;

pub struct WorkshopService {
    guard: Arc<AccessGuard>,
    workshops: Arc<dyn WorkshopRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    attendance: Arc<dyn AttendanceStore>,
    default_token_ttl: Option<Duration>,
}

impl WorkshopService {
    pub fn new(
        guard: Arc<AccessGuard>,
        workshops: Arc<dyn WorkshopRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        attendance: Arc<dyn AttendanceStore>,
        default_token_ttl: Option<Duration>,
    ) -> Self {
        Self {
            guard,
            workshops,
            registrations,
            attendance,
            default_token_ttl,
        }
    }

    pub async fn create_workshop(
        &self,
        actor: &User,
        request: CreateWorkshopRequest,
    ) -> Result<Workshop> {
        self.guard.authorize(actor, Role::Admin).await?;

        let fields = validate_fields(WorkshopFields {
            title: request.title,
            description: request.description,
            scheduled_at: request.scheduled_at,
            location_mode: parse_location_mode(&request.location_mode)?,
            venue: request.venue,
            meeting_url: request.meeting_url,
            capacity: request.capacity,
        })?;

        let workshop = self.workshops.create(fields, actor.id).await?;
        tracing::info!(workshop_id = workshop.id, created_by = actor.id, "Workshop created");
        Ok(workshop)
    }

    pub async fn update_workshop(
        &self,
        actor: &User,
        workshop_id: i64,
        request: UpdateWorkshopRequest,
    ) -> Result<Workshop> {
        self.guard.authorize(actor, Role::Admin).await?;

        let existing = self.get_workshop(workshop_id).await?;
        let mut fields = WorkshopFields::from_workshop(&existing);

        if let Some(title) = request.title {
            fields.title = title;
        }
        if let Some(description) = request.description {
            fields.description = description;
        }
        if let Some(scheduled_at) = request.scheduled_at {
            fields.scheduled_at = scheduled_at;
        }
        if let Some(mode) = request.location_mode {
            fields.location_mode = parse_location_mode(&mode)?;
        }
        if let Some(venue) = request.venue {
            fields.venue = venue;
        }
        if let Some(meeting_url) = request.meeting_url {
            fields.meeting_url = meeting_url;
        }
        if let Some(capacity) = request.capacity {
            fields.capacity = capacity;
        }

        let workshop = self
            .workshops
            .update(workshop_id, validate_fields(fields)?)
            .await
            .map_err(workshop_error)?;

        tracing::info!(workshop_id, updated_by = actor.id, "Workshop updated");
        Ok(workshop)
    }

    /// Removes the workshop together with its registrations and attendance.
    pub async fn delete_workshop(&self, actor: &User, workshop_id: i64) -> Result<()> {
        self.guard.authorize(actor, Role::Admin).await?;

        self.workshops
            .delete(workshop_id)
            .await
            .map_err(workshop_error)?;

        tracing::info!(workshop_id, deleted_by = actor.id, "Workshop deleted");
        Ok(())
    }

    pub async fn get_workshop(&self, workshop_id: i64) -> Result<Workshop> {
        self.workshops
            .find_by_id(workshop_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workshop"))
    }

    /// All workshops, earliest first.
    pub async fn list_workshops(&self) -> Result<Vec<Workshop>> {
        Ok(self.workshops.list().await?)
    }

    /// Generates a fresh token and replaces the active one.
    ///
    /// `ttl_minutes` overrides the configured lifetime; `Some(0)` issues a
    /// token that never expires.
    pub async fn issue_qr_token(
        &self,
        actor: &User,
        workshop_id: i64,
        ttl_minutes: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<QrTokenIssued> {
        self.guard.authorize(actor, Role::Admin).await?;

        let ttl = match ttl_minutes {
            None => self.default_token_ttl,
            Some(0) => None,
            Some(minutes) if minutes > 0 => {
                Some(Duration::try_minutes(minutes).ok_or_else(ttl_too_large)?)
            }
            Some(_) => {
                return Err(AppError::Validation(
                    "ttl_minutes must not be negative".to_string(),
                ))
            }
        };
        let expires_at = match ttl {
            Some(ttl) => Some(now.checked_add_signed(ttl).ok_or_else(ttl_too_large)?),
            None => None,
        };

        let token = generate_token();
        let workshop = self
            .workshops
            .set_qr_token(workshop_id, &token, expires_at)
            .await
            .map_err(workshop_error)?;

        tracing::info!(
            workshop_id,
            issued_by = actor.id,
            expires_at = ?expires_at,
            "QR token rotated"
        );

        Ok(QrTokenIssued {
            token,
            expires_at,
            workshop: workshop.summary(),
        })
    }

    pub async fn workshop_stats(&self, actor: &User, workshop_id: i64) -> Result<WorkshopStats> {
        self.guard.authorize(actor, Role::Admin).await?;
        self.get_workshop(workshop_id).await?;

        let registered = self.registrations.count_for_workshop(workshop_id).await?;
        let attended = self.attendance.count_for_workshop(workshop_id).await?;

        Ok(WorkshopStats {
            workshop_id,
            registered,
            attended,
            attendance_rate: attendance_rate(registered, attended),
        })
    }
}

fn workshop_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("Workshop"),
        other => other.into(),
    }
}

fn ttl_too_large() -> AppError {
    AppError::Validation("ttl_minutes is too large".to_string())
}

fn parse_location_mode(raw: &str) -> Result<LocationMode> {
    LocationMode::parse(raw).ok_or_else(|| {
        AppError::Validation("location_mode must be \"online\" or \"offline\"".to_string())
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims free text and enforces the workshop field rules.
pub fn validate_fields(fields: WorkshopFields) -> Result<WorkshopFields> {
    let title = fields.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }

    if let Some(capacity) = fields.capacity {
        if capacity <= 0 {
            return Err(AppError::Validation(
                "capacity must be greater than zero".to_string(),
            ));
        }
    }

    Ok(WorkshopFields {
        title,
        description: non_blank(fields.description),
        scheduled_at: fields.scheduled_at,
        location_mode: fields.location_mode,
        venue: non_blank(fields.venue),
        meeting_url: non_blank(fields.meeting_url),
        capacity: fields.capacity,
    })
}

pub fn attendance_rate(registered: i64, attended: i64) -> Option<f64> {
    (registered > 0).then(|| attended as f64 / registered as f64)
}
