use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Registration, Role, User};
use crate::repositories::{RegistrationRepository, RepositoryError, WorkshopRepository};
use crate::services::access_guard::AccessGuard;

/// Workshop sign-ups. A registration states intent to attend; it is not
/// required for check-in.
pub struct RegistrationService {
    guard: Arc<AccessGuard>,
    workshops: Arc<dyn WorkshopRepository>,
    registrations: Arc<dyn RegistrationRepository>,
}

impl RegistrationService {
    pub fn new(
        guard: Arc<AccessGuard>,
        workshops: Arc<dyn WorkshopRepository>,
        registrations: Arc<dyn RegistrationRepository>,
    ) -> Self {
        Self {
            guard,
            workshops,
            registrations,
        }
    }

    pub async fn register(&self, user: &User, workshop_id: i64) -> Result<Registration> {
        let workshop = self
            .workshops
            .find_by_id(workshop_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workshop"))?;

        match self
            .registrations
            .create_within_capacity(workshop.id, user.id, workshop.capacity)
            .await
        {
            Ok(Some(registration)) => {
                tracing::info!(workshop_id, user_id = user.id, "Registered for workshop");
                Ok(registration)
            }
            Ok(None) => {
                tracing::debug!(workshop_id, user_id = user.id, capacity = ?workshop.capacity, "Workshop full");
                Err(AppError::CapacityExceeded)
            }
            Err(RepositoryError::AlreadyExists) => Err(AppError::AlreadyRegistered),
            Err(err) => Err(err.into()),
        }
    }

    /// Registrations for one workshop. Admin only.
    pub async fn list_registrations(
        &self,
        actor: &User,
        workshop_id: i64,
    ) -> Result<Vec<Registration>> {
        self.guard.authorize(actor, Role::Admin).await?;
        Ok(self.registrations.list_for_workshop(workshop_id).await?)
    }

    pub async fn list_user_registrations(&self, user: &User) -> Result<Vec<Registration>> {
        Ok(self.registrations.list_for_user(user.id).await?)
    }
}
