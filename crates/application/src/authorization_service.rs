use std::sync::Arc;

use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::{AccessRequirement, EffectivePermissions, PermissionCatalog, UserId};
use tracing::debug;

use crate::RoleRepository;

/// Application service that evaluates a user's roles against the permission catalog.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn RoleRepository>,
    catalog: Arc<PermissionCatalog>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>, catalog: Arc<PermissionCatalog>) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Returns the catalog used for evaluation.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Loads the user's roles and evaluates them.
    pub async fn effective_permissions(&self, user_id: UserId) -> AppResult<EffectivePermissions> {
        let roles = self.repository.list_roles_for_user(user_id).await?;
        Ok(self.catalog.evaluate(&roles))
    }

    /// Ensures the user satisfies the requirement.
    pub async fn require(&self, user_id: UserId, requirement: &AccessRequirement) -> AppResult<()> {
        let permissions = self.effective_permissions(user_id).await?;
        if requirement.is_satisfied_by(&permissions) {
            return Ok(());
        }

        debug!(%user_id, missing = %requirement.describe(), "access requirement not met");
        Err(AppError::Forbidden("insufficient_privilege".to_owned()))
    }
}
