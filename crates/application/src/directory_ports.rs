use async_trait::async_trait;
use opsdesk_core::AppResult;
use opsdesk_domain::{Role, UserId, UserProfile};

/// Read-only lookup of role assignments.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists the roles assigned to a user. Unresolvable assignments are omitted.
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>>;
}

/// Read-only lookup of user profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile by user id.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>>;
}
