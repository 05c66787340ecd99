use std::collections::HashMap;

use async_trait::async_trait;
use opsdesk_application::{ProfileRepository, RoleRepository};
use opsdesk_core::AppResult;
use opsdesk_domain::{Role, UserId, UserProfile};
use tokio::sync::RwLock;

/// In-memory directory used by development setups and tests.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryRepository {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
    roles: RwLock<HashMap<UserId, Vec<Role>>>,
}

impl InMemoryDirectoryRepository {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile.
    pub async fn upsert_profile(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    /// Assigns a role to a user. Assigning the same role twice is a no-op.
    pub async fn assign_role(&self, user_id: UserId, role: Role) {
        let mut roles = self.roles.write().await;
        let assigned = roles.entry(user_id).or_default();
        if !assigned.contains(&role) {
            assigned.push(role);
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryDirectoryRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryDirectoryRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use opsdesk_application::{ProfileRepository, RoleRepository};
    use opsdesk_domain::{AccountStatus, EmailAddress, Role, UserId, UserProfile};

    use super::InMemoryDirectoryRepository;

    #[tokio::test]
    async fn assigned_roles_are_listed_once() {
        let directory = InMemoryDirectoryRepository::new();
        let user_id = UserId::new();
        let role = Role::scoped("Atendente", "Atendimento").unwrap_or_else(|_| panic!("role"));

        directory.assign_role(user_id, role.clone()).await;
        directory.assign_role(user_id, role.clone()).await;

        let roles = directory
            .list_roles_for_user(user_id)
            .await
            .unwrap_or_else(|error| panic!("lookup failed: {error}"));
        assert_eq!(roles, vec![role]);
    }

    #[tokio::test]
    async fn profile_lookup_returns_upserted_profile() {
        let directory = InMemoryDirectoryRepository::new();
        let profile = UserProfile {
            id: UserId::new(),
            full_name: "Beatriz Lima".to_owned(),
            email: EmailAddress::new("beatriz@opsdesk.test").unwrap_or_else(|_| panic!("email")),
            status: AccountStatus::Active,
        };

        directory.upsert_profile(profile.clone()).await;

        let found = directory.find_profile(profile.id).await;
        assert_eq!(found.ok().flatten(), Some(profile));
        assert!(matches!(directory.find_profile(UserId::new()).await, Ok(None)));
    }
}
