//! PostgreSQL-backed role and profile lookups.

mod rows;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use sqlx::PgPool;

use opsdesk_application::{ProfileRepository, RoleRepository};
use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::{Role, UserId, UserProfile};

use rows::{ProfileRow, RoleRow, decode_role_rows};

/// PostgreSQL implementation of the directory ports.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresDirectoryRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.name AS role_name,
                roles.is_global,
                departments.name AS department_name
            FROM user_roles
            LEFT JOIN roles
                ON roles.id = user_roles.role_id
            LEFT JOIN departments
                ON departments.id = roles.department_id
            WHERE user_roles.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load roles for user '{user_id}': {error}"))
        })?;

        Ok(decode_role_rows(user_id, rows))
    }
}

#[async_trait]
impl ProfileRepository for PostgresDirectoryRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, full_name, email, status
            FROM profiles
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find profile '{user_id}': {error}"))
        })?;

        row.map(UserProfile::try_from).transpose()
    }
}
