use async_trait::async_trait;
use sqlx::PgPool;

use opsdesk_application::{AuditEvent, AuditRepository};
use opsdesk_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (caller_id, action, target_id, details)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.actor_id.as_uuid())
        .bind(event.action.as_str())
        .bind(event.target_id.map(|target_id| target_id.as_uuid()))
        .bind(event.details)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
