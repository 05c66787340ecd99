//! PostgreSQL-backed one-time sign-in token repository.


use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use opsdesk_application::{NewSignInToken, SignInTokenRecord, SignInTokenRepository};
use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::{SignInTokenPurpose, UserId};

/// PostgreSQL implementation of the sign-in token repository port.
#[derive(Clone)]
pub struct PostgresSignInTokenRepository {
    pool: PgPool,
}

impl PostgresSignInTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignInTokenRepository for PostgresSignInTokenRepository {
    async fn create_token(&self, token: NewSignInToken) -> AppResult<uuid::Uuid> {
        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO sign_in_tokens (
                user_id,
                email,
                token_hash,
                purpose,
                redirect_to,
                issued_by,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(token.user_id.as_uuid())
        .bind(token.email)
        .bind(token.token_hash)
        .bind(token.purpose.as_str())
        .bind(token.redirect_to)
        .bind(token.issued_by.map(|issued_by| issued_by.as_uuid()))
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create sign-in token: {error}")))?;

        Ok(id)
    }

    async fn consume_valid_token(
        &self,
        token_hash: &str,
        purpose: SignInTokenPurpose,
    ) -> AppResult<Option<SignInTokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            UPDATE sign_in_tokens
            SET used_at = now()
            WHERE token_hash = $1
              AND purpose = $2
              AND used_at IS NULL
              AND expires_at > now()
            RETURNING id, user_id, email, purpose, redirect_to, issued_by, expires_at, used_at
            "#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to consume sign-in token: {error}")))?;

        row.map(SignInTokenRecord::try_from).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    email: String,
    purpose: String,
    redirect_to: String,
    issued_by: Option<uuid::Uuid>,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl TryFrom<TokenRow> for SignInTokenRecord {
    type Error = AppError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let purpose = SignInTokenPurpose::from_str(row.purpose.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid purpose for sign-in token '{}': {error}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            email: row.email,
            purpose,
            redirect_to: row.redirect_to,
            issued_by: row.issued_by.map(UserId::from_uuid),
            expires_at: row.expires_at,
            used_at: row.used_at,
        })
    }
}
