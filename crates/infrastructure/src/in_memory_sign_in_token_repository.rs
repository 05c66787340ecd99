use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use opsdesk_application::{NewSignInToken, SignInTokenRecord, SignInTokenRepository};
use opsdesk_core::AppResult;
use opsdesk_domain::SignInTokenPurpose;
use tokio::sync::Mutex;

/// In-memory sign-in token store keyed by token hash.
#[derive(Debug, Default)]
pub struct InMemorySignInTokenRepository {
    tokens: Mutex<HashMap<String, SignInTokenRecord>>,
}

impl InMemorySignInTokenRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignInTokenRepository for InMemorySignInTokenRepository {
    async fn create_token(&self, token: NewSignInToken) -> AppResult<uuid::Uuid> {
        let id = uuid::Uuid::new_v4();
        self.tokens.lock().await.insert(
            token.token_hash,
            SignInTokenRecord {
                id,
                user_id: token.user_id,
                email: token.email,
                purpose: token.purpose,
                redirect_to: token.redirect_to,
                issued_by: token.issued_by,
                expires_at: token.expires_at,
                used_at: None,
            },
        );

        Ok(id)
    }

    async fn consume_valid_token(
        &self,
        token_hash: &str,
        purpose: SignInTokenPurpose,
    ) -> AppResult<Option<SignInTokenRecord>> {
        // The lock spans check and update, which makes consumption atomic.
        let mut tokens = self.tokens.lock().await;
        let now = Utc::now();

        let Some(record) = tokens.get_mut(token_hash) else {
            return Ok(None);
        };
        if record.purpose != purpose || record.used_at.is_some() || record.expires_at <= now {
            return Ok(None);
        }

        record.used_at = Some(now);
        Ok(Some(record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use opsdesk_application::{NewSignInToken, SignInTokenRepository};
    use opsdesk_domain::{SignInTokenPurpose, UserId};

    use super::InMemorySignInTokenRepository;

    #[tokio::test]
    async fn second_consume_returns_nothing() {
        let repository = InMemorySignInTokenRepository::new();
        let created = repository
            .create_token(NewSignInToken {
                user_id: UserId::new(),
                email: "otto@opsdesk.test".to_owned(),
                token_hash: "abc".to_owned(),
                purpose: SignInTokenPurpose::Impersonation,
                redirect_to: "/dashboard".to_owned(),
                issued_by: None,
                expires_at: Utc::now() + Duration::minutes(5),
            })
            .await;
        assert!(created.is_ok());

        let first = repository
            .consume_valid_token("abc", SignInTokenPurpose::Impersonation)
            .await;
        assert!(matches!(first, Ok(Some(record)) if record.used_at.is_some()));

        let second = repository
            .consume_valid_token("abc", SignInTokenPurpose::Impersonation)
            .await;
        assert!(matches!(second, Ok(None)));
    }
}
