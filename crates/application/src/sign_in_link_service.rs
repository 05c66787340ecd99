//! One-time sign-in links.
//!
//! Tokens are cryptographically random, stored only as SHA-256 hashes,
//! single-use, and expire after a short window.

mod token_crypto;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::{SignInTokenPurpose, UserId, UserProfile};

use token_crypto::{generate_token, hash_token};

/// Token row to persist when a link is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignInToken {
    /// User the link signs in as.
    pub user_id: UserId,
    /// Email of that user at issue time.
    pub email: String,
    /// SHA-256 hash of the raw token.
    pub token_hash: String,
    /// Why the link was issued.
    pub purpose: SignInTokenPurpose,
    /// Destination after the session is established.
    pub redirect_to: String,
    /// User that requested the link, if different from the target.
    pub issued_by: Option<UserId>,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Sign-in token as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInTokenRecord {
    /// Token identifier.
    pub id: uuid::Uuid,
    /// User the link signs in as.
    pub user_id: UserId,
    /// Email of that user at issue time.
    pub email: String,
    /// Why the link was issued.
    pub purpose: SignInTokenPurpose,
    /// Destination after the session is established.
    pub redirect_to: String,
    /// User that requested the link.
    pub issued_by: Option<UserId>,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// When the token was consumed.
    pub used_at: Option<DateTime<Utc>>,
}

/// Repository port for sign-in token persistence.
#[async_trait]
pub trait SignInTokenRepository: Send + Sync {
    /// Stores a new token and returns its id.
    async fn create_token(&self, token: NewSignInToken) -> AppResult<uuid::Uuid>;

    /// Marks an unused, unexpired token as used and returns it.
    ///
    /// Implementations must perform the check and the update atomically so a
    /// token can be consumed at most once.
    async fn consume_valid_token(
        &self,
        token_hash: &str,
        purpose: SignInTokenPurpose,
    ) -> AppResult<Option<SignInTokenRecord>>;
}

/// Issued link handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInLink {
    /// Absolute URL that redeems the token.
    pub url: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Application service issuing and redeeming one-time sign-in links.
#[derive(Clone)]
pub struct SignInLinkService {
    repository: Arc<dyn SignInTokenRepository>,
    public_api_url: String,
    ttl: Duration,
}

impl SignInLinkService {
    /// Creates a link service. `public_api_url` is the externally reachable API base URL.
    #[must_use]
    pub fn new(
        repository: Arc<dyn SignInTokenRepository>,
        public_api_url: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            public_api_url: public_api_url.into().trim_end_matches('/').to_owned(),
            ttl,
        }
    }

    /// Issues a single-use link that signs in as `target`.
    pub async fn issue_link(
        &self,
        target: &UserProfile,
        purpose: SignInTokenPurpose,
        redirect_to: &str,
        issued_by: Option<UserId>,
    ) -> AppResult<SignInLink> {
        let expires_at = Utc::now().checked_add_signed(self.ttl).ok_or_else(|| {
            AppError::Internal(format!("sign-in link lifetime {} is out of range", self.ttl))
        })?;
        let (raw_token, token_hash) = generate_token()?;

        self.repository
            .create_token(NewSignInToken {
                user_id: target.id,
                email: target.email.as_str().to_owned(),
                token_hash,
                purpose,
                redirect_to: redirect_to.to_owned(),
                issued_by,
                expires_at,
            })
            .await?;

        Ok(SignInLink {
            url: format!("{}/auth/sign-in?token={raw_token}", self.public_api_url),
            expires_at,
        })
    }

    /// Consumes a raw token; fails when it is unknown, used, or expired.
    pub async fn consume(
        &self,
        raw_token: &str,
        purpose: SignInTokenPurpose,
    ) -> AppResult<SignInTokenRecord> {
        if raw_token.trim().is_empty() {
            return Err(AppError::Unauthorized("invalid or expired link".to_owned()));
        }

        self.repository
            .consume_valid_token(&hash_token(raw_token.trim()), purpose)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or expired link".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use opsdesk_core::{AppError, AppResult};
    use opsdesk_domain::{AccountStatus, EmailAddress, SignInTokenPurpose, UserId, UserProfile};
    use tokio::sync::Mutex;

    use super::{
        NewSignInToken, SignInLinkService, SignInTokenRecord, SignInTokenRepository,
        token_crypto::hash_token,
    };

    #[derive(Default)]
    struct FakeTokenRepository {
        tokens: Mutex<Vec<SignInTokenRecord>>,
        hashes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SignInTokenRepository for FakeTokenRepository {
        async fn create_token(&self, token: NewSignInToken) -> AppResult<uuid::Uuid> {
            let id = uuid::Uuid::new_v4();
            self.hashes.lock().await.push(token.token_hash);
            self.tokens.lock().await.push(SignInTokenRecord {
                id,
                user_id: token.user_id,
                email: token.email,
                purpose: token.purpose,
                redirect_to: token.redirect_to,
                issued_by: token.issued_by,
                expires_at: token.expires_at,
                used_at: None,
            });
            Ok(id)
        }

        async fn consume_valid_token(
            &self,
            token_hash: &str,
            purpose: SignInTokenPurpose,
        ) -> AppResult<Option<SignInTokenRecord>> {
            let hashes = self.hashes.lock().await;
            let mut tokens = self.tokens.lock().await;
            let Some(index) = hashes.iter().position(|hash| hash == token_hash) else {
                return Ok(None);
            };

            let record = &mut tokens[index];
            if record.purpose != purpose || record.used_at.is_some() || record.expires_at <= Utc::now() {
                return Ok(None);
            }

            record.used_at = Some(Utc::now());
            Ok(Some(record.clone()))
        }
    }

    fn target() -> UserProfile {
        UserProfile {
            id: UserId::new(),
            full_name: "Carla Mendes".to_owned(),
            email: EmailAddress::new("carla@opsdesk.test").unwrap_or_else(|_| panic!("email")),
            status: AccountStatus::Active,
        }
    }

    fn raw_token_from(url: &str) -> String {
        url.split("token=").nth(1).unwrap_or_default().to_owned()
    }

    #[tokio::test]
    async fn issued_link_points_at_api_and_stores_only_hash() {
        let repository = Arc::new(FakeTokenRepository::default());
        let service = SignInLinkService::new(
            repository.clone(),
            "http://localhost:3001/",
            Duration::minutes(5),
        );

        let link = service
            .issue_link(&target(), SignInTokenPurpose::Impersonation, "/dashboard", None)
            .await
            .unwrap_or_else(|error| panic!("issue failed: {error}"));

        assert!(link.url.starts_with("http://localhost:3001/auth/sign-in?token="));
        let raw_token = raw_token_from(&link.url);
        let hashes = repository.hashes.lock().await;
        assert_eq!(hashes.as_slice(), [hash_token(&raw_token)]);
    }

    #[tokio::test]
    async fn link_is_redeemed_exactly_once() {
        let repository = Arc::new(FakeTokenRepository::default());
        let service = SignInLinkService::new(repository, "http://api", Duration::minutes(5));
        let profile = target();

        let link = service
            .issue_link(&profile, SignInTokenPurpose::Impersonation, "/dashboard", None)
            .await
            .unwrap_or_else(|error| panic!("issue failed: {error}"));
        let raw_token = raw_token_from(&link.url);

        let first = service
            .consume(&raw_token, SignInTokenPurpose::Impersonation)
            .await;
        assert_eq!(first.map(|record| record.user_id).ok(), Some(profile.id));

        let second = service
            .consume(&raw_token, SignInTokenPurpose::Impersonation)
            .await;
        assert!(matches!(second, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn expired_link_is_rejected() {
        let repository = Arc::new(FakeTokenRepository::default());
        let service = SignInLinkService::new(repository, "http://api", Duration::seconds(-1));

        let link = service
            .issue_link(&target(), SignInTokenPurpose::Impersonation, "/dashboard", None)
            .await
            .unwrap_or_else(|error| panic!("issue failed: {error}"));

        let result = service
            .consume(&raw_token_from(&link.url), SignInTokenPurpose::Impersonation)
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn out_of_range_lifetime_fails_without_storing_a_token() {
        let repository = Arc::new(FakeTokenRepository::default());
        let service = SignInLinkService::new(
            repository.clone(),
            "http://api",
            Duration::seconds(10_i64.pow(13)),
        );

        let result = service
            .issue_link(&target(), SignInTokenPurpose::Impersonation, "/dashboard", None)
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(repository.hashes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn blank_token_is_rejected_without_lookup() {
        let service = SignInLinkService::new(
            Arc::new(FakeTokenRepository::default()),
            "http://api",
            Duration::minutes(5),
        );

        let result = service.consume("  ", SignInTokenPurpose::Impersonation).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
