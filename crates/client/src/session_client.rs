use async_trait::async_trait;
use opsdesk_core::AppResult;

/// Opaque reference to an authenticated server session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef(String);

impl SessionRef {
    /// Wraps a session reference value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<SessionRef> for String {
    fn from(value: SessionRef) -> Self {
        value.0
    }
}

/// Port over the authentication backend used by the session state holder.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Returns the active session, if any.
    async fn current_session(&self) -> AppResult<Option<SessionRef>>;

    /// Makes `session` the active session. Fails when the backend rejects it.
    async fn set_session(&self, session: SessionRef) -> AppResult<()>;

    /// Ends the active session.
    async fn sign_out(&self) -> AppResult<()>;

    /// Redeems a one-time sign-in link and makes the resulting session active.
    async fn follow_sign_in_link(&self, link: &str) -> AppResult<SessionRef>;
}
