use std::collections::HashMap;
use std::sync::Arc;

use opsdesk_core::{AppError, AppResult, UserIdentity};
use tower_sessions::SessionStore;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::cookie::{Cookie, SameSite};
use tower_sessions::session::{Id, Record};

use super::SESSION_USER_KEY;

pub const SESSION_COOKIE_NAME: &str = "id";
pub const SESSION_INACTIVITY: Duration = Duration::minutes(30);

/// Writes new session records straight into the session store.
///
/// Used where a request must hand out a session without touching the one it
/// arrived with, such as redeeming an impersonation link from an
/// administrator's browser.
#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn SessionStore>,
    cookie_secure: bool,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn SessionStore>, cookie_secure: bool) -> Self {
        Self {
            store,
            cookie_secure,
        }
    }

    /// Persists a session for `identity` and returns the cookie that names it.
    pub async fn issue(&self, identity: &UserIdentity) -> AppResult<Cookie<'static>> {
        let identity = serde_json::to_value(identity).map_err(|error| {
            AppError::Internal(format!("failed to encode session identity: {error}"))
        })?;

        let mut record = Record {
            id: Id::default(),
            data: HashMap::from([(SESSION_USER_KEY.to_owned(), identity)]),
            expiry_date: OffsetDateTime::now_utc() + SESSION_INACTIVITY,
        };
        self.store
            .create(&mut record)
            .await
            .map_err(|error| AppError::Internal(format!("failed to create session: {error}")))?;

        Ok(Cookie::build((SESSION_COOKIE_NAME, record.id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(SESSION_INACTIVITY)
            .build())
    }
}
