//! HTTP adapter for the opsdesk API session endpoints.
//!
//! Session cookies are tracked by hand and redirects are never followed, so
//! the session minted by a sign-in link can be captured as a [`SessionRef`].

use std::time::Duration;

use async_trait::async_trait;
use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::{EffectivePermissions, UserId};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, LOCATION, ORIGIN, SET_COOKIE};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{SessionClient, SessionRef};

const DEFAULT_SESSION_COOKIE: &str = "id";
const LINK_EXPIRED_PATH: &str = "/auth/link-expired";

/// One-time link returned by the impersonation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationLink {
    /// Sign-in URL to hand to [`crate::ImpersonationSession::enter`].
    pub link: String,
    /// Impersonated user.
    pub target_user_id: UserId,
    /// Impersonated user's full name.
    pub target_full_name: String,
    /// Impersonated user's email.
    pub target_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpersonateResponse {
    link: String,
    target_user: TargetUserResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetUserResponse {
    id: UserId,
    full_name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionsResponse {
    permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Cookie-session client for the opsdesk API.
#[derive(Debug)]
pub struct HttpSessionClient {
    http_client: reqwest::Client,
    api_base_url: String,
    origin: String,
    cookie_name: String,
    session: RwLock<Option<SessionRef>>,
}

impl HttpSessionClient {
    /// Creates a client. `origin` must match the API's configured frontend URL.
    pub fn new(api_base_url: impl Into<String>, origin: impl Into<String>) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            http_client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_owned(),
            origin: origin.into().trim_end_matches('/').to_owned(),
            cookie_name: DEFAULT_SESSION_COOKIE.to_owned(),
            session: RwLock::new(None),
        })
    }

    /// Overrides the session cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    /// Asks the API for a one-time link signing in as `target_user_id`.
    pub async fn request_impersonation(
        &self,
        target_user_id: UserId,
    ) -> AppResult<ImpersonationLink> {
        let request = self
            .http_client
            .post(format!("{}/api/impersonate", self.api_base_url))
            .header(ORIGIN, self.origin.as_str())
            .json(&serde_json::json!({ "targetUserId": target_user_id }));
        let response = self
            .with_session_cookie(request)
            .await
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to call impersonation endpoint: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response
            .json::<ImpersonateResponse>()
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse impersonation endpoint response body: {error}"
                ))
            })?;

        Ok(ImpersonationLink {
            link: body.link,
            target_user_id: body.target_user.id,
            target_full_name: body.target_user.full_name,
            target_email: body.target_user.email,
        })
    }

    /// Fetches the current user's effective permissions.
    pub async fn fetch_permissions(&self) -> AppResult<EffectivePermissions> {
        let request = self
            .http_client
            .get(format!("{}/api/me/permissions", self.api_base_url));
        let response = self
            .with_session_cookie(request)
            .await
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to call permissions endpoint: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response
            .json::<PermissionsResponse>()
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse permissions endpoint response body: {error}"
                ))
            })?;

        Ok(EffectivePermissions::from_tokens(body.permissions))
    }

    async fn with_session_cookie(
        &self,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match self.session.read().await.as_ref() {
            Some(session) => request.header(
                COOKIE,
                format!("{}={}", self.cookie_name, session.as_str()),
            ),
            None => request,
        }
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn current_session(&self) -> AppResult<Option<SessionRef>> {
        Ok(self.session.read().await.clone())
    }

    async fn set_session(&self, session: SessionRef) -> AppResult<()> {
        let response = self
            .http_client
            .get(format!("{}/auth/me", self.api_base_url))
            .header(COOKIE, format!("{}={}", self.cookie_name, session.as_str()))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to call session endpoint: {error}")))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        let request = self
            .http_client
            .post(format!("{}/auth/logout", self.api_base_url))
            .header(ORIGIN, self.origin.as_str());
        let response = self
            .with_session_cookie(request)
            .await
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to call logout endpoint: {error}")))?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            return Err(error_from_response(response).await);
        }

        *self.session.write().await = None;
        Ok(())
    }

    async fn follow_sign_in_link(&self, link: &str) -> AppResult<SessionRef> {
        let response = self
            .http_client
            .get(link)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to follow sign-in link: {error}")))?;

        let status = response.status();
        if !status.is_redirection() {
            return Err(AppError::Internal(format!(
                "sign-in link returned unexpected status {}",
                status.as_u16()
            )));
        }

        let headers = response.headers();
        if redirects_to_link_expired(headers) {
            return Err(AppError::Unauthorized("invalid or expired link".to_owned()));
        }

        let session = session_cookie(headers, &self.cookie_name).ok_or_else(|| {
            AppError::Internal("sign-in link did not establish a session".to_owned())
        })?;

        debug!("sign-in link redeemed");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }
}

fn redirects_to_link_expired(headers: &HeaderMap) -> bool {
    headers
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|location| location.contains(LINK_EXPIRED_PATH))
}

fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<SessionRef> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| SessionRef::new(value))
}

async fn error_from_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response
        .json::<ErrorBody>()
        .await
        .unwrap_or_default();
    let message = if body.message.is_empty() {
        format!("request failed with status {}", status.as_u16())
    } else {
        body.message
    };

    match status {
        StatusCode::BAD_REQUEST => AppError::Validation(message),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(body.reason.unwrap_or(message)),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::Internal(message),
    }
}
