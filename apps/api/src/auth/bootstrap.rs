use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use opsdesk_core::{AppError, UserIdentity};
use opsdesk_domain::UserId;
use tower_sessions::Session;
use tracing::info;

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// Development sign-in as an existing active user.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let user_id = UserId::parse(&payload.user_id)?;
    let profile = state
        .profile_repository
        .find_profile(user_id)
        .await?
        .filter(|profile| profile.status.is_active())
        .ok_or_else(|| AppError::Unauthorized("unknown or inactive user".to_owned()))?;

    let identity = UserIdentity::new(
        profile.id.as_uuid(),
        profile.full_name,
        Some(profile.email.into()),
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(%user_id, "bootstrap sign-in");
    Ok(StatusCode::NO_CONTENT)
}
