use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use opsdesk_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::dto::{ImpersonateRequest, ImpersonateResponse};
use crate::error::ApiResult;
use crate::middleware::verify_same_origin;
use crate::state::AppState;

/// Issues a one-time link signing the caller in as another user.
///
/// Authentication and the same-origin check are resolved here rather than by
/// the router's middleware, so an anonymous caller is told 401 before anything
/// else and the service can apply its checks in order.
pub async fn impersonate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    session: Session,
    payload: Result<Json<ImpersonateRequest>, JsonRejection>,
) -> ApiResult<Json<ImpersonateResponse>> {
    let caller = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    if caller.is_some() {
        verify_same_origin(&headers, &state.frontend_url)?;
    }

    let payload = match (&caller, payload) {
        (_, Ok(Json(payload))) => payload,
        // An unauthenticated caller gets 401 even when the body is malformed.
        (None, Err(_)) => ImpersonateRequest::default(),
        (Some(_), Err(rejection)) => {
            return Err(AppError::Validation(format!("invalid request body: {rejection}")).into());
        }
    };

    let grant = state
        .impersonation_service
        .authorize_and_grant(caller.as_ref(), payload.target_user_id.as_deref())
        .await?;

    Ok(Json(ImpersonateResponse::from(grant)))
}
