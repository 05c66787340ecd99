use axum::extract::{Extension, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use opsdesk_core::{AppError, UserIdentity};
use opsdesk_domain::{AccessRequirement, UserId};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects callers whose effective permissions do not satisfy the route's requirement.
///
/// Must run inside [`require_auth`].
pub async fn require_access(
    State(state): State<AppState>,
    Extension(requirement): Extension<AccessRequirement>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = request
        .extensions()
        .get::<UserIdentity>()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let user_id = UserId::from_uuid(identity.user_id());

    state
        .authorization_service
        .require(user_id, &requirement)
        .await?;

    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        verify_same_origin(request.headers(), &state.frontend_url)?;
    }

    Ok(next.run(request).await)
}

/// Accepts a request only when its `Origin` or `Referer` names `allowed_origin`.
pub fn verify_same_origin(headers: &HeaderMap, allowed_origin: &str) -> Result<(), AppError> {
    if headers
        .get("sec-fetch-site")
        .is_some_and(|fetch_site| fetch_site == HeaderValue::from_static("cross-site"))
    {
        return Err(AppError::Forbidden("cross_site".to_owned()));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let origin_is_allowed = origin == allowed_origin;
    let referer_is_allowed =
        !referer.is_empty() && referer.starts_with(&format!("{allowed_origin}/"));

    if !origin_is_allowed && !referer_is_allowed {
        return Err(AppError::Forbidden("origin_mismatch".to_owned()));
    }

    Ok(())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
