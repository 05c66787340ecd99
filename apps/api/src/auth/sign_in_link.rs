use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use opsdesk_core::AppError;
use tracing::{info, warn};

use crate::dto::SignInLinkQuery;
use crate::error::ApiResult;
use crate::state::AppState;

const LINK_EXPIRED_PATH: &str = "/auth/link-expired";

/// Redeems a one-time sign-in link into a new session.
///
/// The session the request arrived with is not read or changed, so an
/// administrator's own session survives opening the link. Missing, used and
/// expired tokens redirect to the link-expired page.
pub async fn sign_in_link_handler(
    State(state): State<AppState>,
    Query(query): Query<SignInLinkQuery>,
) -> ApiResult<Response> {
    let link_expired = || {
        Redirect::to(&format!("{}{LINK_EXPIRED_PATH}", state.frontend_url)).into_response()
    };

    let Some(token) = query.token.filter(|token| !token.trim().is_empty()) else {
        return Ok(link_expired());
    };

    let redeemed = match state.impersonation_service.redeem_link(&token).await {
        Ok(redeemed) => redeemed,
        Err(AppError::Unauthorized(reason)) => {
            warn!(%reason, "rejected sign-in link");
            return Ok(link_expired());
        }
        Err(error) => return Err(error.into()),
    };

    let cookie = state.session_issuer.issue(&redeemed.identity).await?;

    info!(
        user_id = %redeemed.identity.user_id(),
        impersonated_by = ?redeemed.identity.impersonated_by(),
        "sign-in link redeemed"
    );
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Redirect::to(&redeemed.redirect_to),
    )
        .into_response())
}
