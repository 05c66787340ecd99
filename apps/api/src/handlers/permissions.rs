use axum::Json;
use axum::extract::{Extension, State};
use opsdesk_core::UserIdentity;
use opsdesk_domain::UserId;

use crate::dto::{PermissionsResponse, RoleCatalogEntryResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<PermissionsResponse>> {
    let permissions = state
        .authorization_service
        .effective_permissions(UserId::from_uuid(identity.user_id()))
        .await?;

    Ok(Json(PermissionsResponse::from(&permissions)))
}

pub async fn role_catalog_handler(
    State(state): State<AppState>,
) -> Json<Vec<RoleCatalogEntryResponse>> {
    Json(
        state
            .authorization_service
            .catalog()
            .entries()
            .into_iter()
            .map(|(key, permissions)| RoleCatalogEntryResponse::new(key, permissions))
            .collect(),
    )
}
