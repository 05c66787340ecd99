use opsdesk_core::UserIdentity;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Development sign-in payload guarded by the bootstrap token.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub user_id: String,
    pub token: String,
}

/// Query string of a one-time sign-in link.
#[derive(Debug, Deserialize)]
pub struct SignInLinkQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Whether the session was established through impersonation.
    pub impersonated: bool,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(identity: UserIdentity) -> Self {
        Self {
            user_id: identity.user_id().to_string(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            impersonated: identity.is_impersonated(),
        }
    }
}
