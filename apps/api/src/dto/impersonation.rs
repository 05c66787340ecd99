use opsdesk_application::ImpersonationGrant;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for an impersonation request.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/impersonate-request.ts"
)]
pub struct ImpersonateRequest {
    #[serde(default)]
    pub target_user_id: Option<String>,
}

/// Impersonated user summary shown for confirmation.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/impersonation-target-response.ts"
)]
pub struct ImpersonationTargetResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

/// One-time link granting a session as the target user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/impersonate-response.ts"
)]
pub struct ImpersonateResponse {
    pub link: String,
    pub target_user: ImpersonationTargetResponse,
}

impl From<ImpersonationGrant> for ImpersonateResponse {
    fn from(grant: ImpersonationGrant) -> Self {
        Self {
            link: grant.link.url,
            target_user: ImpersonationTargetResponse {
                id: grant.target.id.to_string(),
                full_name: grant.target.full_name,
                email: grant.target.email,
            },
        }
    }
}
