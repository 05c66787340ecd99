use opsdesk_domain::{EffectivePermissions, Permission, RoleKey};
use serde::Serialize;
use std::collections::BTreeSet;
use ts_rs::TS;

/// Effective permissions of the current user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permissions-response.ts"
)]
pub struct PermissionsResponse {
    pub is_admin: bool,
    pub permissions: Vec<String>,
}

impl From<&EffectivePermissions> for PermissionsResponse {
    fn from(permissions: &EffectivePermissions) -> Self {
        Self {
            is_admin: permissions.is_admin(),
            permissions: permissions
                .tokens()
                .into_iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// One row of the permission catalog.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-catalog-entry-response.ts"
)]
pub struct RoleCatalogEntryResponse {
    pub role: String,
    pub department: Option<String>,
    pub permissions: Vec<String>,
}

impl RoleCatalogEntryResponse {
    pub fn new(key: &RoleKey, permissions: &BTreeSet<Permission>) -> Self {
        Self {
            role: key.role_name().to_owned(),
            department: key.department().map(ToOwned::to_owned),
            permissions: permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}
