use std::str::FromStr;

use opsdesk_core::AppError;
use opsdesk_domain::{AccountStatus, EmailAddress, Role, UserId, UserProfile};
use sqlx::FromRow;
use tracing::{debug, warn};

/// Joined assignment row. Every column is nullable because of the outer joins.
#[derive(Debug, Clone, FromRow)]
pub(super) struct RoleRow {
    pub(super) role_name: Option<String>,
    pub(super) is_global: Option<bool>,
    pub(super) department_name: Option<String>,
}

#[derive(Debug, FromRow)]
pub(super) struct ProfileRow {
    id: uuid::Uuid,
    full_name: String,
    email: String,
    status: String,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let status = AccountStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid status for profile '{}': {error}", row.id))
        })?;
        let email = EmailAddress::new(row.email).map_err(|error| {
            AppError::Internal(format!("invalid email for profile '{}': {error}", row.id))
        })?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            full_name: row.full_name,
            email,
            status,
        })
    }
}

/// Decodes joined rows into roles, skipping assignments that cannot form a valid role.
pub(super) fn decode_role_rows(user_id: UserId, rows: Vec<RoleRow>) -> Vec<Role> {
    rows.into_iter()
        .filter_map(|row| {
            let Some(role_name) = row.role_name else {
                debug!(user_id = %user_id, "skipping assignment without a role");
                return None;
            };

            let is_global = row.is_global.unwrap_or(false);
            match Role::from_parts(&role_name, is_global, row.department_name.as_deref()) {
                Ok(role) => Some(role),
                Err(error) => {
                    warn!(
                        user_id = %user_id,
                        role_name = %role_name,
                        %error,
                        "skipping inconsistent role assignment"
                    );
                    None
                }
            }
        })
        .collect()
}
