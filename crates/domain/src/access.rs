use serde::{Deserialize, Serialize};

use crate::{EffectivePermissions, Permission};

/// Requirement attached to a protected region or route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "permissions")]
pub enum AccessRequirement {
    /// A single permission must be held.
    Permission(Permission),
    /// At least one of the permissions must be held.
    AnyOf(Vec<Permission>),
    /// Every permission must be held.
    AllOf(Vec<Permission>),
    /// The wildcard permission must be held.
    Admin,
}

impl AccessRequirement {
    /// Returns whether the permission set satisfies the requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, permissions: &EffectivePermissions) -> bool {
        match self {
            Self::Permission(permission) => permissions.has(permission),
            Self::AnyOf(required) => permissions.has_any(required),
            Self::AllOf(required) => permissions.has_all(required),
            Self::Admin => permissions.is_admin(),
        }
    }

    /// Returns a short description used in denial messages.
    #[must_use]
    pub fn describe(&self) -> String {
        let join = |permissions: &[Permission]| {
            permissions
                .iter()
                .map(Permission::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        match self {
            Self::Permission(permission) => format!("permission '{}'", permission.as_str()),
            Self::AnyOf(required) => format!("any of [{}]", join(required)),
            Self::AllOf(required) => format!("all of [{}]", join(required)),
            Self::Admin => "administrator access".to_owned(),
        }
    }
}

/// Outcome of checking a requirement against possibly not-yet-loaded permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Permissions are still loading; nothing may be shown.
    Pending,
    /// The requirement is satisfied.
    Allowed,
    /// The requirement is not satisfied.
    Denied,
}

impl AccessDecision {
    /// Resolves a requirement; `None` means the roles have not been loaded yet.
    #[must_use]
    pub fn resolve(
        requirement: &AccessRequirement,
        permissions: Option<&EffectivePermissions>,
    ) -> Self {
        match permissions {
            None => Self::Pending,
            Some(permissions) if requirement.is_satisfied_by(permissions) => Self::Allowed,
            Some(_) => Self::Denied,
        }
    }

    /// Returns whether protected content may be rendered.
    #[must_use]
    pub fn renders_content(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use crate::{EffectivePermissions, Permission};

    use super::{AccessDecision, AccessRequirement};

    #[test]
    fn pending_permissions_never_render_content() {
        let decision = AccessDecision::resolve(&AccessRequirement::Admin, None);
        assert_eq!(decision, AccessDecision::Pending);
        assert!(!decision.renders_content());
    }

    #[test]
    fn any_of_requires_one_grant() {
        let permissions = EffectivePermissions::from_grants([Permission::UnitsView]);
        let requirement =
            AccessRequirement::AnyOf(vec![Permission::UnitsView, Permission::UnitsDelete]);
        assert_eq!(
            AccessDecision::resolve(&requirement, Some(&permissions)),
            AccessDecision::Allowed
        );
    }

    #[test]
    fn all_of_requires_every_grant() {
        let permissions = EffectivePermissions::from_grants([Permission::UnitsView]);
        let requirement =
            AccessRequirement::AllOf(vec![Permission::UnitsView, Permission::UnitsDelete]);
        assert_eq!(
            AccessDecision::resolve(&requirement, Some(&permissions)),
            AccessDecision::Denied
        );
    }

    #[test]
    fn admin_requirement_needs_wildcard() {
        let manager = EffectivePermissions::from_grants(
            Permission::all().iter().copied().filter(|permission| !permission.is_wildcard()),
        );
        assert!(!AccessRequirement::Admin.is_satisfied_by(&manager));
        assert!(AccessRequirement::Admin.is_satisfied_by(&EffectivePermissions::Unrestricted));
    }

    #[test]
    fn describe_lists_tokens() {
        let requirement =
            AccessRequirement::AnyOf(vec![Permission::StockView, Permission::StockAdjust]);
        assert_eq!(requirement.describe(), "any of [stock:view, stock:adjust]");
    }
}
