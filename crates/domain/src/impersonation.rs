use std::collections::BTreeSet;

use opsdesk_core::AppError;

use crate::Role;

/// Path inside the authenticated area an impersonated session lands on.
pub const IMPERSONATION_LANDING_PATH: &str = "/dashboard";

/// Query marker appended to the landing URL of an impersonated session.
pub const IMPERSONATED_QUERY_MARKER: &str = "impersonated=true";

const DEFAULT_PRIVILEGED_ROLES: [&str; 2] = ["Administrador", "Desenvolvedor"];

/// Reasons an impersonation request is refused after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationDenial {
    /// The caller targeted their own account.
    SelfTarget,
    /// The caller holds no global impersonator role.
    InsufficientPrivilege,
    /// The target account is not active.
    TargetInactive,
    /// The target holds a protected global role.
    TargetProtected,
}

impl ImpersonationDenial {
    /// Returns the stable reason code exposed to clients.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfTarget => "self",
            Self::InsufficientPrivilege => "insufficient_privilege",
            Self::TargetInactive => "target_inactive",
            Self::TargetProtected => "target_protected",
        }
    }
}

impl From<ImpersonationDenial> for AppError {
    fn from(value: ImpersonationDenial) -> Self {
        AppError::Forbidden(value.as_str().to_owned())
    }
}

/// Which global roles may impersonate and which global roles are shielded from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationPolicy {
    allowed_impersonator_roles: BTreeSet<String>,
    protected_roles: BTreeSet<String>,
}

impl Default for ImpersonationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PRIVILEGED_ROLES, DEFAULT_PRIVILEGED_ROLES)
    }
}

impl ImpersonationPolicy {
    /// Creates a policy from role name lists.
    #[must_use]
    pub fn new<A, P>(allowed_impersonator_roles: A, protected_roles: P) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            allowed_impersonator_roles: allowed_impersonator_roles
                .into_iter()
                .map(Into::into)
                .collect(),
            protected_roles: protected_roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns whether any global role in the set may impersonate.
    #[must_use]
    pub fn can_impersonate(&self, roles: &[Role]) -> bool {
        holds_global_role(roles, &self.allowed_impersonator_roles)
    }

    /// Returns whether any global role in the set is protected from impersonation.
    #[must_use]
    pub fn is_protected(&self, roles: &[Role]) -> bool {
        holds_global_role(roles, &self.protected_roles)
    }

    /// Returns the allowed impersonator role names.
    #[must_use]
    pub fn allowed_impersonator_roles(&self) -> &BTreeSet<String> {
        &self.allowed_impersonator_roles
    }

    /// Returns the protected role names.
    #[must_use]
    pub fn protected_roles(&self) -> &BTreeSet<String> {
        &self.protected_roles
    }
}

// Department-scoped roles never count, even when their name matches.
fn holds_global_role(roles: &[Role], names: &BTreeSet<String>) -> bool {
    roles
        .iter()
        .any(|role| role.is_global() && names.contains(role.name()))
}
