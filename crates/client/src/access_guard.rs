use opsdesk_domain::{AccessDecision, AccessRequirement, EffectivePermissions};

/// Loading state of the current user's permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PermissionState {
    /// Roles have not been fetched yet.
    #[default]
    Pending,
    /// Roles were fetched and evaluated.
    Loaded(EffectivePermissions),
}

/// Render gate for a protected region of the interface.
///
/// Content is produced only once permissions are loaded and satisfy the
/// requirement. Pending and denied states render nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGuard {
    requirement: AccessRequirement,
    state: PermissionState,
}

impl AccessGuard {
    /// Creates a guard in the pending state.
    #[must_use]
    pub fn new(requirement: AccessRequirement) -> Self {
        Self {
            requirement,
            state: PermissionState::Pending,
        }
    }

    /// Records the evaluated permissions.
    pub fn load(&mut self, permissions: EffectivePermissions) {
        self.state = PermissionState::Loaded(permissions);
    }

    /// Returns the guarded requirement.
    #[must_use]
    pub fn requirement(&self) -> &AccessRequirement {
        &self.requirement
    }

    /// Returns the current loading state.
    #[must_use]
    pub fn state(&self) -> &PermissionState {
        &self.state
    }

    /// Returns the current decision.
    #[must_use]
    pub fn decision(&self) -> AccessDecision {
        let permissions = match &self.state {
            PermissionState::Pending => None,
            PermissionState::Loaded(permissions) => Some(permissions),
        };

        AccessDecision::resolve(&self.requirement, permissions)
    }

    /// Produces the protected content when access is allowed.
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Option<T> {
        self.decision().renders_content().then(content)
    }
}
