use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: Uuid,
    display_name: String,
    email: Option<String>,
    #[serde(default)]
    impersonated_by: Option<Uuid>,
}

impl UserIdentity {
    /// Creates an identity for a regular sign-in.
    #[must_use]
    pub fn new(user_id: Uuid, display_name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email,
            impersonated_by: None,
        }
    }

    /// Marks the identity as established through impersonation by another user.
    #[must_use]
    pub fn with_impersonator(mut self, impersonator_id: Uuid) -> Self {
        self.impersonated_by = Some(impersonator_id);
        self
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the user that started this impersonated session, if any.
    #[must_use]
    pub fn impersonated_by(&self) -> Option<Uuid> {
        self.impersonated_by
    }

    /// Returns whether the session was established through impersonation.
    #[must_use]
    pub fn is_impersonated(&self) -> bool {
        self.impersonated_by.is_some()
    }
}
