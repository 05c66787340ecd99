use opsdesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Where a role applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "department")]
pub enum RoleScope {
    /// Applies system-wide.
    Global,
    /// Limited to one named department.
    Department(NonEmptyString),
}

/// A role held by a user.
///
/// A global role never carries a department; the scope enum makes the
/// combination unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    name: NonEmptyString,
    scope: RoleScope,
}

impl Role {
    /// Creates a global role.
    pub fn global(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            scope: RoleScope::Global,
        })
    }

    /// Creates a role scoped to a department.
    pub fn scoped(name: impl Into<String>, department: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            scope: RoleScope::Department(NonEmptyString::new(department)?),
        })
    }

    /// Builds a role from its stored columns, enforcing the scope invariant.
    pub fn from_parts(name: &str, is_global: bool, department: Option<&str>) -> AppResult<Self> {
        match (is_global, department) {
            (true, None) => Self::global(name),
            (true, Some(department)) => Err(AppError::Validation(format!(
                "global role '{name}' must not reference department '{department}'"
            ))),
            (false, Some(department)) => Self::scoped(name, department),
            (false, None) => Err(AppError::Validation(format!(
                "department-scoped role '{name}' has no department"
            ))),
        }
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role scope.
    #[must_use]
    pub fn scope(&self) -> &RoleScope {
        &self.scope
    }

    /// Returns whether the role applies system-wide.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self.scope, RoleScope::Global)
    }

    /// Returns the department name for scoped roles.
    #[must_use]
    pub fn department(&self) -> Option<&str> {
        match &self.scope {
            RoleScope::Global => None,
            RoleScope::Department(department) => Some(department.as_str()),
        }
    }

    /// Returns the catalog lookup key.
    #[must_use]
    pub fn key(&self) -> RoleKey {
        RoleKey::new(self.name(), self.department())
    }
}

/// Catalog lookup key: role name plus department name for scoped roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleKey {
    role_name: String,
    department: Option<String>,
}

impl RoleKey {
    /// Creates a lookup key.
    #[must_use]
    pub fn new(role_name: impl Into<String>, department: Option<&str>) -> Self {
        Self {
            role_name: role_name.into(),
            department: department.map(ToOwned::to_owned),
        }
    }

    /// Returns the role name.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }

    /// Returns the department, `None` for global roles.
    #[must_use]
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }
}

impl std::fmt::Display for RoleKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.department {
            Some(department) => write!(formatter, "{}@{department}", self.role_name),
            None => formatter.write_str(self.role_name.as_str()),
        }
    }
}
