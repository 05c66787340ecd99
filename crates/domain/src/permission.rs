use std::collections::BTreeSet;
use std::str::FromStr;

use opsdesk_core::AppError;
use serde::{Deserialize, Serialize};

/// Permission tokens that roles can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Permission {
    /// Allows reading helpdesk tickets.
    TicketsView,
    /// Allows opening helpdesk tickets.
    TicketsCreate,
    /// Allows editing helpdesk tickets.
    TicketsUpdate,
    /// Allows deleting helpdesk tickets.
    TicketsDelete,
    /// Allows assigning tickets to other users.
    TicketsAssign,
    /// Allows reading recurring checklists.
    ChecklistsView,
    /// Allows creating checklist templates.
    ChecklistsCreate,
    /// Allows editing checklist templates.
    ChecklistsUpdate,
    /// Allows deleting checklist templates.
    ChecklistsDelete,
    /// Allows filling in checklist executions.
    ChecklistsExecute,
    /// Allows reading units and locations.
    UnitsView,
    /// Allows registering units.
    UnitsCreate,
    /// Allows editing units.
    UnitsUpdate,
    /// Allows deleting units.
    UnitsDelete,
    /// Allows reading departments.
    DepartmentsView,
    /// Allows managing departments.
    DepartmentsManage,
    /// Allows listing users.
    UsersView,
    /// Allows inviting users.
    UsersCreate,
    /// Allows editing user profiles.
    UsersUpdate,
    /// Allows deactivating or deleting users.
    UsersDelete,
    /// Allows operating the application as another user.
    UsersImpersonate,
    /// Allows reading roles and assignments.
    RolesView,
    /// Allows assigning and removing roles.
    RolesManage,
    /// Allows reading stock levels.
    StockView,
    /// Allows adjusting stock counters.
    StockAdjust,
    /// Allows reading the audit log.
    AuditView,
    /// Wildcard: implies every other permission.
    AdminAll,
}

impl Permission {
    /// Returns the stable token value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TicketsView => "tickets:view",
            Self::TicketsCreate => "tickets:create",
            Self::TicketsUpdate => "tickets:update",
            Self::TicketsDelete => "tickets:delete",
            Self::TicketsAssign => "tickets:assign",
            Self::ChecklistsView => "checklists:view",
            Self::ChecklistsCreate => "checklists:create",
            Self::ChecklistsUpdate => "checklists:update",
            Self::ChecklistsDelete => "checklists:delete",
            Self::ChecklistsExecute => "checklists:execute",
            Self::UnitsView => "units:view",
            Self::UnitsCreate => "units:create",
            Self::UnitsUpdate => "units:update",
            Self::UnitsDelete => "units:delete",
            Self::DepartmentsView => "departments:view",
            Self::DepartmentsManage => "departments:manage",
            Self::UsersView => "users:view",
            Self::UsersCreate => "users:create",
            Self::UsersUpdate => "users:update",
            Self::UsersDelete => "users:delete",
            Self::UsersImpersonate => "users:impersonate",
            Self::RolesView => "roles:view",
            Self::RolesManage => "roles:manage",
            Self::StockView => "stock:view",
            Self::StockAdjust => "stock:adjust",
            Self::AuditView => "audit:view",
            Self::AdminAll => "admin:all",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::TicketsView,
            Permission::TicketsCreate,
            Permission::TicketsUpdate,
            Permission::TicketsDelete,
            Permission::TicketsAssign,
            Permission::ChecklistsView,
            Permission::ChecklistsCreate,
            Permission::ChecklistsUpdate,
            Permission::ChecklistsDelete,
            Permission::ChecklistsExecute,
            Permission::UnitsView,
            Permission::UnitsCreate,
            Permission::UnitsUpdate,
            Permission::UnitsDelete,
            Permission::DepartmentsView,
            Permission::DepartmentsManage,
            Permission::UsersView,
            Permission::UsersCreate,
            Permission::UsersUpdate,
            Permission::UsersDelete,
            Permission::UsersImpersonate,
            Permission::RolesView,
            Permission::RolesManage,
            Permission::StockView,
            Permission::StockAdjust,
            Permission::AuditView,
            Permission::AdminAll,
        ];

        ALL
    }

    /// Returns whether this is the wildcard token.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::AdminAll)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.as_str().to_owned()
    }
}

/// Effective permission set computed from a user's roles.
///
/// Holding `admin:all` collapses the set into [`EffectivePermissions::Unrestricted`];
/// the wildcard is answered at query time and never expanded into concrete tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectivePermissions {
    /// Every permission is granted, including tokens unknown to the catalog.
    Unrestricted,
    /// Only the listed permissions are granted.
    Granted(BTreeSet<Permission>),
}

impl Default for EffectivePermissions {
    fn default() -> Self {
        Self::empty()
    }
}

impl EffectivePermissions {
    /// Returns a set granting nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::Granted(BTreeSet::new())
    }

    /// Builds a set from granted permissions.
    #[must_use]
    pub fn from_grants(grants: impl IntoIterator<Item = Permission>) -> Self {
        let mut permissions = Self::empty();
        permissions.extend(grants);
        permissions
    }

    /// Rebuilds a set from transported token strings, ignoring unknown tokens.
    #[must_use]
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::from_grants(
            tokens
                .into_iter()
                .filter_map(|token| Permission::from_str(token.as_ref()).ok()),
        )
    }

    /// Adds grants to the set.
    pub fn extend(&mut self, grants: impl IntoIterator<Item = Permission>) {
        for grant in grants {
            match self {
                Self::Unrestricted => return,
                Self::Granted(_) if grant.is_wildcard() => *self = Self::Unrestricted,
                Self::Granted(set) => {
                    set.insert(grant);
                }
            }
        }
    }

    /// Returns whether the token is granted.
    #[must_use]
    pub fn has(&self, token: impl AsRef<str>) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Granted(set) => Permission::from_str(token.as_ref())
                .map(|permission| set.contains(&permission))
                .unwrap_or(false),
        }
    }

    /// Returns whether at least one token is granted.
    #[must_use]
    pub fn has_any<I, T>(&self, tokens: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        tokens.into_iter().any(|token| self.has(token))
    }

    /// Returns whether every token is granted.
    #[must_use]
    pub fn has_all<I, T>(&self, tokens: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        tokens.into_iter().all(|token| self.has(token))
    }

    /// Returns whether the wildcard permission is held.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Returns the granted tokens for transport. The wildcard is reported as `admin:all`.
    #[must_use]
    pub fn tokens(&self) -> Vec<Permission> {
        match self {
            Self::Unrestricted => vec![Permission::AdminAll],
            Self::Granted(set) => set.iter().copied().collect(),
        }
    }
}
