//! Static mapping from role keys to granted permissions.

use std::collections::{BTreeSet, HashMap};

use opsdesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{EffectivePermissions, Permission, Role, RoleKey};

/// One catalog row as stored in a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Role name.
    pub role: NonEmptyString,
    /// Department for scoped roles, `None` for global roles.
    #[serde(default)]
    pub department: Option<NonEmptyString>,
    /// Granted permissions.
    pub permissions: BTreeSet<Permission>,
}

impl CatalogEntry {
    fn key(&self) -> RoleKey {
        RoleKey::new(
            self.role.as_str(),
            self.department.as_ref().map(NonEmptyString::as_str),
        )
    }
}

/// Immutable permission catalog shared by every evaluator.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    entries: HashMap<RoleKey, BTreeSet<Permission>>,
}

impl PermissionCatalog {
    /// Builds a catalog, rejecting duplicate role keys.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> AppResult<Self> {
        let mut catalog = HashMap::new();
        for entry in entries {
            let key = entry.key();
            if catalog.insert(key.clone(), entry.permissions).is_some() {
                return Err(AppError::Conflict(format!(
                    "permission catalog defines role '{key}' more than once"
                )));
            }
        }

        Ok(Self { entries: catalog })
    }

    /// Parses a JSON catalog document: an array of [`CatalogEntry`] objects.
    pub fn from_json(document: &str) -> AppResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(document).map_err(|error| {
            AppError::Validation(format!("invalid permission catalog document: {error}"))
        })?;

        Self::new(entries)
    }

    /// Returns the catalog shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        use Permission::*;

        let rows: [(&str, Option<&str>, &[Permission]); 11] = [
            ("Administrador", None, &[AdminAll]),
            ("Desenvolvedor", None, &[AdminAll]),
            (
                "Gerente",
                None,
                &[
                    TicketsView,
                    TicketsCreate,
                    TicketsUpdate,
                    TicketsAssign,
                    ChecklistsView,
                    ChecklistsCreate,
                    ChecklistsUpdate,
                    UnitsView,
                    UnitsCreate,
                    UnitsUpdate,
                    DepartmentsView,
                    UsersView,
                    UsersUpdate,
                    RolesView,
                    StockView,
                    StockAdjust,
                    AuditView,
                ],
            ),
            (
                "Supervisor",
                None,
                &[
                    TicketsView,
                    TicketsCreate,
                    TicketsUpdate,
                    TicketsAssign,
                    ChecklistsView,
                    ChecklistsExecute,
                    UnitsView,
                    DepartmentsView,
                    UsersView,
                    StockView,
                ],
            ),
            ("Colaborador", None, &[TicketsView, TicketsCreate, ChecklistsView]),
            (
                "Manobrista",
                Some("Operações"),
                &[TicketsView, TicketsCreate, ChecklistsView, ChecklistsExecute, UnitsView],
            ),
            (
                "Coordenador",
                Some("Operações"),
                &[
                    TicketsView,
                    TicketsCreate,
                    TicketsUpdate,
                    TicketsAssign,
                    ChecklistsView,
                    ChecklistsCreate,
                    ChecklistsUpdate,
                    ChecklistsExecute,
                    UnitsView,
                    UnitsUpdate,
                    UsersView,
                ],
            ),
            (
                "Técnico",
                Some("Manutenção"),
                &[TicketsView, TicketsUpdate, ChecklistsView, ChecklistsExecute, UnitsView],
            ),
            (
                "Atendente",
                Some("Atendimento"),
                &[TicketsView, TicketsCreate, TicketsUpdate, UnitsView],
            ),
            (
                "Estoquista",
                Some("Almoxarifado"),
                &[StockView, StockAdjust, UnitsView],
            ),
            (
                "Analista",
                Some("Recursos Humanos"),
                &[UsersView, UsersCreate, UsersUpdate, DepartmentsView, RolesView],
            ),
        ];

        let entries = rows
            .into_iter()
            .map(|(role_name, department, permissions)| {
                (
                    RoleKey::new(role_name, department),
                    permissions.iter().copied().collect::<BTreeSet<_>>(),
                )
            })
            .collect();

        Self { entries }
    }

    /// Returns the permissions granted by a role, if the catalog knows it.
    #[must_use]
    pub fn permissions_for(&self, role: &Role) -> Option<&BTreeSet<Permission>> {
        self.entries.get(&role.key())
    }

    /// Computes the effective permissions of a role set as the union of its grants.
    ///
    /// Roles missing from the catalog contribute nothing.
    #[must_use]
    pub fn evaluate(&self, roles: &[Role]) -> EffectivePermissions {
        let mut permissions = EffectivePermissions::empty();
        for role in roles {
            if let Some(grants) = self.permissions_for(role) {
                permissions.extend(grants.iter().copied());
            }
        }

        permissions
    }

    /// Returns whether at least one role grants the permission, directly or by wildcard.
    #[must_use]
    pub fn is_grantable(&self, permission: Permission) -> bool {
        self.entries.values().any(|grants| {
            grants.contains(&permission) || grants.contains(&Permission::AdminAll)
        })
    }

    /// Returns every entry ordered by role name, then department.
    #[must_use]
    pub fn entries(&self) -> Vec<(&RoleKey, &BTreeSet<Permission>)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|(left, _), (right, _)| {
            (left.role_name(), left.department()).cmp(&(right.role_name(), right.department()))
        });
        entries
    }

    /// Returns the number of role entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
