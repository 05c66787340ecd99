//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod catalog;
mod impersonation;
mod permission;
mod role;
mod security;
mod user;

pub use access::{AccessDecision, AccessRequirement};
pub use catalog::{CatalogEntry, PermissionCatalog};
pub use impersonation::{
    IMPERSONATED_QUERY_MARKER, IMPERSONATION_LANDING_PATH, ImpersonationDenial,
    ImpersonationPolicy,
};
pub use permission::{EffectivePermissions, Permission};
pub use role::{Role, RoleKey, RoleScope};
pub use security::AuditAction;
pub use user::{AccountStatus, EmailAddress, SignInTokenPurpose, UserId, UserProfile};
