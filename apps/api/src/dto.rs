mod auth;
mod common;
mod impersonation;
mod permissions;

pub use auth::{BootstrapRequest, SignInLinkQuery, UserIdentityResponse};
pub use common::HealthResponse;
pub use impersonation::{ImpersonateRequest, ImpersonateResponse};
pub use permissions::{PermissionsResponse, RoleCatalogEntryResponse};
