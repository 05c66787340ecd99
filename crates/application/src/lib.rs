//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod directory_ports;
mod impersonation_service;
mod sign_in_link_service;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
pub use directory_ports::{ProfileRepository, RoleRepository};
pub use impersonation_service::{
    ImpersonationGrant, ImpersonationService, ImpersonationTarget, RedeemedSignIn,
};
pub use sign_in_link_service::{
    NewSignInToken, SignInLink, SignInLinkService, SignInTokenRecord, SignInTokenRepository,
};
