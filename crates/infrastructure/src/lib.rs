//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_directory_repository;
mod in_memory_sign_in_token_repository;
mod permission_catalog_loader;
mod postgres_audit_repository;
mod postgres_directory_repository;
mod postgres_sign_in_token_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_directory_repository::InMemoryDirectoryRepository;
pub use in_memory_sign_in_token_repository::InMemorySignInTokenRepository;
pub use permission_catalog_loader::load_permission_catalog;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_directory_repository::PostgresDirectoryRepository;
pub use postgres_sign_in_token_repository::PostgresSignInTokenRepository;
