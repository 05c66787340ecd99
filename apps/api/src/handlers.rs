pub mod health;
pub mod impersonation;
pub mod permissions;
