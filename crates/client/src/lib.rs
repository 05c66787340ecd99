//! Client-side access gating and impersonation session state.

#![forbid(unsafe_code)]

mod access_guard;
mod http_session_client;
mod impersonation_session;
mod key_value_store;
mod navigator;
mod session_client;

pub use access_guard::{AccessGuard, PermissionState};
pub use http_session_client::{HttpSessionClient, ImpersonationLink};
pub use impersonation_session::{
    IMPERSONATION_KEY, ImpersonationBanner, ImpersonationRecord, ImpersonationSession,
    ORIGINAL_SESSION_KEY, SIGN_IN_PATH,
};
pub use key_value_store::{JsonFileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use navigator::Navigator;
pub use session_client::{SessionClient, SessionRef};
