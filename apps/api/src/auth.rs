mod bootstrap;
mod session;
mod session_issuer;
mod sign_in_link;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler};
pub use session_issuer::{SESSION_COOKIE_NAME, SESSION_INACTIVITY, SessionIssuer};
pub use sign_in_link::sign_in_link_handler;

pub const SESSION_USER_KEY: &str = "user_identity";
