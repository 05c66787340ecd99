use std::sync::Arc;

use opsdesk_application::{AuthorizationService, ImpersonationService, ProfileRepository};

use crate::auth::SessionIssuer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub impersonation_service: ImpersonationService,
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub session_issuer: SessionIssuer,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
