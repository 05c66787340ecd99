use std::sync::Arc;

use opsdesk_application::{
    AuthorizationService, ImpersonationService, ProfileRepository, SignInLinkService,
};
use opsdesk_core::AppError;
use opsdesk_infrastructure::{
    PostgresAuditRepository, PostgresDirectoryRepository, PostgresSignInTokenRepository,
    load_permission_catalog,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::auth::SessionIssuer;
use crate::state::AppState;

pub async fn build_app_state(
    pool: PgPool,
    config: &ApiConfig,
    session_issuer: SessionIssuer,
) -> Result<AppState, AppError> {
    let catalog = load_permission_catalog(config.permission_catalog_path.as_deref()).await?;
    info!(roles = catalog.len(), "permission catalog ready");

    let directory_repository = Arc::new(PostgresDirectoryRepository::new(pool.clone()));
    let profile_repository: Arc<dyn ProfileRepository> = directory_repository.clone();
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let token_repository = Arc::new(PostgresSignInTokenRepository::new(pool));

    let link_service = SignInLinkService::new(
        token_repository,
        config.public_api_url.clone(),
        config.impersonation_link_ttl(),
    );

    Ok(AppState {
        authorization_service: AuthorizationService::new(
            directory_repository.clone(),
            Arc::new(catalog),
        ),
        impersonation_service: ImpersonationService::new(
            directory_repository,
            profile_repository.clone(),
            audit_repository,
            link_service,
            config.impersonation_policy(),
            config.frontend_url.clone(),
        ),
        profile_repository,
        session_issuer,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    })
}
