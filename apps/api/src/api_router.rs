use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use opsdesk_core::AppError;
use opsdesk_domain::{AccessRequirement, Permission};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;


pub fn build_router<S>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let catalog_routes = Router::new()
        .route("/api/roles/catalog", get(handlers::permissions::role_catalog_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_access,
        ))
        .layer(axum::Extension(AccessRequirement::Permission(
            Permission::RolesView,
        )));

    let protected_routes = Router::new()
        .route(
            "/api/me/permissions",
            get(handlers::permissions::my_permissions_handler),
        )
        .merge(catalog_routes)
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/sign-in", get(auth::sign_in_link_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        // Checks its own origin once the caller is known.
        .route(
            "/api/impersonate",
            post(handlers::impersonation::impersonate_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
