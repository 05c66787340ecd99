//! Opsdesk API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use opsdesk_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{
    build_app_state, build_postgres_session_store, build_session_layer, connect_and_migrate,
};
use crate::auth::SessionIssuer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = build_postgres_session_store(pool.clone()).await?;
    let session_issuer = SessionIssuer::new(Arc::new(session_store.clone()), config.cookie_secure);
    let app_state = build_app_state(pool, &config, session_issuer).await?;
    let session_layer = build_session_layer(session_store, config.cookie_secure);
    let app = build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "opsdesk-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
