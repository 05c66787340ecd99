use async_trait::async_trait;
use opsdesk_core::AppResult;

/// Moves the user interface to another route.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigates to an application path such as `/` or `/dashboard`.
    async fn navigate(&self, path: &str) -> AppResult<()>;
}
