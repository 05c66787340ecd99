use std::path::Path;

use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::PermissionCatalog;
use tracing::info;

/// Loads the permission catalog from a JSON document, or the built-in catalog when no path is set.
pub async fn load_permission_catalog(path: Option<&Path>) -> AppResult<PermissionCatalog> {
    let Some(path) = path else {
        let catalog = PermissionCatalog::builtin();
        info!(roles = catalog.len(), "using built-in permission catalog");
        return Ok(catalog);
    };

    let document = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to read permission catalog '{}': {error}",
            path.display()
        ))
    })?;

    let catalog = PermissionCatalog::from_json(&document)?;
    info!(path = %path.display(), roles = catalog.len(), "loaded permission catalog");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use opsdesk_core::AppError;
    use opsdesk_domain::{Permission, Role};

    use super::load_permission_catalog;

    async fn write_document(contents: &str) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("opsdesk-catalog-{}.json", uuid::Uuid::new_v4()));
        if let Err(error) = tokio::fs::write(&path, contents).await {
            panic!("failed to write catalog fixture: {error}");
        }
        path
    }

    #[tokio::test]
    async fn missing_path_falls_back_to_builtin() {
        let catalog = load_permission_catalog(None)
            .await
            .unwrap_or_else(|error| panic!("builtin catalog failed: {error}"));
        assert!(!catalog.is_empty());
    }

    #[tokio::test]
    async fn document_replaces_builtin_catalog() {
        let path = write_document(
            r#"[{"role": "Suporte", "permissions": ["users:view", "users:impersonate"]}]"#,
        )
        .await;

        let catalog = load_permission_catalog(Some(&path))
            .await
            .unwrap_or_else(|error| panic!("catalog failed: {error}"));
        let _ = tokio::fs::remove_file(&path).await;

        let roles = [Role::global("Suporte").unwrap_or_else(|_| panic!("role"))];
        let permissions = catalog.evaluate(&roles);
        assert_eq!(catalog.len(), 1);
        assert!(permissions.has(Permission::UsersImpersonate));
        assert!(!permissions.has("users:delete"));
    }

    #[tokio::test]
    async fn unknown_token_in_document_is_rejected() {
        let path = write_document(r#"[{"role": "Suporte", "permissions": ["users:fly"]}]"#).await;

        let result = load_permission_catalog(Some(&path)).await;
        let _ = tokio::fs::remove_file(&path).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn unreadable_path_is_internal_error() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        let result = load_permission_catalog(Some(&path)).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
