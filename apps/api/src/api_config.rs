use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use opsdesk_core::AppError;
use opsdesk_domain::ImpersonationPolicy;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_LINK_TTL_SECONDS: i64 = 300;
const MAX_LINK_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub public_api_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub permission_catalog_path: Option<PathBuf>,
    pub impersonation_allowed_roles: Option<Vec<String>>,
    pub impersonation_protected_roles: Option<Vec<String>>,
    pub impersonation_link_ttl_seconds: i64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
        };

        let database_url = required("DATABASE_URL")?;
        let frontend_url = normalize_url(
            "FRONTEND_URL",
            optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned()),
        )?;
        let public_api_url = normalize_url(
            "PUBLIC_API_URL",
            optional("PUBLIC_API_URL").unwrap_or_else(|| "http://localhost:3001".to_owned()),
        )?;
        let bootstrap_token = required("AUTH_BOOTSTRAP_TOKEN")?;

        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = optional("API_PORT")
            .map(|value| {
                value
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))
            })
            .transpose()?
            .unwrap_or(3001);
        let cookie_secure = optional("SESSION_COOKIE_SECURE")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));

        let impersonation_link_ttl_seconds = optional("IMPERSONATION_LINK_TTL_SECONDS")
            .map(|value| match value.parse::<i64>() {
                Ok(seconds) if (1..=MAX_LINK_TTL_SECONDS).contains(&seconds) => Ok(seconds),
                Ok(_) => Err(AppError::Validation(format!(
                    "IMPERSONATION_LINK_TTL_SECONDS must be between 1 and {MAX_LINK_TTL_SECONDS}"
                ))),
                Err(error) => Err(AppError::Validation(format!(
                    "invalid IMPERSONATION_LINK_TTL_SECONDS: {error}"
                ))),
            })
            .transpose()?
            .unwrap_or(DEFAULT_LINK_TTL_SECONDS);

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            public_api_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            permission_catalog_path: optional("PERMISSION_CATALOG_PATH").map(PathBuf::from),
            impersonation_allowed_roles: optional("IMPERSONATION_ALLOWED_ROLES")
                .map(|value| parse_role_list(&value)),
            impersonation_protected_roles: optional("IMPERSONATION_PROTECTED_ROLES")
                .map(|value| parse_role_list(&value)),
            impersonation_link_ttl_seconds,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// Unset role lists fall back to the built-in defaults independently.
    pub fn impersonation_policy(&self) -> ImpersonationPolicy {
        let defaults = ImpersonationPolicy::default();
        let allowed = self
            .impersonation_allowed_roles
            .clone()
            .unwrap_or_else(|| defaults.allowed_impersonator_roles().iter().cloned().collect());
        let protected = self
            .impersonation_protected_roles
            .clone()
            .unwrap_or_else(|| defaults.protected_roles().iter().cloned().collect());

        ImpersonationPolicy::new(allowed, protected)
    }

    pub fn impersonation_link_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.impersonation_link_ttl_seconds)
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn normalize_url(name: &str, value: String) -> Result<String, AppError> {
    Url::parse(&value).map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?;
    Ok(value.trim_end_matches('/').to_owned())
}

fn parse_role_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use opsdesk_core::AppError;
    use opsdesk_domain::Role;

    use super::ApiConfig;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(false, |name| values.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/opsdesk"),
        ("AUTH_BOOTSTRAP_TOKEN", "dev-token"),
    ];

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let config = config_from(&REQUIRED).unwrap_or_else(|error| panic!("config: {error}"));

        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.public_api_url, "http://localhost:3001");
        assert_eq!(config.api_port, 3001);
        assert!(!config.cookie_secure);
        assert_eq!(config.impersonation_link_ttl_seconds, 300);
        assert!(config.permission_catalog_path.is_none());
    }

    #[test]
    fn missing_bootstrap_token_is_rejected() {
        let result = config_from(&[("DATABASE_URL", "postgres://localhost/opsdesk")]);
        assert!(matches!(result, Err(AppError::Validation(message)) if message.contains("AUTH_BOOTSTRAP_TOKEN")));
    }

    #[test]
    fn role_lists_are_trimmed_and_override_policy() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("IMPERSONATION_ALLOWED_ROLES", " Suporte , ,Administrador"));
        let config = config_from(&pairs).unwrap_or_else(|error| panic!("config: {error}"));

        let policy = config.impersonation_policy();
        let support = Role::global("Suporte").unwrap_or_else(|_| panic!("role"));
        let developer = Role::global("Desenvolvedor").unwrap_or_else(|_| panic!("role"));
        assert!(policy.can_impersonate(std::slice::from_ref(&support)));
        assert!(!policy.can_impersonate(std::slice::from_ref(&developer)));
        assert!(policy.is_protected(&[developer]));
    }

    #[test]
    fn invalid_numbers_and_urls_are_rejected() {
        let mut bad_ttl = REQUIRED.to_vec();
        bad_ttl.push(("IMPERSONATION_LINK_TTL_SECONDS", "0"));
        assert!(config_from(&bad_ttl).is_err());

        let mut huge_ttl = REQUIRED.to_vec();
        huge_ttl.push(("IMPERSONATION_LINK_TTL_SECONDS", "86401"));
        assert!(config_from(&huge_ttl).is_err());

        let mut day_ttl = REQUIRED.to_vec();
        day_ttl.push(("IMPERSONATION_LINK_TTL_SECONDS", "86400"));
        let config = config_from(&day_ttl).unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(config.impersonation_link_ttl_seconds, 86_400);

        let mut bad_url = REQUIRED.to_vec();
        bad_url.push(("FRONTEND_URL", "not a url"));
        assert!(config_from(&bad_url).is_err());

        let mut trailing = REQUIRED.to_vec();
        trailing.push(("FRONTEND_URL", "https://ops.example.com/"));
        let config = config_from(&trailing).unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(config.frontend_url, "https://ops.example.com");
    }
}
