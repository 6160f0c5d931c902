use std::{env, time::Duration};

use anyhow::{Context, Result, anyhow};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SEED_ADMIN_USERNAME: &str = "demo-admin";
const DEFAULT_SEED_ADMIN_PASSWORD: &str = "change-me";

#[derive(Clone, Debug)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
}

/// Process configuration, read once at start-up.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub database_url: String,
    /// Origin of the user/session HTTP backend, without a trailing slash.
    pub backend_origin: String,
    pub backend_timeout: Duration,
    pub port: u16,
    pub seed_admin: SeedAdmin,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let backend_origin = lookup("BACKEND_ORIGIN")
            .context("BACKEND_ORIGIN env var is missing")?
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !backend_origin.starts_with("http://") && !backend_origin.starts_with("https://") {
            return Err(anyhow!(
                "BACKEND_ORIGIN must be an http(s) origin, got {backend_origin:?}"
            ));
        }

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let backend_timeout = lookup("BACKEND_TIMEOUT_SECS")
            .and_then(|secs| secs.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS));

        let seed_admin = SeedAdmin {
            username: lookup("SEED_ADMIN_USERNAME")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SEED_ADMIN_USERNAME.to_string()),
            password: lookup("SEED_ADMIN_PASSWORD")
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_SEED_ADMIN_PASSWORD.to_string()),
        };

        Ok(Self {
            database_url,
            backend_origin,
            backend_timeout,
            port,
            seed_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = PortalConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/portal"),
            ("BACKEND_ORIGIN", "https://backend.example.com/"),
        ]))
        .unwrap();

        assert_eq!(config.backend_origin, "https://backend.example.com");
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
        assert_eq!(config.seed_admin.username, "demo-admin");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = PortalConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/portal"),
            ("BACKEND_ORIGIN", "http://127.0.0.1:9000"),
            ("PORT", "3000"),
            ("BACKEND_TIMEOUT_SECS", "2"),
            ("SEED_ADMIN_USERNAME", "librarian"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.backend_timeout, Duration::from_secs(2));
        assert_eq!(config.seed_admin.username, "librarian");
        assert_eq!(config.seed_admin.password, "change-me");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = PortalConfig::from_lookup(lookup_from(&[(
            "BACKEND_ORIGIN",
            "http://127.0.0.1:9000",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn backend_origin_must_be_http() {
        assert!(
            PortalConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://localhost/portal"),
                ("BACKEND_ORIGIN", "backend.internal"),
            ]))
            .is_err()
        );
    }
}
