use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub permissions: PermissionsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Where the admin REST API lives and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Per-menu grant lookups slower than this fall back to no access
    pub grant_fetch_timeout_ms: u64,
    pub max_concurrent_fetches: usize,
}

/// Development grant store server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // API overrides
        if let Some(v) = lookup("EDUADMIN_API_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("EDUADMIN_API_TIMEOUT_MS") {
            self.api.request_timeout_ms = v.parse().unwrap_or(self.api.request_timeout_ms);
        }
        if let Some(v) = lookup("EDUADMIN_USER_AGENT") {
            self.api.user_agent = v;
        }

        // Permission loading overrides
        if let Some(v) = lookup("PERMISSIONS_FETCH_TIMEOUT_MS") {
            self.permissions.grant_fetch_timeout_ms = v.parse().unwrap_or(self.permissions.grant_fetch_timeout_ms);
        }
        if let Some(v) = lookup("PERMISSIONS_MAX_CONCURRENT_FETCHES") {
            self.permissions.max_concurrent_fetches = v.parse().unwrap_or(self.permissions.max_concurrent_fetches);
        }

        // Server overrides
        if let Some(v) = lookup("GRANTSTORE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("GRANTSTORE_SEED") {
            self.server.seed_file = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }

        if let Some(v) = lookup("RUST_LOG") {
            self.logging.filter = v;
        }

        self
    }

    fn user_agent() -> String {
        format!("eduadmin-permissions/{}", env!("CARGO_PKG_VERSION"))
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                request_timeout_ms: 30_000,
                user_agent: Self::user_agent(),
            },
            permissions: PermissionsConfig {
                grant_fetch_timeout_ms: 10_000,
                max_concurrent_fetches: 8,
            },
            server: ServerConfig {
                port: 3000,
                seed_file: None,
            },
            logging: LoggingConfig {
                filter: "eduadmin_permissions=debug,tower_http=debug,info".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://admin.staging.example.com".to_string(),
                request_timeout_ms: 15_000,
                user_agent: Self::user_agent(),
            },
            permissions: PermissionsConfig {
                grant_fetch_timeout_ms: 5_000,
                max_concurrent_fetches: 8,
            },
            server: ServerConfig {
                port: 3000,
                seed_file: None,
            },
            logging: LoggingConfig {
                filter: "info".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://admin.example.com".to_string(),
                request_timeout_ms: 10_000,
                user_agent: Self::user_agent(),
            },
            permissions: PermissionsConfig {
                grant_fetch_timeout_ms: 3_000,
                max_concurrent_fetches: 16,
            },
            server: ServerConfig {
                port: 3000,
                seed_file: None,
            },
            logging: LoggingConfig {
                filter: "warn".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.permissions.max_concurrent_fetches, 8);
        assert!(config.server.seed_file.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.base_url.starts_with("https://"));
        assert!(config.permissions.grant_fetch_timeout_ms < AppConfig::development().permissions.grant_fetch_timeout_ms);
    }

    #[test]
    fn test_overrides_apply_and_ignore_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("EDUADMIN_API_URL", "http://grants.internal:9000"),
            ("PERMISSIONS_FETCH_TIMEOUT_MS", "250"),
            ("PERMISSIONS_MAX_CONCURRENT_FETCHES", "lots"),
            ("PORT", "8081"),
            ("GRANTSTORE_SEED", "fixtures/seed.json"),
        ]);
        let config = AppConfig::development().with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://grants.internal:9000");
        assert_eq!(config.permissions.grant_fetch_timeout_ms, 250);
        assert_eq!(config.permissions.max_concurrent_fetches, 8);
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.seed_file, Some(PathBuf::from("fixtures/seed.json")));
    }

    #[test]
    fn test_grantstore_port_wins_over_port() {
        let vars: HashMap<&str, &str> = HashMap::from([("GRANTSTORE_PORT", "4000"), ("PORT", "5000")]);
        let config = AppConfig::development().with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.server.port, 4000);
    }
}
