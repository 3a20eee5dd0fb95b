use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub containers: ContainerConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Public URL of this control plane, handed to projects as `forgeURL`.
    pub base_url: String,
    /// Domain projects are hosted under (`<project>.<domain>`).
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Stub,
    Launcher,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub driver: DriverKind,
    pub launcher_url: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
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
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("FLOWFORGE_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("FLOWFORGE_BASE_URL") {
            self.server.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("FLOWFORGE_DOMAIN") {
            self.server.domain = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Container driver overrides
        if let Ok(v) = env::var("CONTAINER_DRIVER") {
            self.containers.driver = match v.as_str() {
                "launcher" => DriverKind::Launcher,
                _ => DriverKind::Stub,
            };
        }
        if let Ok(v) = env::var("CONTAINER_LAUNCHER_URL") {
            self.containers.launcher_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Ok(v) = env::var("CONTAINER_REQUEST_TIMEOUT_SECS") {
            self.containers.request_timeout_secs = v.parse().unwrap_or(self.containers.request_timeout_secs);
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = v.parse().unwrap_or(self.pagination.default_limit);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().unwrap_or(self.pagination.max_limit);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                base_url: "http://localhost:3000".to_string(),
                domain: "localhost".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            containers: ContainerConfig {
                driver: DriverKind::Stub,
                launcher_url: None,
                request_timeout_secs: 30,
            },
            pagination: PaginationConfig {
                default_limit: 30,
                max_limit: 1000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                base_url: "https://forge.staging.example.com".to_string(),
                domain: "staging.example.com".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://forge.staging.example.com".to_string()],
            },
            containers: ContainerConfig {
                driver: DriverKind::Launcher,
                launcher_url: None,
                request_timeout_secs: 15,
            },
            pagination: PaginationConfig {
                default_limit: 30,
                max_limit: 500,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                base_url: "https://forge.example.com".to_string(),
                domain: "example.com".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://forge.example.com".to_string()],
            },
            containers: ContainerConfig {
                driver: DriverKind::Launcher,
                launcher_url: None,
                request_timeout_secs: 10,
            },
            pagination: PaginationConfig {
                default_limit: 30,
                max_limit: 100,
            },
        }
    }

    /// URL the project runtime uses for flow/credential storage.
    pub fn storage_url(&self) -> String {
        format!("{}/storage", self.server.base_url)
    }

    /// URL the project runtime posts audit events to.
    pub fn audit_url(&self) -> String {
        format!("{}/logging", self.server.base_url)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.containers.driver, DriverKind::Stub);
        assert_eq!(config.pagination.default_limit, 30);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.containers.driver, DriverKind::Launcher);
        assert_eq!(config.pagination.max_limit, 100);
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn runtime_urls_hang_off_base_url() {
        let mut config = AppConfig::development();
        config.server.base_url = "https://forge.test".to_string();
        assert_eq!(config.storage_url(), "https://forge.test/storage");
        assert_eq!(config.audit_url(), "https://forge.test/logging");
    }
}
