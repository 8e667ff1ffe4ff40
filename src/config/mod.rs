use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::bookings::FieldAliases;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<i32>,
    pub debug_logging: bool,
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
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub session_cookie: String,
}

/// Physical names of the collections and columns the booking layer reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub bookings_table: String,
    pub properties_table: String,
    /// Never alias-resolved: the ownership filter must always apply.
    pub owner_column: String,
    pub property_reference_column: String,
    pub aliases: FieldAliases,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            bookings_table: "bookings".to_string(),
            properties_table: "properties".to_string(),
            owner_column: "client_id".to_string(),
            property_reference_column: "property_id".to_string(),
            aliases: FieldAliases::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("BOOKING_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("BOOKING_API_BIND") {
            self.server.bind = v;
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
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
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            if !v.trim().is_empty() {
                self.security.session_cookie = v.trim().to_string();
            }
        }

        // Schema overrides
        if let Ok(v) = env::var("SCHEMA_BOOKINGS_TABLE") {
            self.schema.bookings_table = v;
        }
        if let Ok(v) = env::var("SCHEMA_PROPERTIES_TABLE") {
            self.schema.properties_table = v;
        }
        if let Ok(v) = env::var("SCHEMA_FIELD_ALIASES") {
            match FieldAliases::parse(&v) {
                Ok(aliases) => self.schema.aliases = aliases,
                Err(e) => tracing::warn!("Ignoring SCHEMA_FIELD_ALIASES: {}", e),
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { bind: "0.0.0.0".to_string(), port: 3000 },
            filter: FilterConfig {
                max_limit: Some(1000),
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enable_audit_logging: false,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                session_cookie: "sb-access-token".to_string(),
            },
            schema: SchemaConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { bind: "0.0.0.0".to_string(), port: 3000 },
            filter: FilterConfig {
                max_limit: Some(500),
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                enable_audit_logging: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                session_cookie: "sb-access-token".to_string(),
            },
            schema: SchemaConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { bind: "0.0.0.0".to_string(), port: 3000 },
            filter: FilterConfig {
                max_limit: Some(100),
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                enable_audit_logging: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                session_cookie: "sb-access-token".to_string(),
            },
            schema: SchemaConfig::default(),
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

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.filter.max_limit, Some(1000));
        assert_eq!(config.security.session_cookie, "sb-access-token");
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, Some(100));
        assert!(config.security.enable_audit_logging);
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn test_schema_defaults() {
        let schema = SchemaConfig::default();
        assert_eq!(schema.owner_column, "client_id");
        assert_eq!(schema.property_reference_column, "property_id");
        assert_eq!(
            schema.aliases.candidates("published"),
            Some(&["published".to_string(), "is_published".to_string()][..])
        );
    }
}
