use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub security: SecurityConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// When set, registration only accepts emails under this domain
    /// (e.g. "example.com").
    pub allowed_email_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Identity seeded as the first all-access admin on an empty store.
    pub admin_name: String,
    pub admin_email: String,
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
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
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
        if let Ok(v) = env::var("SECURITY_ALLOWED_EMAIL_DOMAIN") {
            self.security.allowed_email_domain = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_NAME") {
            self.bootstrap.admin_name = v;
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_EMAIL") {
            self.bootstrap.admin_email = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            security: SecurityConfig {
                jwt_secret: "rolegate-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                allowed_email_domain: None,
            },
            bootstrap: BootstrapConfig {
                admin_name: "App Admin".to_string(),
                admin_email: "admin@example.com".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from SECURITY_JWT_SECRET
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                allowed_email_domain: None,
            },
            bootstrap: BootstrapConfig {
                admin_name: "App Admin".to_string(),
                admin_email: "admin@example.com".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from SECURITY_JWT_SECRET
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                allowed_email_domain: None,
            },
            bootstrap: BootstrapConfig {
                admin_name: "App Admin".to_string(),
                admin_email: "admin@example.com".to_string(),
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

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 24 * 7);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        // Production refuses to run off a baked-in secret
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }
}
