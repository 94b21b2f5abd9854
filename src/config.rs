use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::env;

pub use config::ConfigError;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub bootstrap: BootstrapSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Answer cross-origin requests from any origin
    pub permissive_cors: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Full connection string; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database_name: String,
    pub max_connections: u32,
    pub require_ssl: bool,
    pub run_migrations: bool,
}

#[derive(Deserialize, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub default_password: String,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"***")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Clone)]
pub struct BootstrapSettings {
    pub admin_username: String,
    pub admin_password: String,
}

impl std::fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("admin_username", &self.admin_username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Settings {
    /// Signing secret used when nothing else is configured.
    pub const DEVELOPMENT_SECRET: &str = "unitrack-development-secret-change-me";

    /// Loads defaults, optional `config/*` files and `UNITRACK__*` variables.
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Self::defaults(&environment)?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("UNITRACK").separator("__"))
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("SECRET_KEY").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Built-in defaults only, ignoring files and the environment.
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults("development")?.build()?.try_deserialize()
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8000)?
            .set_default("application.environment", environment)?
            .set_default("application.permissive_cors", false)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "password")?
            .set_default("database.database_name", "unitrack")?
            .set_default("database.max_connections", 10)?
            .set_default("database.require_ssl", false)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.jwt_secret", Self::DEVELOPMENT_SECRET)?
            .set_default("auth.token_ttl_hours", 8)?
            .set_default("auth.cookie_name", "access_token")?
            .set_default("auth.cookie_secure", true)?
            .set_default("auth.default_password", "020304")?
            .set_default("auth.bcrypt_cost", 12)?
            .set_default("bootstrap.admin_username", "admin")?
            .set_default("bootstrap.admin_password", "020304")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }

        let mut url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.username,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.database_name
        );
        if self.database.require_ssl {
            url.push_str("?sslmode=require");
        }
        url
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_can_be_loaded() {
        let settings = Settings::new();
        assert!(settings.is_ok());
    }

    #[test]
    fn test_default_listener_is_port_8000_on_all_interfaces() {
        let settings = Settings::from_defaults().unwrap();
        assert_eq!(settings.application.port, 8000);
        assert_eq!(settings.application.host, "0.0.0.0");
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert!(!settings.application.permissive_cors);
    }

    #[test]
    fn test_database_url_format() {
        let settings = Settings::from_defaults().unwrap();
        let url = settings.database_url();
        assert!(url.starts_with("postgres://"));
        assert!(url.contains(&settings.database.username));
        assert!(url.contains(&settings.database.database_name));
        assert!(!url.contains("sslmode"));
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let mut settings = Settings::from_defaults().unwrap();
        settings.database.url = Some("postgres://u:p@db:5432/uni".to_string());
        assert_eq!(settings.database_url(), "postgres://u:p@db:5432/uni");
    }

    #[test]
    fn test_auth_defaults() {
        let settings = Settings::from_defaults().unwrap();
        assert_eq!(settings.auth.token_ttl_hours, 8);
        assert_eq!(settings.auth.cookie_name, "access_token");
        assert_eq!(settings.auth.bcrypt_cost, 12);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let settings = Settings::from_defaults().unwrap();
        let rendered = format!("{:?}", settings.auth);
        assert!(!rendered.contains(&settings.auth.jwt_secret));
    }
}
