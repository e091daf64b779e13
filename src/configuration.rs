use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub notification: NotificationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default)]
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

/// Revocation cache connection
#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
    #[serde(default = "default_blacklist_key")]
    pub blacklist_key: String,
}

fn default_blacklist_key() -> String {
    "blacklist".to_string()
}

/// Password-reset queue; shares the Redis connection
#[derive(serde::Deserialize, Clone)]
pub struct NotificationSettings {
    pub queue_name: String,
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64, // seconds (e.g., 604800 for 7 days)
}

#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_operation_timeout_ms() -> u64 {
    5_000
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            hash_cost: default_hash_cost(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl AuthSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;

        if !(4..=31).contains(&self.auth.hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.hash_cost must be between 4 and 31, got {}",
                self.auth.hash_cost
            )));
        }
        if self.auth.operation_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "auth.operation_timeout_ms must be positive".to_string(),
            ));
        }
        if self.notification.queue_name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("notification.queue_name".to_string()));
        }

        Ok(())
    }
}

impl JwtSettings {
    /// Access tokens must expire strictly before refresh tokens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt token expiries must be positive".to_string(),
            ));
        }
        if self.access_token_expiry >= self.refresh_token_expiry {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry ({}s) must be shorter than jwt.refresh_token_expiry ({}s)",
                self.access_token_expiry, self.refresh_token_expiry
            )));
        }
        Ok(())
    }
}

/// Reads `configuration.yaml` (optional) and `APP_*` environment overrides,
/// e.g. `APP_JWT__SECRET` or `APP_DATABASE__HOST`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
