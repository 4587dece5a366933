/// Configuration management for ticket-service
///
/// Loads configuration from environment variables (and an optional `.env`)
/// with sensible defaults. Only `DATABASE_URL` and `JWT_SECRET` are required.
use crate::error::AppError;
use dotenvy::dotenv;
use s3_utils::S3Config;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub s3: S3Config,
    pub smtp: SmtpConfig,
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// SMTP settings. An empty host puts the mailer in no-op mode.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub starttls: bool,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// Bounded capacity of the notification queue
    pub queue_capacity: usize,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        _ => Ok(default),
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL missing".into()))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| AppError::Config("JWT_SECRET missing".into()))?;

        let smtp_username = optional_var("SMTP_USERNAME");
        let smtp_from = optional_var("SMTP_FROM")
            .or_else(|| smtp_username.clone())
            .unwrap_or_else(|| "helpdesk@localhost".to_string());

        Ok(Config {
            app: AppConfig {
                host: var_or("APP_HOST", "0.0.0.0"),
                port: parse_var("APP_PORT", 4000)?,
                env: var_or("APP_ENV", "development"),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            s3: S3Config::from_env(),
            smtp: SmtpConfig {
                host: var_or("SMTP_HOST", ""),
                port: parse_var("SMTP_PORT", 587)?,
                username: smtp_username,
                password: optional_var("SMTP_PASSWORD"),
                from: smtp_from,
                starttls: parse_var("SMTP_STARTTLS", true)?,
            },
            auth: AuthConfig { jwt_secret },
            notifications: NotificationConfig {
                queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY", 1024)?,
            },
        })
    }
}
