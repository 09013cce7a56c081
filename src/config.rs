use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;

use crate::utils::uploads::CloudinaryConfig;

/// Dev-only fallback so `STORE_BACKEND=memory` runs without any setup.
const DEV_JWT_SECRET: &str = "dev-secret";

/// One hour up to one year.
const TOKEN_TTL_HOURS: RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub media_root: PathBuf,
    pub media_url: String,
    pub cloudinary: Option<CloudinaryConfig>,
    /// Staff account created at startup when both are set.
    pub admin: Option<(String, String)>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn within<T>(key: &'static str, value: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: PartialOrd + ToString,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend = match var_or("STORE_BACKEND", "mongo").to_lowercase().as_str() {
            "mongo" | "mongodb" => StoreBackend::Mongo,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let jwt_secret = match (env::var("JWT_SECRET"), store_backend) {
            (Ok(secret), _) if !secret.is_empty() => secret,
            (_, StoreBackend::Memory) => {
                log::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            _ => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let cloudinary = if env::var("CLOUDINARY_CLOUD_NAME").is_ok() {
            let config = CloudinaryConfig::from_env().map_err(|e| ConfigError::Invalid {
                key: "CLOUDINARY_*",
                value: e,
            })?;
            Some(config)
        } else {
            None
        };

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() => Some((username, password)),
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            _ => None,
        };

        Ok(Self {
            host: var_or("HOST", "127.0.0.1"),
            port: parsed("PORT", 8000)?,
            store_backend,
            mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_database: var_or("MONGODB_DATABASE", "yatube"),
            redis_url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
            jwt_secret,
            token_ttl_hours: within(
                "TOKEN_TTL_HOURS",
                parsed("TOKEN_TTL_HOURS", 24)?,
                TOKEN_TTL_HOURS,
            )?,
            media_root: PathBuf::from(var_or("MEDIA_ROOT", "media")),
            media_url: var_or("MEDIA_URL", "/media/"),
            cloudinary,
            admin,
        })
    }
}
