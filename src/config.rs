use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Default hard limit for uploaded images (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Longest accepted token lifetime: ten years.
pub const MAX_JWT_EXPIRES_IN_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which image backend the process runs with. Chosen once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Remote { bucket: String, region: String },
    Local { dir: PathBuf, public_base_url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map. Blank values count as unset.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expires_in_hours = match get("JWT_EXPIRES_IN_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if (1..=MAX_JWT_EXPIRES_IN_HOURS).contains(&hours) => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "JWT_EXPIRES_IN_HOURS",
                        value: raw,
                    })
                }
            },
            None => 24,
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value: raw })?,
            None => 5000,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_UPLOAD_BYTES",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let storage = match (get("S3_BUCKET"), get("AWS_REGION")) {
            (Some(bucket), Some(region)) => StorageConfig::Remote { bucket, region },
            _ => {
                let public_host = if host == "0.0.0.0" { "localhost" } else { host.as_str() };
                StorageConfig::Local {
                    dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
                    public_base_url: get("PUBLIC_BASE_URL")
                        .unwrap_or_else(|| format!("http://{}:{}", public_host, port))
                        .trim_end_matches('/')
                        .to_string(),
                }
            }
        };

        Ok(Config {
            database_url,
            database_name: get("DATABASE_NAME").unwrap_or_else(|| "task_hub".to_string()),
            jwt_secret,
            jwt_expires_in_hours,
            host,
            port,
            cors_origin: get("CORS_ORIGIN"),
            storage,
            max_upload_bytes,
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }
}
