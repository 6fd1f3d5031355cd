use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where base documents, stored images and generated outputs live.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageBackend,
    pub fonts_dir: PathBuf,
    pub result_category: String,
    pub generation_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            storage: storage_from_env()?,
            fonts_dir: optional_env("FONTS_DIR", "./fonts").into(),
            result_category: optional_env("RESULT_CATEGORY", "results"),
            generation_timeout_secs: optional_env("GENERATION_TIMEOUT_SECS", "60")
                .parse::<u64>()
                .context("GENERATION_TIMEOUT_SECS must be a whole number of seconds")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

fn storage_from_env() -> Result<StorageBackend> {
    match optional_env("STORAGE_BACKEND", "local").to_ascii_lowercase().as_str() {
        "local" => Ok(StorageBackend::Local {
            root: optional_env("STORAGE_ROOT", "./storage").into(),
        }),
        "s3" => Ok(StorageBackend::S3 {
            bucket: require_env("S3_BUCKET")?,
            endpoint: require_env("S3_ENDPOINT")?,
            region: optional_env("S3_REGION", "us-east-1"),
            access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
        }),
        other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
