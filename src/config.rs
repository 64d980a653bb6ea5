use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Runtime settings, read from the environment (and `.env` via `dotenv`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_address = non_empty("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = raw_address
            .parse()
            .map_err(|_| AppError::Config(format!("BIND_ADDRESS `{}` is not a socket address", raw_address)))?;

        Ok(AppConfig {
            bind_address,
            database_url: non_empty("DATABASE_URL"),
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
        })
    }
}
