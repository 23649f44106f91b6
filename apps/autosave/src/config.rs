use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where storage slots live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// One JSON file per slot under `data_dir`.
    File,
    /// Process memory only; everything is lost on exit.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("STORAGE_BACKEND must be 'file' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_backend: StorageBackend,
    pub storage_quota_bytes: usize,
    pub bind_addr: String,
    pub port: u16,
    pub debounce: Duration,
    pub notify_capacity: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
            storage_backend: env_or("STORAGE_BACKEND", "file").parse()?,
            storage_quota_bytes: parse_env("STORAGE_QUOTA_BYTES", 5 * 1024 * 1024)?,
            bind_addr: env_or("BIND_ADDR", "127.0.0.1"),
            port: parse_env("PORT", 8080)?,
            debounce: Duration::from_millis(parse_env("AUTOSAVE_DEBOUNCE_MS", 500)?),
            notify_capacity: parse_env("NOTIFY_CAPACITY", 64)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("File".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!(
            " memory ".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_parse_env_default_and_error() {
        assert_eq!(
            parse_env::<u16>("AUTOSAVE_TEST_UNSET_VARIABLE", 42).unwrap(),
            42
        );
        std::env::set_var("AUTOSAVE_TEST_BAD_PORT", "eighty");
        let err = parse_env::<u16>("AUTOSAVE_TEST_BAD_PORT", 8080).unwrap_err();
        assert!(err.to_string().contains("AUTOSAVE_TEST_BAD_PORT"));
    }
}
