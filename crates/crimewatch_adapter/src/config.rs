#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TIMEOUT};

pub const ENV_HTTP_BIND: &str = "CRIMEWATCH_HTTP_BIND";
pub const ENV_STORE_PATH: &str = "CRIMEWATCH_STORE_PATH";
pub const ENV_UPLOAD_DIR: &str = "CRIMEWATCH_UPLOAD_DIR";
pub const ENV_MODEL_PATH: &str = "CRIMEWATCH_MODEL_PATH";
pub const ENV_MAX_UPLOAD_BYTES: &str = "CRIMEWATCH_MAX_UPLOAD_BYTES";
pub const ENV_SESSION_IDLE_SECS: &str = "CRIMEWATCH_SESSION_IDLE_SECS";
pub const ENV_MAX_SESSIONS: &str = "CRIMEWATCH_MAX_SESSIONS";

pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MIN_MAX_UPLOAD_BYTES: usize = 1024;
const MAX_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;
const MAX_SESSION_IDLE_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_MAX_SESSIONS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}='{value}' is invalid: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub store_path: PathBuf,
    pub upload_dir: PathBuf,
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
    pub session_idle_timeout: Duration,
    pub max_sessions: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_var_map(|key| env::var(key).ok())
    }

    /// Blank values fall back to the default, as if the variable were unset.
    pub fn from_env_var_map<F>(mut env_getter: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut lookup = |key: &str| {
            env_getter(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = lookup(ENV_HTTP_BIND).unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: ENV_HTTP_BIND,
                value: bind_raw.clone(),
                reason: "expected host:port",
            })?;

        let store_path = lookup(ENV_STORE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));
        let upload_dir = lookup(ENV_UPLOAD_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads"));
        let model_path = lookup(ENV_MODEL_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("models"));

        let max_upload_bytes = match lookup(ENV_MAX_UPLOAD_BYTES) {
            None => DEFAULT_MAX_UPLOAD_BYTES,
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| (MIN_MAX_UPLOAD_BYTES..=MAX_MAX_UPLOAD_BYTES).contains(n))
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_MAX_UPLOAD_BYTES,
                    value: v,
                    reason: "expected an integer in 1024..=268435456",
                })?,
        };

        let session_idle_timeout = match lookup(ENV_SESSION_IDLE_SECS) {
            None => DEFAULT_SESSION_IDLE_TIMEOUT,
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|n| (1..=MAX_SESSION_IDLE_SECS).contains(n))
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_SESSION_IDLE_SECS,
                    value: v,
                    reason: "expected seconds in 1..=604800",
                })?,
        };

        let max_sessions = match lookup(ENV_MAX_SESSIONS) {
            None => DEFAULT_MAX_SESSIONS,
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_MAX_SESSIONS).contains(n))
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_MAX_SESSIONS,
                    value: v,
                    reason: "expected an integer in 1..=1000000",
                })?,
        };

        Ok(Self {
            bind,
            store_path,
            upload_dir,
            model_path,
            max_upload_bytes,
            session_idle_timeout,
            max_sessions,
        })
    }

    /// Every on-disk location placed under one directory.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            store_path: root.join("data"),
            upload_dir: root.join("uploads"),
            model_path: root.join("models"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}
