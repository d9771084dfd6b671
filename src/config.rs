//! Application settings.
//!
//! Values come from an optional TOML file named by `QUIT_HABIT_CONFIG`, then
//! from environment variables, which win over the file:
//!
//! - `QUIT_HABIT_HTTP_ADDR`: listen address (default `0.0.0.0:5000`)
//! - `QUIT_HABIT_DATABASE`: SQLite file (default `quit_habit.db`); a
//!   `DATABASE_URL` of the form `sqlite:///path` is accepted as a fallback
//! - `APP_PASSWORD`: shared secret for the session gate; unset or empty
//!   disables the gate
//! - `QUIT_HABIT_LOG`: tracing filter directive (default `info`)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "QUIT_HABIT_CONFIG";
pub const HTTP_ADDR_VAR: &str = "QUIT_HABIT_HTTP_ADDR";
pub const DATABASE_VAR: &str = "QUIT_HABIT_DATABASE";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const PASSWORD_VAR: &str = "APP_PASSWORD";
pub const LOG_VAR: &str = "QUIT_HABIT_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub app_password: Option<String>,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_database_path() -> PathBuf {
    PathBuf::from("quit_habit.db")
}

fn default_session_cookie() -> String {
    "quit_habit_session".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            database_path: default_database_path(),
            app_password: None,
            session_cookie: default_session_cookie(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(CONFIG_PATH_VAR).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::from_file(path.trim())?,
            None => Self::default(),
        };
        base.with_overrides(lookup)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validated()
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(HTTP_ADDR_VAR) {
            self.http_addr = addr.trim().parse().map_err(|err| ConfigError::InvalidValue {
                key: HTTP_ADDR_VAR,
                message: format!("'{addr}': {err}"),
            })?;
        }

        if let Some(path) = lookup(DATABASE_VAR).filter(|path| !path.trim().is_empty()) {
            self.database_path = PathBuf::from(path.trim());
        } else if let Some(url) = lookup(DATABASE_URL_VAR) {
            self.database_path = sqlite_path_from_url(&url)?;
        }

        if let Some(password) = lookup(PASSWORD_VAR) {
            self.app_password = Some(password);
        }

        if let Some(filter) = lookup(LOG_VAR).filter(|filter| !filter.trim().is_empty()) {
            self.log_filter = filter.trim().to_string();
        }

        self.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self
            .app_password
            .as_deref()
            .is_some_and(|password| password.is_empty())
        {
            self.app_password = None;
        }
        if self.session_cookie.trim().is_empty()
            || self
                .session_cookie
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '='))
        {
            return Err(ConfigError::InvalidValue {
                key: "session_cookie",
                message: format!("'{}' is not a valid cookie name", self.session_cookie),
            });
        }
        Ok(self)
    }

    pub fn password_required(&self) -> bool {
        self.app_password.is_some()
    }
}

fn sqlite_path_from_url(url: &str) -> Result<PathBuf, ConfigError> {
    let url = url.trim();
    url.strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: DATABASE_URL_VAR,
            message: format!("'{url}' is not a sqlite:/// url"),
        })
}
