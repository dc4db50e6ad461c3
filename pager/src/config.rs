//! Service configuration.
//!
//! Loaded from `~/.pager/config.toml` (or an explicit path), then overridden
//! by `PAGER_*` environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Root directory for pager state: `~/.pager/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pager"))
}

/// Path to the global config file: `~/.pager/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Sqlite,
    Memory,
}

/// How inbound messages are matched to sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Reconcile against the sender's claimed session; a leading session id is optional.
    Auto,
    /// Every message must start with a session id; sessions are never claimed.
    Explicit,
}

impl SessionMode {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "explicit" => Some(Self::Explicit),
            _ => None,
        }
    }
}

/// Collections and matching mode used by the session pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub mode: SessionMode,
    pub sessions_collection: String,
    pub logs_collection: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: SessionMode::Auto,
            sessions_collection: "inbound/pager/sessions".to_string(),
            logs_collection: "inbound/pager/textLogs".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the webhook server listens on.
    pub bind: SocketAddr,
    pub store: StoreKind,
    /// SQLite file; defaults to `~/.pager/pager.db`.
    pub database_path: Option<PathBuf>,
    /// Webhook Basic credentials as `"user pass"`.
    pub webhook_auth: Option<String>,
    /// Default tracing directive when `RUST_LOG` is unset.
    pub log_level: String,
    pub session: SessionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 58231)),
            store: StoreKind::Sqlite,
            database_path: None,
            webhook_auth: None,
            log_level: "info".to_string(),
            session: SessionSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `~/.pager/config.toml` is
    /// used when present and defaults otherwise. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => match global_config_path().filter(|p| p.exists()) {
                Some(p) => Self::load_from(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply `PAGER_*` overrides from the given lookup.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("PAGER_BIND") {
            self.bind = v.parse().map_err(|_| ConfigError::Invalid {
                key: "PAGER_BIND",
                value: v,
            })?;
        }
        if let Some(v) = lookup("PAGER_STORE") {
            self.store = match v.to_ascii_lowercase().as_str() {
                "sqlite" => StoreKind::Sqlite,
                "memory" => StoreKind::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PAGER_STORE",
                        value: v,
                    })
                }
            };
        }
        if let Some(v) = lookup("PAGER_DATABASE") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PAGER_SESSION_MODE") {
            self.session.mode = SessionMode::parse(&v).ok_or(ConfigError::Invalid {
                key: "PAGER_SESSION_MODE",
                value: v,
            })?;
        }
        if let Some(v) = lookup("PAGER_WEBHOOK_AUTH") {
            self.webhook_auth = Some(v);
        }
        Ok(())
    }

    /// Resolved SQLite path.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| global_dir().map(|d| d.join("pager.db")))
    }
}
