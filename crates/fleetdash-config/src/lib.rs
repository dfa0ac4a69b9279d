//! Configuration for the fleetdash tools.
//!
//! A TOML file at the platform config location, layered over built-in
//! defaults and overridden by `FLEETDASH_`-prefixed environment variables
//! (`FLEETDASH_SERVER__URL`, `FLEETDASH_CACHE__DAILY_TTL_SECS`, ...).
//! Also translates the file into the runtime settings consumed by
//! `fleetdash-api` and `fleetdash-core`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleetdash_api::{TlsMode, TransportConfig};
use fleetdash_core::{CacheConfig, PersistenceConfig};

/// Prefix for environment overrides. Nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "FLEETDASH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no server URL configured")]
    NoServer,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,
}

/// Where the tracking server lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Server base URL (e.g., "https://track.example.com").
    pub url: Option<String>,

    /// API token (plaintext, prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable name containing the API token.
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

/// Telemetry cache lifetimes, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_short_ttl")]
    pub summary_ttl_secs: u64,

    #[serde(default = "default_short_ttl")]
    pub events_ttl_secs: u64,

    #[serde(default = "default_daily_ttl")]
    pub daily_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            summary_ttl_secs: default_short_ttl(),
            events_ttl_secs: default_short_ttl(),
            daily_ttl_secs: default_daily_ttl(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardSettings {
    /// Quiet period before a layout change is written, in milliseconds.
    #[serde(default = "default_save_debounce")]
    pub save_debounce_ms: u64,

    /// Default look-back for `daily`.
    #[serde(default = "default_daily_days")]
    pub daily_days: u32,

    /// Default device cap for `daily`.
    #[serde(default = "default_max_devices")]
    pub max_devices: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            save_debounce_ms: default_save_debounce(),
            daily_days: default_daily_days(),
            max_devices: default_max_devices(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_short_ttl() -> u64 {
    30
}
fn default_daily_ttl() -> u64 {
    300
}
fn default_save_debounce() -> u64 {
    2000
}
fn default_daily_days() -> u32 {
    fleetdash_core::cache::DEFAULT_DAILY_DAYS
}
fn default_max_devices() -> usize {
    fleetdash_core::cache::DEFAULT_MAX_DEVICES
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "fleetdash", "fleetdash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetdash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path + environment. A missing file is not an
/// error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    /// Reject values that would make the runtime misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.server.url {
            parse_url(url)?;
        }
        if self.server.timeout == 0 {
            return Err(invalid("server.timeout", "must be at least 1 second"));
        }
        if self.dashboard.daily_days == 0 {
            return Err(invalid("dashboard.daily_days", "must be at least 1"));
        }
        Ok(())
    }

    /// The configured server URL.
    pub fn server_url(&self) -> Result<url::Url, ConfigError> {
        let raw = self.server.url.as_deref().ok_or(ConfigError::NoServer)?;
        parse_url(raw)
    }

    /// Resolve the API token: `token_env` first, then the plaintext value.
    pub fn token(&self) -> Option<SecretString> {
        if let Some(ref env_name) = self.server.token_env {
            if let Ok(val) = std::env::var(env_name) {
                return Some(SecretString::from(val));
            }
        }
        self.server.token.clone().map(SecretString::from)
    }

    pub fn transport_config(&self) -> TransportConfig {
        let tls = if self.server.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.server.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.server.timeout),
            token: self.token(),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            summary_ttl: Duration::from_secs(self.cache.summary_ttl_secs),
            events_ttl: Duration::from_secs(self.cache.events_ttl_secs),
            daily_ttl: Duration::from_secs(self.cache.daily_ttl_secs),
        }
    }

    pub fn persistence_config(&self) -> PersistenceConfig {
        PersistenceConfig {
            debounce: Duration::from_millis(self.dashboard.save_debounce_ms),
        }
    }
}

fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw
        .parse()
        .map_err(|_| invalid("server.url", &format!("invalid URL: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("server.url", "scheme must be http or https"));
    }
    Ok(url)
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}
