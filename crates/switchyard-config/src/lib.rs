//! Configuration for the switchyard TUI.
//!
//! One TOML file (platform config dir, or an explicit path) layered over
//! built-in defaults and `SWITCHYARD_` environment variables. Besides UI
//! timing it carries the seed profiles for the in-memory backend and
//! overrides for the built-in English strings.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use switchyard_core::{Catalog, MemoryBackend, ProfileRecord, ProfileUid};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

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
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Uid of the profile that starts out active.
    pub current: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Seed profiles for the in-memory backend, in display order.
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,

    /// Translation overrides, keyed like `"menu.delete"`.
    #[serde(default)]
    pub strings: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// How long each info snippet stays on a card, e.g. `"5s"`.
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval: String,

    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,

    /// Simulated round-trip of the in-memory backend.
    #[serde(default = "default_backend_latency_ms")]
    pub backend_latency_ms: u64,

    pub log_file: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            rotation_interval: default_rotation_interval(),
            tick_rate_ms: default_tick_rate_ms(),
            backend_latency_ms: default_backend_latency_ms(),
            log_file: None,
        }
    }
}

fn default_rotation_interval() -> String {
    "5s".into()
}
fn default_tick_rate_ms() -> u64 {
    250
}
fn default_backend_latency_ms() -> u64 {
    400
}

impl Config {
    /// Check everything that would otherwise fail later at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rotation_interval()?;
        if self.defaults.tick_rate_ms == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.tick_rate_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            profile.validate().map_err(|e| ConfigError::Validation {
                field: format!("profiles.{}", profile.uid),
                reason: e.to_string(),
            })?;
            if !seen.insert(&profile.uid) {
                return Err(ConfigError::Validation {
                    field: format!("profiles.{}", profile.uid),
                    reason: "duplicate uid".into(),
                });
            }
        }
        Ok(())
    }

    pub fn rotation_interval(&self) -> Result<Duration, ConfigError> {
        let raw = self.defaults.rotation_interval.trim();
        let interval = humantime::parse_duration(raw).map_err(|e| ConfigError::Validation {
            field: "defaults.rotation_interval".into(),
            reason: format!("'{raw}': {e}"),
        })?;
        if interval.is_zero() {
            return Err(ConfigError::Validation {
                field: "defaults.rotation_interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(interval)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.defaults.tick_rate_ms)
    }

    pub fn backend_latency(&self) -> Duration {
        Duration::from_millis(self.defaults.backend_latency_ms)
    }

    /// Built-in strings with this config's overrides applied.
    pub fn catalog(&self) -> Catalog {
        Catalog::with_overrides(self.strings.clone())
    }

    /// In-memory backend seeded with the configured profiles.
    pub fn build_backend(&self) -> Result<MemoryBackend, ConfigError> {
        let current = self.current.as_deref().map(ProfileUid::new);
        let backend = MemoryBackend::from_profiles(self.profiles.iter().cloned(), current)
            .map_err(|e| ConfigError::Validation {
                field: "profiles".into(),
                reason: e.to_string(),
            })?;
        Ok(backend.with_latency(self.backend_latency()))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "switchyard", "switchyard").map_or_else(
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
    p.push("switchyard");
    p
}

/// Default log file location, next to the platform data dir.
pub fn default_log_path() -> PathBuf {
    ProjectDirs::from("dev", "switchyard", "switchyard").map_or_else(
        || dirs_fallback().join("switchyard.log"),
        |dirs| dirs.data_local_dir().join("switchyard.log"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SWITCHYARD_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
