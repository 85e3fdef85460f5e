//! Lookup configuration.
//!
//! Layered lowest to highest: built-in defaults, `config.toml` in the
//! platform config directory, `DXS_*` environment variables, then CLI flags
//! (applied by the caller).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::MatchMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// When to color terminal output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown color choice {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Prefix (default) or substring matching.
    pub match_mode: MatchMode,
    /// Maximum hits printed per lookup; `None` prints all.
    pub limit: Option<usize>,
    pub color: ColorChoice,
}

impl SearchConfig {
    /// Defaults, then the config file if it exists, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// Defaults overridden by environment variables only.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Invalid values are logged and ignored.
    pub fn apply_env(&mut self) {
        if let Ok(val) = dotenvy::var("DXS_MATCH_MODE") {
            match val.parse() {
                Ok(mode) => self.match_mode = mode,
                Err(e) => tracing::warn!(value = %val, "ignoring DXS_MATCH_MODE: {e}"),
            }
        }

        if let Ok(val) = dotenvy::var("DXS_LIMIT") {
            match val.trim().parse::<usize>() {
                Ok(0) => self.limit = None,
                Ok(n) => self.limit = Some(n),
                Err(e) => tracing::warn!(value = %val, "ignoring DXS_LIMIT: {e}"),
            }
        }

        if let Ok(val) = dotenvy::var("DXS_COLOR") {
            match val.parse() {
                Ok(color) => self.color = color,
                Err(e) => tracing::warn!(value = %val, "ignoring DXS_COLOR: {e}"),
            }
        }
    }
}

/// `config.toml` under the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::var("DXS_CONFIG") {
        return Some(PathBuf::from(path));
    }
    directories::ProjectDirs::from("org", "doxygen-search", "doxygen-search")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
