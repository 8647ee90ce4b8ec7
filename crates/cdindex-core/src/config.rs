//! TOML configuration for filter thresholds, compute mode and output.
//!
//! Resolution order (first hit wins, no merging between files):
//! 1. an explicit path (must exist)
//! 2. `./cdindex.toml`
//! 3. `<config dir>/cdindex/config.toml`
//! 4. built-in defaults
//!
//! Command-line flags override whatever was loaded.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::disruption::ComputeOptions;
use crate::error::ErrorCode;
use crate::table::{DEFAULT_NAN_TOKEN, TableFormat};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "cdindex.toml";

/// Configuration file failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Stable error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::InputUnreadable,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_min_in")]
    pub min_in: usize,
    #[serde(default)]
    pub min_out: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_in: default_min_in(),
            min_out: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Fixed output format; inferred from the output path when unset.
    #[serde(default)]
    pub format: Option<TableFormat>,
    #[serde(default = "default_nan_token")]
    pub nan_token: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            nan_token: default_nan_token(),
        }
    }
}

impl Config {
    /// Engine options described by this configuration.
    #[must_use]
    pub fn compute_options(&self) -> ComputeOptions {
        ComputeOptions {
            min_in: self.filter.min_in,
            min_out: self.filter.min_out,
            parallel: self.compute.parallel,
            deadline: self.compute.deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Parse the configuration file at `path`.
///
/// # Errors
///
/// Returns a [`ConfigError`] (wrapped in `anyhow`) if the file cannot be
/// read or is not valid configuration.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Per-user configuration path, if the platform has a config directory.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cdindex").join("config.toml"))
}

/// Resolve the effective configuration.
///
/// `explicit` must exist when given; the working-directory and per-user
/// files are optional.
///
/// # Errors
///
/// Returns an error if the selected file cannot be read or parsed.
pub fn resolve_config(explicit: Option<&Path>, working_dir: &Path) -> Result<(Config, ConfigSource)> {
    resolve_config_with(explicit, working_dir, user_config_path().as_deref())
}

fn resolve_config_with(
    explicit: Option<&Path>,
    working_dir: &Path,
    user_path: Option<&Path>,
) -> Result<(Config, ConfigSource)> {
    if let Some(path) = explicit {
        let config = load_config_file(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let candidates = [Some(working_dir.join(PROJECT_CONFIG_FILE)), user_path.map(Path::to_path_buf)];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            debug!(path = %path.display(), "loading configuration");
            let config = load_config_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }
    }

    Ok((Config::default(), ConfigSource::Defaults))
}

const fn default_min_in() -> usize {
    1
}

fn default_nan_token() -> String {
    DEFAULT_NAN_TOKEN.to_string()
}
