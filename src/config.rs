//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rfpweights/rfpweights.toml`
//! 3. Local config: `<data_dir>/.rfpweights.toml`
//! 4. Environment variables: `RFPWEIGHTS_*` prefix
//! 5. Explicit `--data-dir` from the command line

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::DEFAULT_PRECISION;

/// Largest accepted number of decimal places for persisted weights.
pub const MAX_PRECISION: u32 = 12;

/// Raw settings for intermediate parsing (all fields optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub tree_file: Option<String>,
    pub weights_file: Option<String>,
    pub precision: Option<u32>,
}

/// Unified configuration for rfpweights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the tree snapshot and weights (default: cwd)
    pub data_dir: PathBuf,
    /// Tree snapshot file name, relative to data_dir
    pub tree_file: String,
    /// Persisted weights file name, relative to data_dir
    pub weights_file: String,
    /// Decimal places kept when saving weights
    pub precision: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            tree_file: "tree.json".into(),
            weights_file: "weights.json".into(),
            precision: DEFAULT_PRECISION,
        }
    }
}

/// Get the XDG config directory for rfpweights.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rfpweights").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rfpweights.toml"))
}

/// Get the path to the local config file in a data directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".rfpweights.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    pub fn tree_path(&self) -> PathBuf {
        self.data_dir.join(&self.tree_file)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.data_dir.join(&self.weights_file)
    }

    fn expand_paths(&mut self) {
        let expanded = expand_path(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            tree_file: overlay
                .tree_file
                .clone()
                .unwrap_or_else(|| self.tree_file.clone()),
            weights_file: overlay
                .weights_file
                .clone()
                .unwrap_or_else(|| self.weights_file.clone()),
            precision: overlay.precision.unwrap_or(self.precision),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `data_dir` - Explicit data directory; also where the local config is looked up
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config in the data directory
        let local_dir = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| current.data_dir.clone());
        let local_path = local_config_path(&local_dir);
        if local_path.exists() {
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        // 5. Command line
        if let Some(dir) = data_dir {
            current.data_dir = dir.to_path_buf();
        }

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply RFPWEIGHTS_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RFPWEIGHTS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("tree_file") {
            settings.tree_file = val;
        }
        if let Ok(val) = config.get_string("weights_file") {
            settings.weights_file = val;
        }
        if let Ok(val) = config.get_int("precision") {
            settings.precision = u32::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("precision out of range: {val}"),
            })?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.precision > MAX_PRECISION {
            return Err(ApplicationError::Config {
                message: format!(
                    "precision must be at most {MAX_PRECISION}, got {}",
                    self.precision
                ),
            });
        }
        if self.tree_file.is_empty() || self.weights_file.is_empty() {
            return Err(ApplicationError::Config {
                message: "tree_file and weights_file must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rfpweights configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rfpweights/rfpweights.toml
#   Local:  <data_dir>/.rfpweights.toml
#   Env:    RFPWEIGHTS_* environment variables

# Directory holding tree and weights files
# data_dir = "."

# Tree snapshot (flat {"nodes": [...]} or nested array of roots)
# tree_file = "tree.json"

# Persisted absolute weights ({"categories": {...}, "requirements": {...}})
# weights_file = "weights.json"

# Decimal places kept when saving
# precision = 4
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
