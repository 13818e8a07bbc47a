//! Run configuration management.
//!
//! An optional YAML file supplies run defaults; command line flags override
//! them. Searching the usual locations never fails: unreadable or unparsable
//! candidates become warnings and built-in defaults apply. A file named
//! explicitly must load, see [`load_config_file`].

mod defaults;

pub use defaults::RunDefaults;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Canonical list of candidate config file names we search for on disk.
const CONFIG_FILENAMES: &[&str] = &["grayscatter.yml", "grayscatter.yaml"];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "GRAYSCATTER_CONFIG";

/// Public handle that stores the loaded configuration, its source path, and warnings.
#[derive(Debug)]
pub struct ConfigHandle {
    pub config: GrayscatterConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Complete configuration file structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GrayscatterConfig {
    pub defaults: RunDefaults,
}

impl GrayscatterConfig {
    /// Parse YAML text and sanitize it.
    pub fn from_yaml(contents: &str) -> Result<(Self, Vec<String>), serde_yaml::Error> {
        let mut config: Self = serde_yaml::from_str(contents)?;
        let warnings = config.defaults.sanitize();
        Ok((config, warnings))
    }
}

/// Load configuration from disk, optionally forcing a specific path.
pub fn load_config(custom_path: Option<&Path>) -> ConfigHandle {
    load_from_candidates(config_candidates(custom_path))
}

/// Load one explicitly named config file.
///
/// Unlike [`load_config`] there is no fallback: a file that cannot be read
/// or parsed is an [`Error::Config`].
pub fn load_config_file(path: &Path) -> Result<ConfigHandle> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))?;
    let (config, warnings) = GrayscatterConfig::from_yaml(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse config {}: {}", path.display(), e)))?;
    let source = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(ConfigHandle {
        config,
        source: Some(source),
        warnings,
    })
}

fn load_from_candidates(candidates: Vec<PathBuf>) -> ConfigHandle {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if !candidate.is_file() {
            continue;
        }

        match fs::read_to_string(&candidate) {
            Ok(contents) => match GrayscatterConfig::from_yaml(&contents) {
                Ok((config, sanitized)) => {
                    warnings.extend(sanitized);
                    let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                    return ConfigHandle {
                        config,
                        source: Some(source),
                        warnings,
                    };
                }
                Err(err) => warnings.push(format!(
                    "Failed to parse config {}: {}",
                    candidate.display(),
                    err
                )),
            },
            Err(err) => warnings.push(format!(
                "Failed to read config {}: {}",
                candidate.display(),
                err
            )),
        }
    }

    warnings.push("No config found; using built-in defaults.".to_string());
    ConfigHandle {
        config: GrayscatterConfig::default(),
        source: None,
        warnings,
    }
}

/// Get list of config file candidates to try
fn config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(cwd.join("config").join(name));
            candidates.push(cwd.join(name));
        }
    }

    if let Some(home_dir) = dirs::home_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(home_dir.join("grayscatter").join(name));
        }
    }

    candidates
}

impl ConfigHandle {
    /// Log where the config came from and any warnings.
    pub fn log_usage(&self) {
        match &self.source {
            Some(source) => log::info!("loaded config from {}", source.display()),
            None => log::debug!("using built-in defaults"),
        }
        for warning in &self.warnings {
            if self.source.is_none() && warning.starts_with("No config found") {
                continue;
            }
            log::warn!("config: {}", warning);
        }
    }
}
