//! # kndp Configuration
//!
//! A single optional YAML file with per-field defaults.
//!
//! ## Lookup order
//!
//! 1. `--config <path>` (or `KNDP_CONFIG`), which must exist
//! 2. `$HOME/.kndp/config.yaml`, used when present
//! 3. Built-in defaults
//!
//! ## Example
//!
//! ```yaml
//! engine:
//!   namespace: kndp-system
//!   release_name: kndp
//!   chart_version: 1.15.0
//! registry:
//!   local_port: 5000
//! ```

mod engine;
mod registry;

pub use engine::EngineConfig;
pub use registry::RegistryConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

/// Complete kndp configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KndpConfig {
    /// Installer release settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Registry defaults
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl KndpConfig {
    /// Load configuration from an explicit path or the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_yaml(&content).map_err(|message| ConfigError::ParseError {
            path: path.display().to_string(),
            message,
        })
    }

    fn from_yaml(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// `$HOME/.kndp/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kndp").join("config.yaml"))
    }

    /// Cluster-local DNS name of the in-cluster registry
    pub fn local_domain(&self) -> String {
        format!(
            "{}.{}.svc.cluster.local",
            self.registry.local_service_name, self.engine.namespace
        )
    }

    /// Override the engine namespace (CLI flag / env var)
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        if let Some(ns) = namespace {
            self.engine.namespace = ns;
        }
        self
    }
}
