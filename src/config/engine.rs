//! Engine (installer release) configuration.

use serde::{Deserialize, Serialize};

/// Helm release that carries `imagePullSecrets` and `args`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Namespace holding the release and the registry secrets
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Helm release name
    #[serde(default = "default_release_name")]
    pub release_name: String,

    /// Chart name inside the chart repository
    #[serde(default = "default_chart_name")]
    pub chart_name: String,

    /// Chart repository URL
    #[serde(default = "default_chart_repo")]
    pub chart_repo: String,

    /// Chart version passed to every upgrade
    #[serde(default = "default_chart_version")]
    pub chart_version: String,
}

fn default_namespace() -> String {
    "kndp-system".to_string()
}

fn default_release_name() -> String {
    "kndp".to_string()
}

fn default_chart_name() -> String {
    "crossplane".to_string()
}

fn default_chart_repo() -> String {
    "https://charts.crossplane.io/stable".to_string()
}

fn default_chart_version() -> String {
    "1.15.0".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            release_name: default_release_name(),
            chart_name: default_chart_name(),
            chart_repo: default_chart_repo(),
            chart_version: default_chart_version(),
        }
    }
}
