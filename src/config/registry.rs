//! Registry defaults for remote domains and the in-cluster registry service.

use serde::{Deserialize, Serialize};

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Domain advertised when a registry carries no server entries (e.g., "xpkg.upbound.io")
    #[serde(default = "default_remote_domain")]
    pub default_remote_domain: String,

    /// Name of the in-cluster registry Deployment and Service
    #[serde(default = "default_local_service_name")]
    pub local_service_name: String,

    /// Container image backing the in-cluster registry
    #[serde(default = "default_local_image")]
    pub local_image: String,

    /// Port exposed by the in-cluster registry Service
    #[serde(default = "default_local_port")]
    pub local_port: i32,
}

fn default_remote_domain() -> String {
    "xpkg.upbound.io".to_string()
}

fn default_local_service_name() -> String {
    "registry".to_string()
}

fn default_local_image() -> String {
    "registry:2".to_string()
}

fn default_local_port() -> i32 {
    5000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_remote_domain: default_remote_domain(),
            local_service_name: default_local_service_name(),
            local_image: default_local_image(),
            local_port: default_local_port(),
        }
    }
}
