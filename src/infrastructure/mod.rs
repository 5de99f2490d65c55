//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Kubernetes secrets (registry credentials)
//! - Helm (engine release values and upgrades)
//! - Kubernetes workloads (in-cluster registry)

pub mod helm;
pub mod local_registry;
pub mod secrets;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use helm::{HelmReleaseStore, ReleaseStore};
pub use local_registry::{KubeLocalRegistry, LocalRegistry};
pub use secrets::{KubeSecretStore, SecretStore};
