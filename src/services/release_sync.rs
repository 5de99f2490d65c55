//! Release synchronizer - keeps engine values in line with registries
//!
//! Owns the read-modify-write of the release values:
//! `get_release` -> mutate `imagePullSecrets` / default registry -> `upgrade`.
//! Nothing here is atomic. A failed upgrade leaves earlier secret changes in
//! place and is reported as is.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{Domains, Registry, ReleaseValues, Removal};
use crate::error::ReleaseError;
use crate::infrastructure::ReleaseStore;

/// Result of removing a registry from release values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveResult {
    pub removal: Removal,
    pub default_cleared: bool,
}

impl RemoveResult {
    /// Whether the values differ from what the installer has
    pub fn changed(&self) -> bool {
        matches!(self.removal, Removal::Removed(_)) || self.default_cleared
    }
}

pub struct ReleaseSynchronizer {
    release: Arc<dyn ReleaseStore>,
    version: String,
    domains: Domains,
}

impl ReleaseSynchronizer {
    pub fn new(release: Arc<dyn ReleaseStore>, version: impl Into<String>, domains: Domains) -> Self {
        Self {
            release,
            version: version.into(),
            domains,
        }
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub async fn fetch(&self) -> Result<ReleaseValues, ReleaseError> {
        self.release.get_release().await
    }

    /// Register a registry: reference its secret and, if default, advertise its domain
    pub fn apply_add(&self, values: &mut ReleaseValues, registry: &Registry, secret_name: Option<&str>) {
        if let Some(name) = secret_name {
            if !values.add_pull_secret(name) {
                warn!("Secret {} is already referenced by the release", name);
            }
        }
        if registry.default {
            let domain = registry.domain(&self.domains);
            debug!("Setting default registry to {}", domain);
            values.set_default_registry(domain);
        }
    }

    /// Unregister a registry by secret name, dropping the default flag if it held it
    pub fn apply_remove(&self, values: &mut ReleaseValues, registry: &Registry) -> RemoveResult {
        let removal = match registry.name.as_deref() {
            Some(name) => values.remove_pull_secret(name),
            None => Removal::NotReferenced,
        };
        let default_cleared = registry.default && values.clear_default_registry();
        RemoveResult {
            removal,
            default_cleared,
        }
    }

    /// Hand the full value set back to the installer
    pub async fn upgrade(&self, values: &ReleaseValues) -> Result<(), ReleaseError> {
        debug!("Upgrading engine release with values: {}", values.to_value());
        self.release.upgrade(&self.version, values).await
    }

    /// Whether the release currently advertises this registry's domain as default
    pub fn is_default(&self, values: &ReleaseValues, registry: &Registry) -> bool {
        values.default_registry() == Some(registry.domain(&self.domains).as_str())
    }

    /// Whether `registry` is the one default holder among `stored`.
    ///
    /// The release only records a domain, so when several stored registries
    /// share it none of them can claim the flag.
    pub fn holds_default(
        &self,
        values: &ReleaseValues,
        registry: &Registry,
        stored: &[Registry],
    ) -> bool {
        if !self.is_default(values, registry) {
            return false;
        }
        if registry.local {
            return true;
        }
        let domain = registry.domain(&self.domains);
        stored
            .iter()
            .filter(|other| !other.local && other.domain(&self.domains) == domain)
            .count()
            <= 1
    }
}
