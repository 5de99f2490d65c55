//! Registry service - registry lifecycle within one context
//!
//! Create: encode -> store secret -> reference it in the release -> upgrade.
//! Delete: dereference in the release -> upgrade -> delete the secret.
//!
//! Steps run in order and a failure stops the remaining ones without undoing
//! the finished ones. A crash between upgrade and secret deletion leaves an
//! unreferenced secret behind; `verify` reports it.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::registry_store::RegistryStore;
use super::release_sync::ReleaseSynchronizer;
use crate::domain::{Domains, Registry, Removal};
use crate::error::{KndpError, StoreError, ValidationError};
use crate::infrastructure::LocalRegistry;

/// How a delete ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Dereferenced and removed
    Deleted,
    /// The release does not reference this registry
    NotReferenced,
    /// The release has no `imagePullSecrets` at all
    NothingToDelete,
}

/// Drift between release values and stored secrets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Referenced by `imagePullSecrets` but no such registry secret exists
    pub dangling: Vec<String>,
    /// Registry secrets the release does not reference
    pub orphaned: Vec<String>,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.orphaned.is_empty()
    }
}

/// Service for managing registries of one context
pub struct RegistryManager {
    store: RegistryStore,
    sync: ReleaseSynchronizer,
    local: Arc<dyn LocalRegistry>,
}

impl RegistryManager {
    pub fn new(store: RegistryStore, sync: ReleaseSynchronizer, local: Arc<dyn LocalRegistry>) -> Self {
        Self { store, sync, local }
    }

    pub fn domains(&self) -> &Domains {
        self.sync.domains()
    }

    pub async fn list(&self) -> Result<Vec<Registry>, KndpError> {
        Ok(self.store.list().await?)
    }

    /// Registries paired with whether the release advertises them as default
    pub async fn list_with_default(&self) -> Result<Vec<(Registry, bool)>, KndpError> {
        let values = self.sync.fetch().await?;
        let registries = self.store.list().await?;
        Ok(registries
            .iter()
            .map(|registry| {
                let default = self.sync.holds_default(&values, registry, &registries);
                (registry.clone(), default)
            })
            .collect())
    }

    /// Reject bad credentials and registries already present in the context
    pub async fn validate(&self, registry: &Registry) -> Result<(), KndpError> {
        if registry.local {
            return Ok(());
        }
        registry.validate_auths()?;
        let existing = self.store.list().await?;
        if RegistryStore::exists(registry, &existing) {
            return Err(ValidationError::AlreadyExists {
                server: registry.joined_servers(),
            }
            .into());
        }
        Ok(())
    }

    /// Create a registry and wire it into the release.
    ///
    /// Returns the generated secret name for remote registries.
    pub async fn create(&self, registry: &Registry) -> Result<Option<String>, KndpError> {
        let mut values = self.sync.fetch().await?;

        if registry.local {
            self.local.create_local().await?;
            if registry.default {
                self.sync.apply_add(&mut values, registry, None);
                self.sync.upgrade(&values).await?;
            }
            info!("Local registry created");
            return Ok(None);
        }

        let secret = self.store.create(registry).await?;
        let name = secret.metadata.name.ok_or_else(|| StoreError::Rejected {
            operation: "create",
            message: "created secret has no name".to_string(),
        })?;

        self.sync.apply_add(&mut values, registry, Some(&name));
        self.sync.upgrade(&values).await?;

        info!("Registry {} created as {}", registry.joined_servers(), name);
        Ok(Some(name))
    }

    /// Remove a registry from the release and delete its secret
    pub async fn delete(&self, registry: &Registry) -> Result<DeleteOutcome, KndpError> {
        let mut values = self.sync.fetch().await?;

        if registry.local {
            let result = self.sync.apply_remove(&mut values, registry);
            if result.changed() {
                self.sync.upgrade(&values).await?;
            }
            self.local.delete_local().await?;
            info!("Local registry deleted");
            return Ok(DeleteOutcome::Deleted);
        }

        if !values.has_pull_secrets() {
            warn!("Not found any registry in context.");
            return Ok(DeleteOutcome::NothingToDelete);
        }

        let name = registry.name.clone().ok_or_else(|| StoreError::NotFound {
            name: registry.joined_servers(),
        })?;

        let result = self.sync.apply_remove(&mut values, registry);
        if result.changed() {
            self.sync.upgrade(&values).await?;
        }

        match result.removal {
            Removal::Removed(_) => {
                self.store.delete(&name).await?;
                info!("Registry {} deleted", registry.joined_servers());
                Ok(DeleteOutcome::Deleted)
            }
            Removal::NotReferenced => {
                warn!("Registry secret {} not found in applied configuration.", name);
                match self.store.delete(&name).await {
                    Ok(()) => info!("Removed unreferenced secret {}", name),
                    Err(e) if e.is_not_found() => warn!("Secret {} already gone", name),
                    Err(e) => return Err(e.into()),
                }
                Ok(DeleteOutcome::NotReferenced)
            }
        }
    }

    /// Whether this registry is the one the release advertises as default
    pub async fn is_current_default(&self, registry: &Registry) -> Result<bool, KndpError> {
        let values = self.sync.fetch().await?;
        if registry.local {
            return Ok(self.sync.is_default(&values, registry));
        }
        let stored = self.store.list().await?;
        Ok(self.sync.holds_default(&values, registry, &stored))
    }

    /// Re-read release values and secrets and report drift between them
    pub async fn verify(&self) -> Result<Reconciliation, KndpError> {
        let values = self.sync.fetch().await?;
        let registries = self.store.list().await?;

        let stored: BTreeSet<&str> = registries.iter().filter_map(|r| r.name.as_deref()).collect();
        let referenced: BTreeSet<&str> = values.pull_secrets().iter().map(String::as_str).collect();

        let report = Reconciliation {
            dangling: referenced
                .difference(&stored)
                .map(|s| s.to_string())
                .collect(),
            orphaned: stored
                .difference(&referenced)
                .map(|s| s.to_string())
                .collect(),
        };
        if !report.is_consistent() {
            warn!(
                "Release and secrets disagree: {} dangling, {} orphaned",
                report.dangling.len(),
                report.orphaned.len()
            );
        }
        Ok(report)
    }
}
