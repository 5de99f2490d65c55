//! In-memory collaborators for service tests

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::helm::ReleaseStore;
use super::local_registry::LocalRegistry;
use super::secrets::SecretStore;
use crate::domain::ReleaseValues;
use crate::error::{LocalRegistryError, ReleaseError, StoreError};

/// Secret store keeping secrets in a vector
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<Vec<Secret>>,
    next_id: AtomicUsize,
    /// Every call as "list", "create" or "delete:<name>"
    calls: Mutex<Vec<String>>,
    reject_create: bool,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_create() -> Self {
        Self {
            reject_create: true,
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.secrets
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| s.metadata.name.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn list(&self, label_selector: &str) -> Result<Vec<Secret>, StoreError> {
        self.record("list");
        let (key, value) = label_selector.split_once('=').unwrap_or((label_selector, ""));
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                s.metadata
                    .labels
                    .as_ref()
                    .and_then(|l| l.get(key))
                    .is_some_and(|v| v == value)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, secret: &Secret) -> Result<Secret, StoreError> {
        self.record("create");
        if self.reject_create {
            return Err(StoreError::Rejected {
                operation: "create",
                message: "secrets is forbidden".to_string(),
            });
        }
        if secret.metadata.resource_version.is_some() {
            return Err(StoreError::Rejected {
                operation: "create",
                message: "resourceVersion should not be set on objects to be created".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = secret.clone();
        let name = match &secret.metadata.name {
            Some(name) => name.clone(),
            None => format!(
                "{}{:05}",
                secret.metadata.generate_name.clone().unwrap_or_default(),
                id
            ),
        };
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.iter().any(|s| s.metadata.name.as_deref() == Some(name.as_str())) {
            return Err(StoreError::Rejected {
                operation: "create",
                message: format!("secrets \"{}\" already exists", name),
            });
        }
        created.metadata.name = Some(name);
        created.metadata.resource_version = Some(id.to_string());
        secrets.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.record(format!("delete:{}", name));
        let mut secrets = self.secrets.lock().unwrap();
        let before = secrets.len();
        secrets.retain(|s| s.metadata.name.as_deref() != Some(name));
        if secrets.len() == before {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

/// Release store holding values in memory and recording upgrades
#[derive(Default)]
pub struct InMemoryReleaseStore {
    values: Mutex<ReleaseValues>,
    upgrades: Mutex<Vec<(String, ReleaseValues)>>,
    fail_upgrade: bool,
}

impl InMemoryReleaseStore {
    pub fn with_values(values: ReleaseValues) -> Self {
        Self {
            values: Mutex::new(values),
            ..Self::default()
        }
    }

    pub fn failing_upgrade(values: ReleaseValues) -> Self {
        Self {
            values: Mutex::new(values),
            fail_upgrade: true,
            ..Self::default()
        }
    }

    pub fn values(&self) -> ReleaseValues {
        self.values.lock().unwrap().clone()
    }

    pub fn upgrade_count(&self) -> usize {
        self.upgrades.lock().unwrap().len()
    }

    pub fn upgraded_versions(&self) -> Vec<String> {
        self.upgrades
            .lock()
            .unwrap()
            .iter()
            .map(|(version, _)| version.clone())
            .collect()
    }
}

#[async_trait]
impl ReleaseStore for InMemoryReleaseStore {
    async fn get_release(&self) -> Result<ReleaseValues, ReleaseError> {
        Ok(self.values())
    }

    async fn upgrade(&self, version: &str, values: &ReleaseValues) -> Result<(), ReleaseError> {
        if self.fail_upgrade {
            return Err(ReleaseError::UpgradeFailed {
                release: "kndp".to_string(),
                message: "timed out waiting for the condition".to_string(),
            });
        }
        self.upgrades
            .lock()
            .unwrap()
            .push((version.to_string(), values.clone()));
        *self.values.lock().unwrap() = values.clone();
        Ok(())
    }
}

/// Local registry counting create/delete calls
#[derive(Default)]
pub struct RecordingLocalRegistry {
    created: AtomicUsize,
    deleted: AtomicUsize,
}

impl RecordingLocalRegistry {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalRegistry for RecordingLocalRegistry {
    async fn create_local(&self) -> Result<(), LocalRegistryError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_local(&self) -> Result<(), LocalRegistryError> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
