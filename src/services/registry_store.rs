//! Registry store - registries persisted as labelled secrets

use k8s_openapi::api::core::v1::Secret;
use std::sync::Arc;
use tracing::debug;

use crate::domain::secret::{self, REGISTRY_LABEL_SELECTOR};
use crate::domain::Registry;
use crate::error::StoreError;
use crate::infrastructure::SecretStore;

/// Lists, creates and deletes registry secrets in one namespace
#[derive(Clone)]
pub struct RegistryStore {
    secrets: Arc<dyn SecretStore>,
}

impl RegistryStore {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// All registries in the context, in no particular order
    pub async fn list(&self) -> Result<Vec<Registry>, StoreError> {
        let secrets = self.secrets.list(REGISTRY_LABEL_SELECTOR).await?;
        Ok(secrets.iter().map(secret::decode).collect())
    }

    /// Duplicate check, see [`Registry::exists_in`]
    pub fn exists(candidate: &Registry, existing: &[Registry]) -> bool {
        candidate.exists_in(existing)
    }

    /// Persist a remote registry as a new secret
    pub async fn create(&self, registry: &Registry) -> Result<Secret, StoreError> {
        if registry.local {
            return Err(StoreError::Rejected {
                operation: "create",
                message: "local registries are not backed by a secret".to_string(),
            });
        }
        let spec = secret::encode(registry);
        let created = self.secrets.create(&spec).await?;
        debug!(
            "Stored registry {} as secret {:?}",
            registry.joined_servers(),
            created.metadata.name
        );
        Ok(created)
    }

    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.secrets.delete(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::InMemorySecretStore;

    fn ghcr() -> Registry {
        Registry::new("https://ghcr.io/org", "octocat", "s3cret", "octocat@github.com")
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let secrets = Arc::new(InMemorySecretStore::new());
        let store = RegistryStore::new(secrets.clone());

        let created = store.create(&ghcr()).await.unwrap();
        let name = created.metadata.name.clone().unwrap();
        assert!(name.starts_with("registry-server-auth-"));

        let registries = store.list().await.unwrap();
        assert_eq!(registries.len(), 1);
        assert_eq!(registries[0].name.as_deref(), Some(name.as_str()));
        assert_eq!(registries[0].config.auths, ghcr().config.auths);
        assert!(RegistryStore::exists(&ghcr(), &registries));
    }

    #[test]
    fn test_list_empty_namespace() {
        let store = RegistryStore::new(Arc::new(InMemorySecretStore::new()));
        let registries = tokio_test::block_on(store.list()).unwrap();
        assert!(registries.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejected_surfaces_error() {
        let store = RegistryStore::new(Arc::new(InMemorySecretStore::rejecting_create()));
        let err = store.create(&ghcr()).await.unwrap_err();
        assert!(err.to_string().contains("forbidden"));
    }

    #[tokio::test]
    async fn test_create_local_rejected() {
        let secrets = Arc::new(InMemorySecretStore::new());
        let store = RegistryStore::new(secrets.clone());
        assert!(store.create(&Registry::local()).await.is_err());
        assert!(secrets.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = RegistryStore::new(Arc::new(InMemorySecretStore::new()));
        let err = store.delete("registry-server-auth-missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_ignores_unlabelled_secrets() {
        let secrets = Arc::new(InMemorySecretStore::new());
        secrets.create(&Secret::default()).await.unwrap();
        let store = RegistryStore::new(secrets);
        assert!(store.list().await.unwrap().is_empty());
    }
}
