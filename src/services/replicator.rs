//! Replicator - copies registry secrets between contexts
//!
//! Only secrets are copied. The destination release is left untouched, so
//! copied registries are not referenced by the destination engine until
//! added there.

use tracing::{info, warn};

use super::registry_store::RegistryStore;
use crate::error::StoreError;

/// What a copy did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Secret names created in the destination
    pub copied: Vec<String>,
    /// Servers skipped because the destination already had them
    pub skipped: Vec<String>,
    /// Source secrets whose docker config held no credentials
    pub unreadable: Vec<String>,
}

pub struct Replicator {
    source: RegistryStore,
    destination: RegistryStore,
}

impl Replicator {
    pub fn new(source: RegistryStore, destination: RegistryStore) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Copy every source registry the destination does not already hold.
    ///
    /// Stops at the first failed create; registries copied before it stay.
    pub async fn copy(&self) -> Result<CopyReport, StoreError> {
        let registries = self.source.list().await?;
        if registries.is_empty() {
            warn!("Registries not found");
            return Ok(CopyReport::default());
        }

        let mut existing = self.destination.list().await?;
        let mut report = CopyReport::default();

        for mut registry in registries {
            if registry.config.auths.is_empty() {
                let name = registry.name.clone().unwrap_or_default();
                warn!("Registry secret {} has no readable credentials, skipping", name);
                report.unreadable.push(name);
                continue;
            }

            registry.clear_identity();
            let servers = registry.joined_servers();

            if RegistryStore::exists(&registry, &existing) {
                warn!("Registry {} already exists in destination, skipping", servers);
                report.skipped.push(servers);
                continue;
            }

            let created = self.destination.create(&registry).await?;
            let name = created.metadata.name.unwrap_or_default();
            info!("Copied registry {} as {}", servers, name);

            registry.name = Some(name.clone());
            existing.push(registry);
            report.copied.push(name);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::secret::{self, DOCKER_CONFIG_KEY};
    use crate::domain::Registry;
    use crate::infrastructure::testing::InMemorySecretStore;
    use crate::infrastructure::SecretStore;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    async fn seeded(registries: &[Registry]) -> Arc<InMemorySecretStore> {
        let secrets = Arc::new(InMemorySecretStore::new());
        let store = RegistryStore::new(secrets.clone());
        for registry in registries {
            store.create(registry).await.unwrap();
        }
        secrets
    }

    fn ghcr() -> Registry {
        Registry::new("https://ghcr.io/org", "octocat", "s3cret", "octocat@github.com")
    }

    fn quay() -> Registry {
        Registry::new("https://quay.io/team", "robot", "t0ken", "robot@quay.io")
    }

    #[tokio::test]
    async fn test_copy_into_empty_destination() {
        let source = seeded(&[ghcr(), quay()]).await;
        let destination = Arc::new(InMemorySecretStore::new());
        let replicator = Replicator::new(
            RegistryStore::new(source.clone()),
            RegistryStore::new(destination.clone()),
        );

        let report = replicator.copy().await.unwrap();
        assert_eq!(report.copied.len(), 2);
        assert!(report.skipped.is_empty());

        let copied = RegistryStore::new(destination.clone()).list().await.unwrap();
        let mut servers: Vec<String> = copied.iter().map(|r| r.joined_servers()).collect();
        servers.sort();
        assert_eq!(servers, ["https://ghcr.io/org", "https://quay.io/team"]);
        assert_eq!(source.names().len(), 2);
    }

    #[tokio::test]
    async fn test_copy_is_idempotent() {
        let source = seeded(&[ghcr(), quay()]).await;
        let destination = Arc::new(InMemorySecretStore::new());
        let replicator = Replicator::new(
            RegistryStore::new(source),
            RegistryStore::new(destination.clone()),
        );

        replicator.copy().await.unwrap();
        let report = replicator.copy().await.unwrap();
        assert!(report.copied.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(destination.names().len(), 2);
    }

    #[tokio::test]
    async fn test_copy_skips_existing() {
        let source = seeded(&[ghcr(), quay()]).await;
        let destination = seeded(&[ghcr()]).await;
        let replicator = Replicator::new(
            RegistryStore::new(source),
            RegistryStore::new(destination.clone()),
        );

        let report = replicator.copy().await.unwrap();
        assert_eq!(report.copied.len(), 1);
        assert_eq!(report.skipped, ["https://ghcr.io/org"]);
        assert_eq!(destination.names().len(), 2);
    }

    #[tokio::test]
    async fn test_copy_skips_unreadable_secret() {
        let source = seeded(&[quay()]).await;
        let mut garbled = secret::encode(&ghcr());
        let mut data = BTreeMap::new();
        data.insert(DOCKER_CONFIG_KEY.to_string(), ByteString(b"not json".to_vec()));
        garbled.data = Some(data);
        let garbled_name = source.create(&garbled).await.unwrap().metadata.name.unwrap();

        let destination = Arc::new(InMemorySecretStore::new());
        let replicator = Replicator::new(
            RegistryStore::new(source),
            RegistryStore::new(destination.clone()),
        );

        let report = replicator.copy().await.unwrap();
        assert_eq!(report.unreadable, [garbled_name]);
        assert_eq!(report.copied.len(), 1);

        let copied = RegistryStore::new(destination).list().await.unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].server_url(), Some("https://quay.io/team"));
    }

    #[tokio::test]
    async fn test_copy_empty_source() {
        let destination = Arc::new(InMemorySecretStore::new());
        let replicator = Replicator::new(
            RegistryStore::new(Arc::new(InMemorySecretStore::new())),
            RegistryStore::new(destination.clone()),
        );
        assert_eq!(replicator.copy().await.unwrap(), CopyReport::default());
        assert!(destination.calls().is_empty());
    }

    #[tokio::test]
    async fn test_copy_create_failure_propagates() {
        let source = seeded(&[ghcr()]).await;
        let replicator = Replicator::new(
            RegistryStore::new(source),
            RegistryStore::new(Arc::new(InMemorySecretStore::rejecting_create())),
        );
        assert!(replicator.copy().await.is_err());
    }
}
