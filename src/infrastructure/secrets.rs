//! Cluster secret store
//!
//! Namespaced `Secret` list/create/delete through the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;
use tracing::debug;

use crate::error::StoreError;

/// Secret persistence used by the registry store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// List secrets matching a label selector (`key=value`)
    async fn list(&self, label_selector: &str) -> Result<Vec<Secret>, StoreError>;

    /// Create a secret, returning it with cluster-assigned identity fields
    async fn create(&self, secret: &Secret) -> Result<Secret, StoreError>;

    /// Delete a secret by name. A missing secret is `StoreError::NotFound`.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Secret store backed by the Kubernetes API
pub struct KubeSecretStore {
    api: Api<Secret>,
    namespace: String,
}

impl KubeSecretStore {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn list(&self, label_selector: &str) -> Result<Vec<Secret>, StoreError> {
        let lp = ListParams::default().labels(label_selector);
        let secrets = self.api.list(&lp).await?;
        debug!(
            "Found {} secrets matching {} in {}",
            secrets.items.len(),
            label_selector,
            self.namespace
        );
        Ok(secrets.items)
    }

    async fn create(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let created = self.api.create(&PostParams::default(), secret).await?;
        debug!(
            "Created secret {:?} in {}",
            created.metadata.name, self.namespace
        );
        Ok(created)
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        match self.api.delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                debug!("Deleted secret {} in {}", name, self.namespace);
                Ok(())
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
