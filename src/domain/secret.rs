//! Registry <-> Secret codec
//!
//! One `kubernetes.io/dockerconfigjson` secret per registry. The data blob is
//! the docker config JSON, the server URLs live in an annotation and a label
//! marks the secret for selection.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use tracing::debug;

use super::registry::{Registry, RegistryConfig, SERVER_URL_ANNOTATION};

/// Label selecting registry credential secrets
pub const REGISTRY_LABEL: &str = "kndp-registry-auth-config";
/// `kndp-registry-auth-config=true`
pub const REGISTRY_LABEL_SELECTOR: &str = "kndp-registry-auth-config=true";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY: &str = "kndp";
pub const SECRET_NAME_PREFIX: &str = "registry-server-auth-";
pub const DOCKER_CONFIG_KEY: &str = ".dockerconfigjson";
pub const DOCKER_CONFIG_TYPE: &str = "kubernetes.io/dockerconfigjson";

/// Build the secret body for a registry. The name is left to the cluster.
pub fn encode(registry: &Registry) -> Secret {
    // BTreeMap of plain strings always serializes
    let blob = serde_json::to_vec(&registry.config).unwrap_or_default();

    let mut annotations = registry.annotations.clone();
    annotations.insert(SERVER_URL_ANNOTATION.to_string(), registry.joined_servers());

    let mut labels = BTreeMap::new();
    labels.insert(REGISTRY_LABEL.to_string(), "true".to_string());
    labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string());

    let mut data = BTreeMap::new();
    data.insert(DOCKER_CONFIG_KEY.to_string(), ByteString(blob));

    Secret {
        metadata: ObjectMeta {
            generate_name: Some(SECRET_NAME_PREFIX.to_string()),
            annotations: Some(annotations),
            labels: Some(labels),
            ..Default::default()
        },
        data: Some(data),
        type_: Some(DOCKER_CONFIG_TYPE.to_string()),
        ..Default::default()
    }
}

/// Rebuild a registry from a fetched secret.
///
/// `default` and `local` are not persisted and come back as false. A missing
/// or unreadable data blob yields a registry without auths.
pub fn decode(secret: &Secret) -> Registry {
    let config = secret
        .data
        .as_ref()
        .and_then(|data| data.get(DOCKER_CONFIG_KEY))
        .and_then(|blob| match serde_json::from_slice::<RegistryConfig>(&blob.0) {
            Ok(config) => Some(config),
            Err(e) => {
                debug!(
                    "Unreadable docker config in secret {:?}: {}",
                    secret.metadata.name, e
                );
                None
            }
        })
        .unwrap_or_default();

    Registry {
        config,
        default: false,
        local: false,
        name: secret.metadata.name.clone(),
        resource_version: secret.metadata.resource_version.clone(),
        annotations: secret.metadata.annotations.clone().unwrap_or_default(),
    }
}
