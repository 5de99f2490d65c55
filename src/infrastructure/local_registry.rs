//! In-cluster registry service
//!
//! A single-replica `registry` Deployment fronted by a ClusterIP Service of
//! the same name in the engine namespace.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::domain::secret::{MANAGED_BY, MANAGED_BY_LABEL};
use crate::error::LocalRegistryError;

/// Registration of the in-cluster registry service
#[async_trait]
pub trait LocalRegistry: Send + Sync {
    async fn create_local(&self) -> Result<(), LocalRegistryError>;
    async fn delete_local(&self) -> Result<(), LocalRegistryError>;
}

/// Local registry managed through the Kubernetes API
pub struct KubeLocalRegistry {
    client: Client,
    namespace: String,
    name: String,
    image: String,
    port: i32,
}

impl KubeLocalRegistry {
    pub fn new(client: Client, namespace: &str, config: &RegistryConfig) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            name: config.local_service_name.clone(),
            image: config.local_image.clone(),
            port: config.local_port,
        }
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), self.name.clone());
        labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string());
        labels
    }

    fn metadata(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.labels()),
            ..Default::default()
        }
    }

    fn deployment(&self) -> Deployment {
        Deployment {
            metadata: self.metadata(),
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: LabelSelector {
                    match_labels: Some(self.labels()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(self.labels()),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: self.name.clone(),
                            image: Some(self.image.clone()),
                            ports: Some(vec![ContainerPort {
                                container_port: self.port,
                                ..Default::default()
                            }]),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn service(&self) -> Service {
        Service {
            metadata: self.metadata(),
            spec: Some(ServiceSpec {
                selector: Some(self.labels()),
                ports: Some(vec![ServicePort {
                    port: self.port,
                    target_port: Some(IntOrString::Int(self.port)),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LocalRegistry for KubeLocalRegistry {
    async fn create_local(&self) -> Result<(), LocalRegistryError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), &self.namespace);
        match deployments.create(&PostParams::default(), &self.deployment()).await {
            Ok(_) => {}
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                warn!("Deployment {} already exists", self.name);
            }
            Err(source) => {
                return Err(LocalRegistryError::Create {
                    resource: format!("deployment/{}", self.name),
                    source,
                })
            }
        }

        let services: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);
        match services.create(&PostParams::default(), &self.service()).await {
            Ok(_) => {}
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                warn!("Service {} already exists", self.name);
            }
            Err(source) => {
                return Err(LocalRegistryError::Create {
                    resource: format!("service/{}", self.name),
                    source,
                })
            }
        }

        info!(
            "Local registry available at {}.{}.svc.cluster.local:{}",
            self.name, self.namespace, self.port
        );
        Ok(())
    }

    async fn delete_local(&self) -> Result<(), LocalRegistryError> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);
        match services.delete(&self.name, &DeleteParams::default()).await {
            Ok(_) => {}
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                warn!("Service {} not found", self.name);
            }
            Err(source) => {
                return Err(LocalRegistryError::Delete {
                    resource: format!("service/{}", self.name),
                    source,
                })
            }
        }

        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), &self.namespace);
        match deployments.delete(&self.name, &DeleteParams::default()).await {
            Ok(_) => {}
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                warn!("Deployment {} not found", self.name);
            }
            Err(source) => {
                return Err(LocalRegistryError::Delete {
                    resource: format!("deployment/{}", self.name),
                    source,
                })
            }
        }

        info!("Local registry removed from {}", self.namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Config;

    fn offline_client() -> Client {
        let config = Config::new("http://127.0.0.1:6443".parse().unwrap());
        Client::try_from(config).unwrap()
    }

    #[tokio::test]
    async fn test_manifests_share_labels_and_port() {
        let local = KubeLocalRegistry::new(
            offline_client(),
            "kndp-system",
            &RegistryConfig::default(),
        );

        let deployment = local.deployment();
        assert_eq!(deployment.metadata.name.as_deref(), Some("registry"));
        assert_eq!(deployment.metadata.namespace.as_deref(), Some("kndp-system"));
        let spec = deployment.spec.unwrap();
        let container = &spec.template.spec.unwrap().containers[0];
        assert_eq!(container.image.as_deref(), Some("registry:2"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 5000);

        let service = local.service();
        let service_spec = service.spec.unwrap();
        assert_eq!(service_spec.selector, spec.selector.match_labels);
        assert_eq!(service_spec.ports.unwrap()[0].port, 5000);
        assert_eq!(
            service.metadata.labels.unwrap()[MANAGED_BY_LABEL],
            MANAGED_BY
        );
    }
}
