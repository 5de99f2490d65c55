use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::error::StoreError;

/// Create Kubernetes client for a kube context, or the inferred default
pub async fn create_client(context: Option<&str>) -> Result<Client, StoreError> {
    let label = context.unwrap_or("<current>").to_string();
    let client_error = |message: String| StoreError::Client {
        context: label.clone(),
        message,
    };

    let config = match context {
        Some(ctx) => {
            debug!("Loading kubeconfig for context {}", ctx);
            let kubeconfig = Kubeconfig::read()
                .map_err(|e| client_error(format!("Failed to read kubeconfig: {}", e)))?;
            let options = KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| client_error(format!("Failed to load context: {}", e)))?
        }
        None => Config::infer()
            .await
            .map_err(|e| client_error(format!("Failed to infer kubeconfig: {}", e)))?,
    };

    Client::try_from(config)
        .map_err(|e| client_error(format!("Failed to create Kubernetes client: {}", e)))
}
