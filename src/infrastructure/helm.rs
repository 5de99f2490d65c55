//! Installer release store
//!
//! Reads and upgrades the engine's Helm release through the `helm` CLI.
//! Values travel as JSON, which helm accepts as YAML.

use async_trait::async_trait;
use std::io::Write;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::ReleaseValues;
use crate::error::ReleaseError;
use crate::tools::{get_tool_path, tools};

/// Installer release with read and upgrade operations
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Current user-supplied values of the release
    async fn get_release(&self) -> Result<ReleaseValues, ReleaseError>;

    /// Upgrade the release to `version` with `values` as the full value set
    async fn upgrade(&self, version: &str, values: &ReleaseValues) -> Result<(), ReleaseError>;
}

/// Release store driving the helm binary
pub struct HelmReleaseStore {
    release: String,
    namespace: String,
    chart: String,
    repo: String,
    kube_context: Option<String>,
}

impl HelmReleaseStore {
    pub fn new(engine: &EngineConfig, kube_context: Option<String>) -> Self {
        Self {
            release: engine.release_name.clone(),
            namespace: engine.namespace.clone(),
            chart: engine.chart_name.clone(),
            repo: engine.chart_repo.clone(),
            kube_context,
        }
    }

    fn scope_args(&self) -> Vec<String> {
        let mut args = vec!["--namespace".to_string(), self.namespace.clone()];
        if let Some(ctx) = &self.kube_context {
            args.push("--kube-context".to_string());
            args.push(ctx.clone());
        }
        args
    }

    async fn run(&self, args: &[String]) -> Result<Output, ReleaseError> {
        let helm = get_tool_path(tools::HELM);
        debug!("Running {} {}", helm, args.join(" "));
        Command::new(&helm)
            .args(args)
            .output()
            .await
            .map_err(|e| ReleaseError::CommandFailed {
                command: format!("{} {}", helm, args.first().cloned().unwrap_or_default()),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ReleaseStore for HelmReleaseStore {
    async fn get_release(&self) -> Result<ReleaseValues, ReleaseError> {
        let mut args = vec![
            "get".to_string(),
            "values".to_string(),
            self.release.clone(),
            "--output".to_string(),
            "json".to_string(),
        ];
        args.extend(self.scope_args());

        let output = self.run(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not found") {
                return Err(ReleaseError::NotFound {
                    release: self.release.clone(),
                    namespace: self.namespace.clone(),
                });
            }
            return Err(ReleaseError::CommandFailed {
                command: "helm get values".to_string(),
                message: stderr,
            });
        }

        parse_values(&output.stdout)
    }

    async fn upgrade(&self, version: &str, values: &ReleaseValues) -> Result<(), ReleaseError> {
        let upgrade_error = |message: String| ReleaseError::UpgradeFailed {
            release: self.release.clone(),
            message,
        };

        let mut file = tempfile::Builder::new()
            .prefix("kndp-values-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| upgrade_error(format!("Failed to create values file: {}", e)))?;
        let body = serde_json::to_vec(&values.to_value())
            .map_err(|e| upgrade_error(format!("Failed to serialize values: {}", e)))?;
        file.write_all(&body)
            .map_err(|e| upgrade_error(format!("Failed to write values file: {}", e)))?;

        let mut args = vec![
            "upgrade".to_string(),
            self.release.clone(),
            self.chart.clone(),
            "--repo".to_string(),
            self.repo.clone(),
            "--version".to_string(),
            version.to_string(),
            "--reset-values".to_string(),
            "--values".to_string(),
            file.path().to_string_lossy().to_string(),
        ];
        args.extend(self.scope_args());

        let output = self.run(&args).await?;
        if !output.status.success() {
            return Err(upgrade_error(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        debug!("Upgraded release {} to {}", self.release, version);
        Ok(())
    }
}

/// `helm get values -o json` prints `null` for a release without user values
fn parse_values(stdout: &[u8]) -> Result<ReleaseValues, ReleaseError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(ReleaseValues::default());
    }
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| ReleaseError::InvalidValues {
            message: e.to_string(),
        })?;
    ReleaseValues::from_value(value)
}
