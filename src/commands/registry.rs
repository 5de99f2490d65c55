//! Registry commands: add, list, remove, copy, verify
//!
//! Each handler wires the Kubernetes and Helm adapters for one context and
//! delegates to the services layer.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::debug;

use crate::config::KndpConfig;
use crate::domain::{Domains, Registry};
use crate::infrastructure::{HelmReleaseStore, KubeLocalRegistry, KubeSecretStore};
use crate::k8s;
use crate::services::{
    DeleteOutcome, RegistryManager, RegistryStore, ReleaseSynchronizer, Replicator,
};
use crate::ui;

/// Arguments of `registry add`
pub struct AddArgs {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub default: bool,
    pub local: bool,
}

async fn manager(config: &KndpConfig, context: Option<&str>) -> Result<RegistryManager> {
    let client = k8s::create_client(context).await?;
    let namespace = config.engine.namespace.as_str();
    debug!(
        "Using namespace {} in context {}",
        namespace,
        context.unwrap_or("<current>")
    );

    let secrets = Arc::new(KubeSecretStore::new(client.clone(), namespace));
    let release = Arc::new(HelmReleaseStore::new(
        &config.engine,
        context.map(str::to_string),
    ));
    let local = Arc::new(KubeLocalRegistry::new(client, namespace, &config.registry));
    let domains = Domains::new(
        config.local_domain(),
        config.registry.default_remote_domain.clone(),
    );

    Ok(RegistryManager::new(
        RegistryStore::new(secrets),
        ReleaseSynchronizer::new(release, config.engine.chart_version.clone(), domains),
        local,
    ))
}

async fn store(config: &KndpConfig, context: &str) -> Result<RegistryStore> {
    let client = k8s::create_client(Some(context))
        .await
        .with_context(|| format!("Failed to connect to context {}", context))?;
    Ok(RegistryStore::new(Arc::new(KubeSecretStore::new(
        client,
        &config.engine.namespace,
    ))))
}

/// Find a stored registry by its server URL
fn find_by_server(registries: Vec<Registry>, server: &str) -> Option<Registry> {
    let wanted = server.trim_end_matches('/');
    registries.into_iter().find(|registry| {
        registry
            .server_url()
            .is_some_and(|url| url.split(',').any(|s| s.trim_end_matches('/') == wanted))
            || registry
                .config
                .auths
                .keys()
                .any(|key| key.trim_end_matches('/') == wanted)
    })
}

pub async fn add(config: &KndpConfig, context: Option<&str>, args: AddArgs) -> Result<()> {
    let mut registry = if args.local {
        Registry::default()
    } else {
        match (args.server, args.username, args.password, args.email) {
            (Some(server), Some(username), Some(password), Some(email)) => {
                Registry::new(server, username, password, email)
            }
            _ => bail!("Server URL, username, password and email are required"),
        }
    };
    registry.set_local(args.local);
    registry.set_default(args.default);

    let manager = manager(config, context).await?;
    manager.validate(&registry).await?;

    match manager.create(&registry).await? {
        Some(name) => ui::print_success(&format!(
            "Registry {} added as secret {}",
            registry.joined_servers(),
            name
        )),
        None => ui::print_success(&format!(
            "Local registry added at {}",
            manager.domains().local
        )),
    }
    if registry.default {
        ui::print_info(&format!(
            "Default registry is now {}",
            registry.domain(manager.domains())
        ));
    }
    Ok(())
}

pub async fn list(config: &KndpConfig, context: Option<&str>) -> Result<()> {
    let manager = manager(config, context).await?;
    let registries = manager.list_with_default().await?;

    ui::print_header("Registries");
    if registries.is_empty() {
        ui::print_warning("No registries found");
        return Ok(());
    }
    for (registry, default) in &registries {
        ui::print_registry_row(
            &registry.joined_servers(),
            registry.name.as_deref().unwrap_or("-"),
            *default,
        );
    }
    println!();
    println!("{} {}", registries.len().to_string().bold(), "registries".dimmed());
    Ok(())
}

pub async fn remove(
    config: &KndpConfig,
    context: Option<&str>,
    server: Option<String>,
    local: bool,
) -> Result<()> {
    let manager = manager(config, context).await?;

    let mut registry = if local {
        Registry::local()
    } else {
        let Some(server) = server else {
            bail!("Server URL is required");
        };
        let registries = manager.list().await?;
        find_by_server(registries, &server)
            .with_context(|| format!("Registry {} not found in context", server))?
    };
    let default = manager.is_current_default(&registry).await?;
    registry.set_default(default);

    match manager.delete(&registry).await? {
        DeleteOutcome::Deleted => ui::print_success(&format!(
            "Registry {} removed",
            if local {
                manager.domains().local.clone()
            } else {
                registry.joined_servers()
            }
        )),
        DeleteOutcome::NotReferenced => ui::print_warning(&format!(
            "Registry {} was not referenced by the engine release; stale secret removed",
            registry.joined_servers()
        )),
        DeleteOutcome::NothingToDelete => {
            ui::print_warning("Not found any registry in context.")
        }
    }
    Ok(())
}

pub async fn copy(config: &KndpConfig, source: &str, destination: &str) -> Result<()> {
    let replicator = Replicator::new(store(config, source).await?, store(config, destination).await?);
    let report = replicator.copy().await?;

    for name in &report.copied {
        println!("   {} {}", "copied".green(), name);
    }
    for server in &report.skipped {
        println!("   {} {}", "exists".yellow(), server);
    }
    for name in &report.unreadable {
        println!("   {} {}", "unreadable".red(), name);
    }
    ui::print_success(&format!(
        "Copied {} registries from {} to {} ({} skipped)",
        report.copied.len(),
        source,
        destination,
        report.skipped.len()
    ));
    if !report.copied.is_empty() {
        ui::print_info("Run `kndp registry add` in the destination to reference them from its engine");
    }
    Ok(())
}

pub async fn verify(config: &KndpConfig, context: Option<&str>) -> Result<()> {
    let manager = manager(config, context).await?;
    let report = manager.verify().await?;

    if report.is_consistent() {
        ui::print_success("Engine release and registry secrets are in sync");
        return Ok(());
    }
    for name in &report.dangling {
        println!("   {} {} (referenced, no secret)", "dangling".red().bold(), name);
    }
    for name in &report.orphaned {
        println!("   {} {} (secret, not referenced)", "orphaned".yellow().bold(), name);
    }
    bail!(
        "{} dangling and {} orphaned registry references",
        report.dangling.len(),
        report.orphaned.len()
    )
}
