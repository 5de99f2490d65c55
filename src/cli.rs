//! CLI definitions for kndp
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "kndp",
    version,
    about = "Manage package registry credentials for the kndp engine",
    long_about = "Stores registry credentials as Kubernetes secrets and keeps the engine's\nimagePullSecrets and default registry in sync with them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short = 'D', long, global = true)]
    pub debug: bool,

    /// Kubernetes context (defaults to the current context)
    #[arg(long, global = true, env = "KNDP_CONTEXT")]
    pub context: Option<String>,

    /// Namespace of the engine release and registry secrets
    #[arg(long, global = true, env = "KNDP_NAMESPACE")]
    pub namespace: Option<String>,

    /// Configuration file
    #[arg(long, global = true, env = "KNDP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Abort the command after this long (e.g. 30s, 5m)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Registry credential operations
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
}

/// Registry subcommands
#[derive(Subcommand)]
pub enum RegistryCommands {
    /// Add a registry and reference it from the engine release
    Add {
        /// Registry server URL (e.g. https://ghcr.io/org)
        #[arg(required_unless_present = "local")]
        server: Option<String>,

        /// Registry username
        #[arg(long, required_unless_present = "local")]
        username: Option<String>,

        /// Registry password or token
        #[arg(
            long,
            env = "KNDP_REGISTRY_PASSWORD",
            hide_env_values = true,
            required_unless_present = "local"
        )]
        password: Option<String>,

        /// Registry email
        #[arg(long, required_unless_present = "local")]
        email: Option<String>,

        /// Make this the engine's default registry
        #[arg(long)]
        default: bool,

        /// Deploy the in-cluster registry instead of storing credentials
        #[arg(long, conflicts_with_all = ["server", "username", "email"])]
        local: bool,
    },

    /// List registries in the context
    List,

    /// Remove a registry and its reference from the engine release
    Remove {
        /// Server URL of the registry to remove
        #[arg(required_unless_present = "local")]
        server: Option<String>,

        /// Remove the in-cluster registry
        #[arg(long, conflicts_with = "server")]
        local: bool,
    },

    /// Copy registry secrets from one context to another
    Copy {
        /// Source Kubernetes context
        #[arg(long, required = true)]
        source: String,

        /// Destination Kubernetes context
        #[arg(long, required = true)]
        destination: String,
    },

    /// Report drift between engine release values and registry secrets
    Verify,
}
