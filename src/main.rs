use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::time::Duration;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod k8s;
mod services;
mod tools;
mod ui;

use cli::{Cli, Commands, RegistryCommands};
use commands::registry;
use config::KndpConfig;

/// Run a command until it finishes, ctrl-c arrives, or the timeout elapses.
///
/// Steps already applied to the cluster are not rolled back.
async fn run_cancellable<F>(command: F, timeout: Option<Duration>) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let deadline = async {
        match timeout {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = command => result,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("Interrupted; steps already applied to the cluster were kept")
        }
        _ = deadline => {
            anyhow::bail!(
                "Timed out after {}; steps already applied to the cluster were kept",
                humantime::format_duration(timeout.unwrap_or_default())
            )
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = KndpConfig::load(cli.config.as_deref())
        .context("Failed to load kndp configuration")?
        .with_namespace(cli.namespace);
    let context = cli.context.as_deref();

    match cli.command {
        Commands::Registry { command } => match command {
            RegistryCommands::Add {
                server,
                username,
                password,
                email,
                default,
                local,
            } => {
                let args = registry::AddArgs {
                    server,
                    username,
                    password,
                    email,
                    default,
                    local,
                };
                registry::add(&config, context, args).await?;
            }
            RegistryCommands::List => {
                registry::list(&config, context).await?;
            }
            RegistryCommands::Remove { server, local } => {
                registry::remove(&config, context, server, local).await?;
            }
            RegistryCommands::Copy {
                source,
                destination,
            } => {
                registry::copy(&config, &source, &destination).await?;
            }
            RegistryCommands::Verify => {
                registry::verify(&config, context).await?;
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.debug {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let timeout = cli.timeout;
    if let Err(e) = run_cancellable(execute(cli), timeout).await {
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
