//! weft-server: hosts the demo services declared in the service manifest.

mod config;
mod logging;
mod services;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use weft_di::{Container, ContainerBuilder};
use weft_fabric::{ServiceHost, ServiceManifest, ServiceRuntime};
use weft_fabric_di::register_fabric_support;

use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Weft server - DI-driven service hosting
#[derive(Parser)]
#[command(name = "weft-server")]
#[command(about = "Weft server - DI-driven service hosting")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default)
    Run,
    /// Validate configuration and service wiring, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging, cli.verbose);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Weft server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_wiring(config),
    }
}

/// Everything `run` and `check` share: a built container, the runtime it
/// feeds, and the manifest the runtime was verified against.
struct Wiring {
    runtime: Arc<ServiceRuntime>,
    container: Container,
    manifest: ServiceManifest,
}

fn wire(config: &AppConfig) -> Result<Wiring> {
    let runtime = Arc::new(ServiceRuntime::new());

    let mut builder = ContainerBuilder::new();
    register_fabric_support(&mut builder, runtime.clone());
    services::register_demo_services(&mut builder)?;
    let container = builder.build()?;

    let manifest = match &config.manifest {
        Some(path) => ServiceManifest::from_yaml_file(path)?,
        None => services::default_manifest(),
    };
    runtime.verify_manifest(&manifest)?;

    Ok(Wiring {
        runtime,
        container,
        manifest,
    })
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Phase: wire services");
    let wiring = wire(&config)?;
    tracing::info!(
        registrations = wiring.container.registration_count(),
        services = wiring.manifest.services.len(),
        "wiring complete"
    );

    let host = ServiceHost::new(wiring.runtime);
    host.open_all()?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    host.shutdown(config.server.shutdown_timeout).await;
    Ok(())
}

fn check_wiring(config: AppConfig) -> Result<()> {
    let wiring = wire(&config)?;
    println!(
        "Configuration is valid; {} service type(s) wired",
        wiring.manifest.services.len()
    );
    Ok(())
}
