//! alertscaled — the alertscale daemon.
//!
//! Single binary that assembles the alertscale subsystems:
//! - Replica store (redb)
//! - Autoscaler (alert-driven replica policy)
//! - HTTP API (Alertmanager webhook, function registry, metrics)
//!
//! # Usage
//!
//! ```text
//! alertscaled serve --config /etc/alertscale/alertscale.toml --port 8080
//! alertscaled config --config /etc/alertscale/alertscale.toml
//! ```

mod server;

use std::path::PathBuf;

use alertscale_core::AlertscaleConfig;
use alertscale_core::config::GatewayConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alertscaled", about = "Alert-driven replica autoscaler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the alert webhook and function registry.
    Serve {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Command-line settings; each one overrides its config file counterpart.
#[derive(clap::Args, Debug, Default)]
struct Overrides {
    /// Path to alertscale.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Data directory for the replica store.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Namespace for function names without a `.namespace` suffix.
    #[arg(long)]
    default_namespace: Option<String>,
}

impl Overrides {
    fn load(self) -> anyhow::Result<AlertscaleConfig> {
        let mut config = match &self.config {
            Some(path) => AlertscaleConfig::from_file(path)?,
            None => AlertscaleConfig::default(),
        };
        self.apply(&mut config.gateway);
        Ok(config)
    }

    fn apply(self, gateway: &mut GatewayConfig) {
        if let Some(port) = self.port {
            gateway.port = port;
        }
        if let Some(data_dir) = self.data_dir {
            gateway.data_dir = data_dir;
        }
        if let Some(ns) = self.default_namespace {
            gateway.default_namespace = ns;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,alertscaled=debug,alertscale=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { overrides } => server::run(overrides.load()?.gateway).await,
        Command::Config { overrides } => {
            print!("{}", overrides.load()?.to_toml_string()?);
            Ok(())
        }
    }
}
