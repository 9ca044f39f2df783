//! Command-line interface: a `serve` command hosting the demo echo engine.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::engine::EchoEngine;
use crate::runtime_config::RuntimeConfig;
use crate::schema::{FieldListSchema, StaticSchemaProvider};
use crate::server::{GraphQLService, HttpServer};

#[derive(Parser)]
#[command(name = "graphql-endpoint")]
#[command(about = "GraphQL HTTP endpoint over a pluggable execution engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the endpoint with the demo echo engine
    Serve {
        /// Address and port to bind the server to
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

/// Execute the CLI command provided by the user.
///
/// # Errors
///
/// Returns an error if the server fails to bind or the signal handler
/// cannot be installed.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { addr } => serve(&addr),
    }
}

fn serve(addr: &str) -> anyhow::Result<()> {
    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let schema = FieldListSchema::new(vec!["echo".to_string()], Vec::new());
    let service = GraphQLService::new(
        Arc::new(StaticSchemaProvider::new(schema)),
        Arc::new(EchoEngine),
    );

    let handle = HttpServer(service).start(addr)?;
    info!(addr, stack_size = config.stack_size, "graphql endpoint listening");

    wait_for_shutdown()?;
    handle.stop();
    info!("server stopped");
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown() -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "shutdown signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> anyhow::Result<()> {
    loop {
        std::thread::park();
    }
}
