// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet service (fleet-service)
//!
//! Background process that owns the supervisor fleet's node map, governed
//! agent calls, and periodic state monitoring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fleet_agent_client::ReqwestAgentTransport;
use fleet_config::{ConfigLoader, HotReloader, DEFAULT_POLL_INTERVAL};
use fleet_core::{Clock, SystemClock, TracingActivityLogSink};
use fleet_service::{FleetReloadObserver, FleetService, FleetServiceConfig};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_SYSTEM_CONFIG: &str = "config/fleet.toml";
const DEFAULT_NODE_LIST: &str = "config/nodelist.toml";
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("fleet-service {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("fleet-service {}", env!("CARGO_PKG_VERSION"));
                println!("Supervisor fleet management plane.");
                println!();
                println!("USAGE:");
                println!("    fleet-service");
                println!();
                println!("Reads config/fleet.toml (required) and config/nodelist.toml");
                println!("(optional, hot-reloaded) from the current directory.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: fleet-service [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    setup_logging();

    let system_path = PathBuf::from(DEFAULT_SYSTEM_CONFIG);
    let node_list_path = PathBuf::from(DEFAULT_NODE_LIST);
    let node_list_path = node_list_path.exists().then_some(node_list_path);

    let (reloader, warnings) = HotReloader::new(system_path, node_list_path)?;
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    let reloader = Arc::new(reloader);
    let config = reloader.current();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let transport = Arc::new(ReqwestAgentTransport::new());
    let sink = Arc::new(TracingActivityLogSink);

    let mut service_config = FleetServiceConfig::default();
    service_config.admission_capacity = config.performance.max_concurrent_connections;
    let service = Arc::new(FleetService::new(service_config, transport, clock, sink));

    for node in &config.nodes {
        if let Err(err) = service.add_node(node) {
            tracing::error!(node = %node.name, error = %err, "failed to register node at startup");
        }
    }

    service.start();

    let shutdown = CancellationToken::new();
    reloader
        .clone()
        .start(Arc::new(FleetReloadObserver::new(service.clone())), DEFAULT_POLL_INTERVAL, shutdown.clone())?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(port = config.server.port, nodes = config.nodes.len(), "fleet service ready");
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }

    shutdown.cancel();
    service.stop(SHUTDOWN_DEADLINE).await;
    info!("fleet service stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
