// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fleet-cli - a thin operator CLI over the fleet management plane.
//!
//! Every invocation loads `config/config.toml` and `config/nodelist.toml`
//! from the current directory, builds a `FleetService` in-process, runs one
//! operation, and exits — there is no daemon or IPC layer here. Node
//! additions and removals are persisted straight to `config/nodelist.toml`
//! so the next invocation (or the real `fleet-service` process, via its
//! hot reload) picks them up.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod output;
mod table;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fleet_agent_client::ReqwestAgentTransport;
use fleet_config::{ConfigLoader, NodeListFile};
use fleet_core::{Clock, FleetError, LogSource, NoOpActivityLogSink, NodeListEntry, SystemClock};
use fleet_service::{FleetService, FleetServiceConfig, HealthStatus};
use output::OutputFormat;
use table::{Column, Table};

const DEFAULT_SYSTEM_CONFIG: &str = "config/config.toml";
const DEFAULT_NODE_LIST: &str = "config/nodelist.toml";

#[derive(Parser)]
#[command(
    name = "fleet-cli",
    version,
    about = "Operator CLI for the supervisor fleet management plane"
)]
struct Cli {
    /// Directory holding config/config.toml and config/nodelist.toml
    #[arg(short = 'C', long = "config-dir", global = true, value_name = "DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Output format for commands that print structured data
    #[arg(short = 'o', long = "output", global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the configured node list
    #[command(subcommand)]
    Nodes(NodesCommand),
    /// Control a process on a node
    #[command(subcommand)]
    Proc(ProcCommand),
    /// Tail a process's log output
    Tail {
        node: String,
        process: String,
        /// Which log stream to read
        #[arg(long, value_enum, default_value_t = TailSource::Stdout)]
        source: TailSource,
        /// Keep polling for new lines until interrupted
        #[arg(long)]
        follow: bool,
    },
    /// Report fleet-wide connectivity health
    Health,
}

#[derive(Subcommand)]
enum NodesCommand {
    /// Add a node to config/nodelist.toml
    Add {
        name: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long, default_value = "")]
        environment: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// List configured nodes and their live snapshot
    List,
    /// Remove a node from config/nodelist.toml
    Rm { name: String },
}

#[derive(Subcommand)]
enum ProcCommand {
    Start { node: String, process: String },
    Stop { node: String, process: String },
    Restart { node: String, process: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TailSource {
    Stdout,
    Stderr,
}

impl From<TailSource> for LogSource {
    fn from(source: TailSource) -> Self {
        match source {
            TailSource::Stdout => LogSource::Stdout,
            TailSource::Stderr => LogSource::Stderr,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Nodes(NodesCommand::Add {
            name,
            host,
            port,
            environment,
            username,
            password,
        }) => {
            add_node(
                &cli.config_dir,
                NodeListEntry {
                    name,
                    environment,
                    host,
                    port,
                    username,
                    password,
                },
            )
        }
        Command::Nodes(NodesCommand::Rm { name }) => remove_node(&cli.config_dir, &name),
        Command::Nodes(NodesCommand::List) => list_nodes(&cli.config_dir, cli.output).await,
        Command::Proc(ProcCommand::Start { node, process }) => {
            proc_op(&cli.config_dir, &node, &process, ProcOp::Start).await
        }
        Command::Proc(ProcCommand::Stop { node, process }) => {
            proc_op(&cli.config_dir, &node, &process, ProcOp::Stop).await
        }
        Command::Proc(ProcCommand::Restart { node, process }) => {
            proc_op(&cli.config_dir, &node, &process, ProcOp::Restart).await
        }
        Command::Tail {
            node,
            process,
            source,
            follow,
        } => tail(&cli.config_dir, &node, &process, source.into(), follow).await,
        Command::Health => health(&cli.config_dir, cli.output).await,
    }
}

fn node_list_path(config_dir: &Path) -> PathBuf {
    config_dir.join(DEFAULT_NODE_LIST)
}

fn system_config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(DEFAULT_SYSTEM_CONFIG)
}

/// Read `config/nodelist.toml`, tolerating a missing file as an empty list.
fn read_node_list(path: &Path) -> Result<NodeListFile> {
    if !path.exists() {
        return Ok(NodeListFile::default());
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_node_list(path: &Path, file: &NodeListFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(file).context("serializing node list")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn add_node(config_dir: &Path, entry: NodeListEntry) -> Result<()> {
    entry.validate().map_err(anyhow::Error::msg)?;
    let path = node_list_path(config_dir);
    let mut file = read_node_list(&path)?;
    if file.nodes.iter().any(|n| n.name == entry.name) {
        bail!("node {} already exists in {}", entry.name, path.display());
    }
    let name = entry.name.clone();
    file.nodes.push(entry);
    write_node_list(&path, &file)?;
    println!("added node {name} to {}", path.display());
    Ok(())
}

fn remove_node(config_dir: &Path, name: &str) -> Result<()> {
    let path = node_list_path(config_dir);
    let mut file = read_node_list(&path)?;
    let before = file.nodes.len();
    file.nodes.retain(|n| n.name != name);
    if file.nodes.len() == before {
        bail!("node {name} not found in {}", path.display());
    }
    write_node_list(&path, &file)?;
    println!("removed node {name} from {}", path.display());
    Ok(())
}

/// Load the merged config and build a `FleetService` with every configured
/// node registered. Background monitoring is not started — callers that
/// need connectivity state call `warm_up` first.
fn build_service(config_dir: &Path) -> Result<(Arc<FleetService>, fleet_config::FleetConfig)> {
    let system_path = system_config_path(config_dir);
    let node_list = node_list_path(config_dir);
    let node_list = node_list.exists().then_some(node_list.as_path());
    let result = ConfigLoader::load(&system_path, node_list).with_context(|| format!("loading {}", system_path.display()))?;
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let transport = Arc::new(ReqwestAgentTransport::new());
    let sink = Arc::new(NoOpActivityLogSink);

    let mut service_config = FleetServiceConfig::default();
    service_config.admission_capacity = result.config.performance.max_concurrent_connections;
    let service = Arc::new(FleetService::new(service_config, transport, clock, sink));

    for node in &result.config.nodes {
        if let Err(err) = service.add_node(node) {
            eprintln!("warning: failed to register node {}: {err}", node.name);
        }
    }

    Ok((service, result.config))
}

/// Start the state monitor long enough for one tick to resolve
/// connectivity, then stop it. Used by commands that need `is_connected`
/// to be meaningful (`nodes list`, `health`) without running a daemon.
async fn warm_up(service: &FleetService) {
    service.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    service.stop(Duration::from_millis(200)).await;
}

async fn list_nodes(config_dir: &Path, output: OutputFormat) -> Result<()> {
    let (service, _config) = build_service(config_dir)?;
    warm_up(&service).await;
    let nodes = service.get_all_nodes()?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nodes)?),
        OutputFormat::Text => {
            println!("{}", color::header("NODES"));
            let mut table = Table::new(vec![
                Column::left("NAME"),
                Column::left("ENVIRONMENT"),
                Column::left("HOST"),
                Column::right("PORT"),
                Column::status("CONNECTED"),
                Column::right("PROCESSES"),
            ]);
            for node in &nodes {
                table.row(vec![
                    node.name.clone(),
                    node.environment.clone(),
                    node.host.clone(),
                    node.port.to_string(),
                    if node.is_connected { "connected".to_string() } else { "disconnected".to_string() },
                    node.process_count().to_string(),
                ]);
            }
            table.render(&mut std::io::stdout());
        }
    }
    Ok(())
}

enum ProcOp {
    Start,
    Stop,
    Restart,
}

async fn proc_op(config_dir: &Path, node: &str, process: &str, op: ProcOp) -> Result<()> {
    let (service, _config) = build_service(config_dir)?;
    let result = match op {
        ProcOp::Start => service.start_process(node, process).await,
        ProcOp::Stop => service.stop_process(node, process).await,
        ProcOp::Restart => service.restart_process(node, process).await,
    };
    match result {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(err) => Err(cli_error(err)),
    }
}

async fn tail(config_dir: &Path, node: &str, process: &str, source: LogSource, follow: bool) -> Result<()> {
    let (service, _config) = build_service(config_dir)?;

    let entries = service.get_process_logs(node, process, source).await.map_err(cli_error)?;
    for entry in &entries {
        print_log_entry(entry);
    }
    if !follow {
        return Ok(());
    }

    let subscriber = fleet_core::SubscriberId::new(uuid::Uuid::new_v4().to_string());
    service.subscribe(subscriber.clone(), node, process, source, -1).map_err(cli_error)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                let entries = service.poll_log_tail(&subscriber, node, process).await.map_err(cli_error)?;
                for entry in &entries {
                    print_log_entry(entry);
                }
            }
        }
    }
    service.unsubscribe(&subscriber, node, process);
    Ok(())
}

fn print_log_entry(entry: &fleet_engine::LogEntry) {
    let age = color::muted(&format!("[{}]", output::format_time_ago(entry.timestamp_epoch_ms)));
    println!("{age} {}", entry.message);
}

async fn health(config_dir: &Path, output: OutputFormat) -> Result<()> {
    let (service, _config) = build_service(config_dir)?;
    warm_up(&service).await;
    let health = service.health();

    match output {
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "status": match health.status {
                    HealthStatus::Healthy => "healthy",
                    HealthStatus::Degraded => "degraded",
                    HealthStatus::Unhealthy => "unhealthy",
                },
                "total_nodes": health.total_nodes,
                "connected_nodes": health.connected_nodes,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
        OutputFormat::Text => {
            let status = match health.status {
                HealthStatus::Healthy => "healthy",
                HealthStatus::Degraded => "degraded",
                HealthStatus::Unhealthy => "unhealthy",
            };
            println!(
                "{}: {}/{} nodes connected",
                color::status(status),
                health.connected_nodes,
                health.total_nodes
            );
        }
    }

    if health.status == HealthStatus::Unhealthy {
        std::process::exit(1);
    }
    Ok(())
}

fn cli_error(err: FleetError) -> anyhow::Error {
    anyhow::Error::msg(err.to_string())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
