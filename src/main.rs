//! Thin CLI over the testbed workflows
//!
//! Wires the production services (ssh control channel, file-backed host
//! provider) into the orchestrator and exposes one subcommand per workflow.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use benchctl::{
    services::{FileHostProvider, SshChannel},
    BenchParameters, NodeParameters, Orchestrator, Settings,
};

#[derive(Parser)]
#[command(name = "benchctl")]
#[command(about = "Deploys and benchmarks a distributed node cluster over SSH")]
struct Args {
    /// Testbed settings file
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::Args)]
struct BenchArgs {
    /// Number of logical nodes
    #[arg(long)]
    nodes: usize,

    /// Workers per node, in addition to the primary
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Collocate each node's primary and workers on one machine
    #[arg(long)]
    collocate: bool,

    /// Trailing nodes left unconfigured to simulate failures
    #[arg(long, default_value = "0")]
    faults: usize,

    /// Node parameters file
    #[arg(long, default_value = "parameters.json")]
    node_params: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Install the toolchain and clone the node repository on every host
    Install,
    /// Fast-forward every host to the configured branch and rebuild
    Update,
    /// Configure the testbed and launch a benchmark run
    Run(BenchArgs),
    /// Re-launch a run against already-configured hosts
    Rerun(BenchArgs),
    /// Terminate all node processes on every host
    Kill {
        /// Also delete remote log files
        #[arg(long)]
        delete_logs: bool,
    },
    /// Stop the run and download every host's logs
    Logs(BenchArgs),
}

impl BenchArgs {
    fn bench_parameters(&self) -> BenchParameters {
        BenchParameters {
            nodes: self.nodes,
            workers: self.workers,
            collocate: self.collocate,
            faults: self.faults,
        }
    }

    async fn node_parameters(&self) -> anyhow::Result<NodeParameters> {
        let raw = tokio::fs::read_to_string(&self.node_params)
            .await
            .with_context(|| format!("cannot read {}", self.node_params.display()))?;
        let parameters: NodeParameters =
            serde_json::from_str(&raw).context("malformed node parameters")?;
        Ok(parameters)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level: tracing::Level = args
        .log_level
        .parse()
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_max_level(level).init();

    let settings = Settings::load(&args.settings)
        .await
        .context("failed to load settings")?;

    let provider = FileHostProvider::new(settings.inventory_path.clone());
    let channel = SshChannel::new(settings.key_path.clone(), settings.user.clone());
    let orchestrator = Orchestrator::new(provider, channel, settings);

    match args.command {
        Command::Install => orchestrator.install().await?,
        Command::Update => orchestrator.update().await?,
        Command::Run(bench) => {
            let committee = orchestrator
                .configure_and_run(&bench.bench_parameters(), &bench.node_parameters().await?)
                .await?;
            info!("benchmark running with {} nodes", committee.size());
        }
        Command::Rerun(bench) => {
            orchestrator
                .run_only(&bench.bench_parameters(), &bench.node_parameters().await?)
                .await?;
        }
        Command::Kill { delete_logs } => orchestrator.kill(delete_logs).await?,
        Command::Logs(bench) => {
            let logs = orchestrator.collect_logs(&bench.bench_parameters()).await?;
            info!("collected {} log files", logs.len());
        }
    }
    Ok(())
}
