//! Workflow composition
//!
//! The orchestrator owns the settings and the current placement/committee for
//! a run, composes the core components into the install / update / run /
//! kill / collect workflows, and translates component failures into
//! phase-tagged `BenchError`s. Steps within a workflow are strictly
//! sequential; commands within a step fan out across hosts concurrently.

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::config::{BenchParameters, Committee, NodeParameters};
use crate::core::placement::{Host, Placement};
use crate::core::{commands, paths, ConfigDistributor, LogCollector, PlacementPlanner, RemoteProcessSupervisor};
use crate::error::{BenchResult, InPhase, TestbedResult};
use crate::settings::Settings;
use crate::traits::{ControlChannel, HostProvider};

/// Delay between launch and the synchronized start time published by the
/// syncer, generous enough for every primary to come up.
const START_DELAY_MS: i64 = 60_000;

pub struct Orchestrator<H, C>
where
    H: HostProvider,
    C: ControlChannel,
{
    provider: H,
    channel: C,
    settings: Settings,
    /// Local directory receiving the serialized artifacts and collected logs.
    /// Concurrent workflows against one working directory are unsupported.
    working_dir: std::path::PathBuf,
}

impl<H, C> Orchestrator<H, C>
where
    H: HostProvider,
    C: ControlChannel,
{
    pub fn new(provider: H, channel: C, settings: Settings) -> Self {
        Self {
            provider,
            channel,
            settings,
            working_dir: std::path::PathBuf::from("."),
        }
    }

    pub fn with_working_dir(mut self, working_dir: std::path::PathBuf) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// Every reachable host across all regions, in inventory order.
    async fn all_hosts(&self) -> TestbedResult<Vec<Host>> {
        let inventory = self.provider.inventory().await?;
        Ok(inventory
            .regions
            .into_iter()
            .flat_map(|(_, hosts)| hosts)
            .collect())
    }

    /// Run one command on every host concurrently; the first failure aborts
    /// the whole group.
    async fn run_on_all(&self, hosts: &[Host], command: &str) -> TestbedResult<()> {
        let runs = hosts.iter().map(|host| self.channel.run(host, command));
        for result in join_all(runs).await {
            result?;
        }
        Ok(())
    }

    /// Push base toolchain setup and fetch the source onto every host.
    /// Idempotent: safe to re-run on an already-installed testbed.
    pub async fn install(&self) -> BenchResult<()> {
        let hosts = self.all_hosts().await.in_phase("inventory")?;
        info!("installing toolchain on {} hosts", hosts.len());
        self.run_on_all(&hosts, &commands::install(&self.settings))
            .await
            .in_phase("install")?;
        info!("initialized testbed of {} hosts", hosts.len());
        Ok(())
    }

    /// Fast-forward every host to the configured branch and rebuild.
    pub async fn update(&self) -> BenchResult<()> {
        let hosts = self.all_hosts().await.in_phase("inventory")?;
        info!(
            "updating {} hosts (branch '{}')",
            hosts.len(),
            self.settings.branch
        );
        self.run_on_all(&hosts, &commands::update(&self.settings))
            .await
            .in_phase("update")
    }

    /// Plan, configure and launch a benchmark run.
    pub async fn configure_and_run(
        &self,
        bench_parameters: &BenchParameters,
        node_parameters: &NodeParameters,
    ) -> BenchResult<Committee> {
        bench_parameters.validate().in_phase("parameters")?;
        node_parameters.validate().in_phase("parameters")?;

        let placement = self.plan(bench_parameters).await?;

        let distributor = ConfigDistributor::new(&self.channel, &self.settings)
            .with_working_dir(self.working_dir.clone());
        let committee = distributor
            .configure(&placement, node_parameters, bench_parameters)
            .await
            .in_phase("configure")?;

        self.launch(&placement, bench_parameters, node_parameters)
            .await?;
        Ok(committee)
    }

    /// Re-launch a benchmark against hosts configured by a prior run,
    /// skipping the configuration fan-out.
    pub async fn run_only(
        &self,
        bench_parameters: &BenchParameters,
        node_parameters: &NodeParameters,
    ) -> BenchResult<()> {
        bench_parameters.validate().in_phase("parameters")?;
        node_parameters.validate().in_phase("parameters")?;

        let placement = self.plan(bench_parameters).await?;
        self.launch(&placement, bench_parameters, node_parameters)
            .await
    }

    /// Best-effort terminate all supervised sessions on every host.
    pub async fn kill(&self, delete_logs: bool) -> BenchResult<()> {
        let hosts = self.all_hosts().await.in_phase("inventory")?;
        let supervisor = RemoteProcessSupervisor::new(&self.channel);
        let unconfirmed = supervisor.kill_all(&hosts, delete_logs).await;
        if !unconfirmed.is_empty() {
            warn!("{} hosts did not confirm cleanup", unconfirmed.len());
        }
        Ok(())
    }

    /// Stop the run (logs retained) and pull every host's log back.
    pub async fn collect_logs(
        &self,
        bench_parameters: &BenchParameters,
    ) -> BenchResult<Vec<(Host, Vec<u8>)>> {
        bench_parameters.validate().in_phase("parameters")?;
        let placement = self.plan(bench_parameters).await?;
        let hosts = placement.primary_hosts();

        let supervisor = RemoteProcessSupervisor::new(&self.channel);
        supervisor.kill_all(&hosts, false).await;

        LogCollector::new(&self.channel)
            .with_working_dir(self.working_dir.clone())
            .collect(&hosts, bench_parameters.faults)
            .await
            .in_phase("collect")
    }

    async fn plan(&self, bench_parameters: &BenchParameters) -> BenchResult<Placement> {
        let inventory = self.provider.inventory().await.in_phase("inventory")?;
        PlacementPlanner::plan(&bench_parameters.placement_request(), &inventory).in_phase("plan")
    }

    /// Kill leftovers, then launch the syncer on the coordinator host and the
    /// primaries afterwards. The syncer launch must complete before any
    /// primary starts: primaries block on the start time it publishes.
    async fn launch(
        &self,
        placement: &Placement,
        bench_parameters: &BenchParameters,
        node_parameters: &NodeParameters,
    ) -> BenchResult<()> {
        let supervisor = RemoteProcessSupervisor::new(&self.channel);
        supervisor.kill_all(&placement.all_hosts(), true).await;

        let start_time = chrono::Utc::now().timestamp_millis() + START_DELAY_MS;
        let launched = bench_parameters.nodes - bench_parameters.faults;
        info!("booting 1 syncer and {launched} primaries (start time {start_time})");

        let result = self
            .launch_sessions(&supervisor, placement, launched, start_time, node_parameters)
            .await;
        if let Err(e) = result {
            // Hosts launched before the failure keep running; clean them up
            // before surfacing the error.
            supervisor.kill_all(&placement.all_hosts(), false).await;
            return Err(e).in_phase("launch");
        }
        Ok(())
    }

    async fn launch_sessions(
        &self,
        supervisor: &RemoteProcessSupervisor<'_, C>,
        placement: &Placement,
        launched: usize,
        start_time: i64,
        node_parameters: &NodeParameters,
    ) -> TestbedResult<()> {
        let coordinator = placement.primary_host(0);
        supervisor
            .launch_detached(
                coordinator,
                &commands::run_syncer(&paths::key_file(0), start_time, node_parameters),
                &paths::syncer_log_file(),
            )
            .await?;

        for i in 0..launched {
            let host = placement.primary_host(i);
            supervisor
                .launch_detached(host, &commands::unpack_key_bundle(), &paths::unpack_log_file())
                .await?;
            supervisor
                .launch_detached(
                    host,
                    &commands::run_primary(&paths::key_file(i), start_time, node_parameters),
                    &paths::node_log_file(i),
                )
                .await?;
        }
        Ok(())
    }
}
