//! Configuration fan-out
//!
//! Derives per-node addressing and committee membership from a placement,
//! serializes the configuration artifacts into the local working directory,
//! and pushes them to every assigned host. Any single host failing its upload
//! aborts the whole step: an under-configured cluster cannot run correctly.

use futures_util::future::join_all;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::config::{BenchParameters, Committee, NodeParameters};
use crate::core::placement::{Host, Placement};
use crate::core::{commands, paths};
use crate::error::{TestbedError, TestbedResult};
use crate::settings::Settings;
use crate::traits::ControlChannel;

pub struct ConfigDistributor<'a, C: ControlChannel> {
    channel: &'a C,
    settings: &'a Settings,
    working_dir: PathBuf,
}

impl<'a, C: ControlChannel> ConfigDistributor<'a, C> {
    pub fn new(channel: &'a C, settings: &'a Settings) -> Self {
        Self {
            channel,
            settings,
            working_dir: PathBuf::from("."),
        }
    }

    /// Write and read local artifacts under `working_dir` instead of the
    /// current directory.
    pub fn with_working_dir(mut self, working_dir: PathBuf) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// Build the committee, write the local artifacts, and push configuration
    /// to every node except the trailing `faults` ones.
    pub async fn configure(
        &self,
        placement: &Placement,
        node_parameters: &NodeParameters,
        bench_parameters: &BenchParameters,
    ) -> TestbedResult<Committee> {
        if placement.is_empty() || bench_parameters.faults >= placement.len() {
            return Err(TestbedError::config(
                "placement must keep at least one non-faulty node",
            ));
        }
        let committee =
            Committee::from_placement(placement, bench_parameters.workers, self.settings.base_port)?;
        let primaries = placement.primary_hosts();

        self.write_local_artifacts(&committee, node_parameters, &primaries)
            .await?;

        // Skip the trailing faulty nodes: they stay unconfigured on purpose.
        let configured = primaries.len() - bench_parameters.faults;
        info!("uploading configuration to {configured} hosts");

        let uploads = primaries[..configured]
            .iter()
            .enumerate()
            .map(|(i, host)| self.push_to_host(i, host));
        for result in join_all(uploads).await {
            result.map_err(|e| TestbedError::config_with("configuration upload failed", e))?;
        }
        Ok(committee)
    }

    /// The address table: one `host:port` line per node in index order, with
    /// one trailing line for the synchronization endpoint on host 0.
    fn address_table(&self, primaries: &[Host]) -> String {
        let mut table = String::new();
        for (i, host) in primaries.iter().enumerate() {
            table.push_str(&format!(
                "{}:{}\n",
                host,
                self.settings.base_port as usize + i
            ));
        }
        table.push_str(&format!(
            "{}:{}\n",
            primaries[0], self.settings.sync_run_port
        ));
        table
    }

    /// Per-node sync addresses, consumed by the synchronization service.
    fn sync_table(&self, primaries: &[Host]) -> String {
        primaries
            .iter()
            .enumerate()
            .map(|(i, host)| {
                format!("{}:{}\n", host, self.settings.sync_base_port as usize + i)
            })
            .collect()
    }

    async fn write_local_artifacts(
        &self,
        committee: &Committee,
        node_parameters: &NodeParameters,
        primaries: &[Host],
    ) -> TestbedResult<()> {
        let write = |name: &str, contents: String| {
            let path = self.working_dir.join(name);
            async move { fs::write(&path, contents).await.map_err(TestbedError::from) }
        };

        write(paths::address_file(), self.address_table(primaries)).await?;
        write(paths::sync_file(), self.sync_table(primaries)).await?;
        write(paths::committee_file(), serde_json::to_string_pretty(committee)?).await?;
        write(
            paths::parameters_file(),
            serde_json::to_string_pretty(node_parameters)?,
        )
        .await?;

        debug!(
            "wrote local artifacts to {}",
            self.working_dir.display()
        );
        Ok(())
    }

    /// Clear prior remnants on `host`, then upload its configuration.
    /// Cleanup must complete before the upload starts so stale and fresh
    /// files never mix.
    async fn push_to_host(&self, i: usize, host: &Host) -> TestbedResult<()> {
        self.channel
            .run(host, &format!("{} || true", commands::cleanup()))
            .await?;

        self.upload(host, &paths::key_file(i)).await?;
        self.upload(host, paths::key_bundle()).await?;
        self.upload(host, paths::address_file()).await?;
        if i == 0 {
            // The coordinator additionally receives the sync address file.
            self.upload(host, paths::sync_file()).await?;
        }
        debug!("configured {host}");
        Ok(())
    }

    async fn upload(&self, host: &Host, name: &str) -> TestbedResult<()> {
        let local = self.working_dir.join(name);
        self.channel.upload(host, &local, name).await
    }
}
