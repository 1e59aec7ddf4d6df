//! Log retrieval
//!
//! Pulls each host's log file back to the local machine under deterministic
//! names. Local log storage is cleared before each collection so repeated
//! runs never silently merge with stale files. The collected bytes are handed
//! to an external parser; this component only guarantees faithful transfer.

use futures_util::future::join_all;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

use crate::core::placement::Host;
use crate::core::paths;
use crate::error::TestbedResult;
use crate::traits::ControlChannel;

pub struct LogCollector<'a, C: ControlChannel> {
    channel: &'a C,
    working_dir: PathBuf,
}

impl<'a, C: ControlChannel> LogCollector<'a, C> {
    pub fn new(channel: &'a C) -> Self {
        Self {
            channel,
            working_dir: PathBuf::from("."),
        }
    }

    pub fn with_working_dir(mut self, working_dir: PathBuf) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// Download the syncer log from host 0 and each non-faulty host's node
    /// log, in node-index order.
    ///
    /// The trailing `faults` hosts were never launched and are skipped. A
    /// host that cannot be reached is tolerated: its log is omitted with a
    /// warning rather than failing the collection.
    pub async fn collect(
        &self,
        hosts: &[Host],
        faults: usize,
    ) -> TestbedResult<Vec<(Host, Vec<u8>)>> {
        // Clear local log storage first.
        let local_logs = self.working_dir.join(paths::logs_dir());
        let _ = fs::remove_dir_all(&local_logs).await;
        fs::create_dir_all(&local_logs).await?;

        let targets = &hosts[..hosts.len().saturating_sub(faults)];
        info!("downloading logs from {} hosts", targets.len());

        let mut downloads = Vec::new();
        if let Some(coordinator) = targets.first() {
            downloads.push(self.fetch(coordinator.clone(), paths::syncer_log_file()));
        }
        for (i, host) in targets.iter().enumerate() {
            downloads.push(self.fetch(host.clone(), paths::node_log_file(i)));
        }

        let collected = join_all(downloads).await.into_iter().flatten().collect();
        Ok(collected)
    }

    async fn fetch(&self, host: Host, remote: String) -> Option<(Host, Vec<u8>)> {
        let local = self.working_dir.join(&remote);
        if let Err(e) = self.channel.download(&host, &remote, &local).await {
            warn!("skipping {remote} from {host}: {e}");
            return None;
        }
        match fs::read(&local).await {
            Ok(bytes) => Some((host, bytes)),
            Err(e) => {
                warn!("downloaded {remote} from {host} but cannot read it: {e}");
                None
            }
        }
    }
}
