//! File-backed host provider
//!
//! The provisioning of compute instances is out of scope: the testbed is
//! handed an inventory file listing the reachable hosts per region, in the
//! order placement should consider them. Each call re-reads the file and
//! returns a fresh snapshot.
//!
//! Format: a JSON array so region order is preserved:
//! `[{"region": "us-east-1", "hosts": ["1.2.3.4", "5.6.7.8"]}, ...]`

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs;

use crate::core::placement::{Host, Inventory, Region};
use crate::error::{TestbedError, TestbedResult};
use crate::traits::HostProvider;

#[derive(Debug, Deserialize)]
struct RegionEntry {
    region: String,
    hosts: Vec<String>,
}

pub struct FileHostProvider {
    path: PathBuf,
}

impl FileHostProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl HostProvider for FileHostProvider {
    async fn inventory(&self) -> TestbedResult<Inventory> {
        let raw = fs::read_to_string(&self.path).await.map_err(|e| {
            TestbedError::inventory(format!(
                "cannot read inventory file {}: {e}",
                self.path.display()
            ))
        })?;
        let entries: Vec<RegionEntry> = serde_json::from_str(&raw)
            .map_err(|e| TestbedError::inventory(format!("malformed inventory: {e}")))?;

        if entries.iter().any(|entry| entry.hosts.is_empty()) {
            return Err(TestbedError::inventory("inventory lists an empty region"));
        }

        Ok(Inventory::new(
            entries
                .into_iter()
                .map(|entry| {
                    (
                        Region(entry.region),
                        entry.hosts.into_iter().map(Host).collect(),
                    )
                })
                .collect(),
        ))
    }
}
