//! Testbed-wide settings
//!
//! Loaded once from a JSON file and consumed read-only everywhere else.
//! Covers the control-channel identity, the remote repository to deploy,
//! and the port scheme shared by every generated address table.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TestbedError, TestbedResult};

fn default_user() -> String {
    "ubuntu".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Private key used to authenticate the control channel.
    pub key_path: PathBuf,

    /// Remote user the control channel logs in as.
    #[serde(default = "default_user")]
    pub user: String,

    /// Git URL of the node repository to install on every host.
    pub repo_url: String,

    /// Directory name the repository clones into on the remote hosts.
    pub repo_name: String,

    /// Branch checked out and built by the update workflow.
    pub branch: String,

    /// First port of the node address range; node `i` listens on `base_port + i`.
    pub base_port: u16,

    /// First port of the per-node sync address range.
    pub sync_base_port: u16,

    /// Port the synchronization service listens on (bound to host 0).
    pub sync_run_port: u16,

    /// Inventory file listing reachable hosts per region.
    pub inventory_path: PathBuf,
}

impl Settings {
    pub async fn load(path: &Path) -> TestbedResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            TestbedError::config(format!("cannot read settings file {}: {e}", path.display()))
        })?;
        let settings: Settings = serde_json::from_str(&raw)
            .map_err(|e| TestbedError::config(format!("malformed settings file: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> TestbedResult<()> {
        if self.repo_url.is_empty() || self.repo_name.is_empty() || self.branch.is_empty() {
            return Err(TestbedError::config(
                "repo_url, repo_name and branch must be set",
            ));
        }
        if self.base_port == self.sync_base_port || self.base_port == self.sync_run_port {
            return Err(TestbedError::config(
                "base_port must not overlap the sync port ranges",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings {
            key_path: PathBuf::from("/home/user/.ssh/testbed.pem"),
            user: default_user(),
            repo_url: "https://example.com/consensus.git".to_string(),
            repo_name: "consensus".to_string(),
            branch: "main".to_string(),
            base_port: 9000,
            sync_base_port: 10000,
            sync_run_port: 11000,
            inventory_path: PathBuf::from("inventory.json"),
        }
    }

    #[test]
    fn valid_settings_pass_validation() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn overlapping_port_ranges_are_rejected() {
        let mut settings = sample();
        settings.sync_run_port = settings.base_port;
        assert!(settings.validate().is_err());
    }

    #[tokio::test]
    async fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let err = Settings::load(&path).await.unwrap_err();
        assert!(matches!(err, TestbedError::Config { .. }));
    }
}
