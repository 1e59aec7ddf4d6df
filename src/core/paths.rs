//! Deterministic file naming
//!
//! Every artifact the testbed writes or fetches has a fixed name derived from
//! the node index and role, so repeated runs never silently merge with stale
//! files. Remote paths are relative to the remote user's home; local paths
//! are relative to the working directory.

use std::path::PathBuf;

/// Per-node key file uploaded to host `i`.
pub fn key_file(i: usize) -> String {
    format!(".node-{i}.json")
}

/// Serialized committee, written locally.
pub fn committee_file() -> &'static str {
    ".committee.json"
}

/// Serialized node parameters, written locally.
pub fn parameters_file() -> &'static str {
    ".parameters.json"
}

/// Address table: one `host:port` line per node plus the sync endpoint.
pub fn address_file() -> &'static str {
    "ip_file"
}

/// Per-node sync addresses, uploaded to the coordinator host only.
pub fn sync_file() -> &'static str {
    "syncer"
}

/// Threshold key bundle shipped to every configured host.
pub fn key_bundle() -> &'static str {
    "tkeys.tar.gz"
}

/// Directory the bundle unpacks into on the remote host.
pub fn key_bundle_dir() -> &'static str {
    "thresh_keys"
}

pub fn logs_dir() -> &'static str {
    "logs"
}

pub fn results_dir() -> &'static str {
    "results"
}

/// Log file of node `i`'s primary (same name remotely and locally).
pub fn node_log_file(i: usize) -> String {
    format!("{}/node-{i}.log", logs_dir())
}

/// Log file of the synchronization service on the coordinator host.
pub fn syncer_log_file() -> String {
    format!("{}/syncer.log", logs_dir())
}

/// Log file of the key-bundle unpack step.
pub fn unpack_log_file() -> String {
    format!("{}/unpack.log", logs_dir())
}

/// Detached session name for a log file: its stem, unique per run.
pub fn session_name(log_file: &str) -> String {
    PathBuf::from(log_file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| log_file.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_names_are_unique_per_node() {
        assert_ne!(node_log_file(0), node_log_file(1));
        assert_ne!(node_log_file(0), syncer_log_file());
    }

    #[test]
    fn session_name_is_the_log_stem() {
        assert_eq!(session_name("logs/node-3.log"), "node-3");
        assert_eq!(session_name("logs/syncer.log"), "syncer");
    }
}
