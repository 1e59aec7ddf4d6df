//! Remote shell command construction
//!
//! The node binary is an opaque collaborator: these functions only guarantee
//! that its command line is built deterministically from the committee and
//! node parameters. Everything here returns plain shell strings executed over
//! the control channel.

use crate::config::NodeParameters;
use crate::core::paths;
use crate::settings::Settings;

/// Remove stale configuration remnants and recreate the results directory.
pub fn cleanup() -> String {
    format!(
        "rm -r .db-* ; rm .*.json ; mkdir -p {}",
        paths::results_dir()
    )
}

/// Remove prior logs and recreate the log directory.
pub fn clean_logs() -> String {
    format!("rm -r {dir} ; mkdir -p {dir}", dir = paths::logs_dir())
}

/// Terminate every detached session on a host.
pub fn kill() -> String {
    "tmux kill-server".to_string()
}

pub fn compile() -> String {
    "cargo build --quiet --release".to_string()
}

/// Symlink the freshly built binaries into the remote home.
pub fn alias_binaries(origin: &str) -> String {
    format!("rm node ; ln -s {origin}node .")
}

/// Unpack the threshold key bundle next to the node binary.
pub fn unpack_key_bundle() -> String {
    format!(
        "tar -xzf {} && cp {}/* .",
        paths::key_bundle(),
        paths::key_bundle_dir()
    )
}

/// Launch command for node `i`'s primary.
pub fn run_primary(key_file: &str, start_time_ms: i64, params: &NodeParameters) -> String {
    run_node(key_file, start_time_ms, &params.vss_type, params)
}

/// Launch command for the synchronization service on the coordinator host.
pub fn run_syncer(key_file: &str, start_time_ms: i64, params: &NodeParameters) -> String {
    run_node(key_file, start_time_ms, "sync", params)
}

fn run_node(key_file: &str, start_time_ms: i64, vss_type: &str, params: &NodeParameters) -> String {
    format!(
        "./node --config {key} --ip {ip} --sleep {sleep} --vsstype {vss} \
         --epsilon {epsilon} --delta {delta} --val {val} --tri {tri} \
         --syncer {syncer} --batch {batch} --frequency {frequency}",
        key = key_file,
        ip = paths::address_file(),
        sleep = start_time_ms,
        vss = vss_type,
        epsilon = params.epsilon,
        delta = params.delta,
        val = params.value,
        tri = params.spread,
        syncer = paths::sync_file(),
        batch = params.batch_size,
        frequency = params.frequency,
    )
}

/// One-time host bootstrap: toolchain, build dependencies, repository clone.
/// Safe to re-run; the clone falls back to a pull when the repo exists.
pub fn install(settings: &Settings) -> String {
    [
        "sudo apt-get update".to_string(),
        "sudo apt-get -y upgrade".to_string(),
        "sudo apt-get -y autoremove".to_string(),
        "sudo apt-get -y install build-essential cmake clang libgmp-dev".to_string(),
        "curl --proto \"=https\" --tlsv1.2 -sSf https://sh.rustup.rs | sh -s -- -y".to_string(),
        "source $HOME/.cargo/env".to_string(),
        format!(
            "(git clone {url} || (cd {name} ; git pull))",
            url = settings.repo_url,
            name = settings.repo_name,
        ),
    ]
    .join(" && ")
}

/// Fast-forward the checked-out branch and rebuild the binary remotely.
pub fn update(settings: &Settings) -> String {
    let name = &settings.repo_name;
    [
        format!("(cd {name} && git fetch -f)"),
        format!("(cd {name} && git checkout -f {})", settings.branch),
        format!("(cd {name} && git pull -f)"),
        "source $HOME/.cargo/env".to_string(),
        format!("(cd {name} && {})", compile()),
        alias_binaries(&format!("./{name}/target/release/")),
    ]
    .join(" && ")
}
