//! Control channel over the system ssh/scp binaries
//!
//! Authenticates with the testbed private key and executes remote shell
//! commands or file transfers against a single host. Every failure is mapped
//! to a transport error carrying the host and the tool's stderr.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::core::placement::Host;
use crate::error::{TestbedError, TestbedResult};
use crate::traits::{CommandOutput, ControlChannel};

// LogLevel=ERROR keeps client diagnostics (e.g. the "Permanently added"
// warning on first contact) out of the captured stderr, which must carry
// only the remote command's error stream.
const SSH_OPTIONS: [&str; 3] = [
    "-oStrictHostKeyChecking=no",
    "-oConnectTimeout=10",
    "-oLogLevel=ERROR",
];

pub struct SshChannel {
    key_path: PathBuf,
    user: String,
}

impl SshChannel {
    pub fn new(key_path: PathBuf, user: String) -> Self {
        Self { key_path, user }
    }

    fn destination(&self, host: &Host) -> String {
        format!("{}@{}", self.user, host.address())
    }

    async fn invoke(&self, host: &Host, program: &str, args: &[String]) -> TestbedResult<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.arg("-i")
            .arg(&self.key_path)
            .args(SSH_OPTIONS)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("{program} {args:?}");
        let output = cmd
            .output()
            .await
            .map_err(|e| TestbedError::transport(host.address(), format!("cannot spawn {program}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(TestbedError::transport(
                host.address(),
                format!("{program} exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(CommandOutput { stdout, stderr })
    }
}

#[async_trait]
impl ControlChannel for SshChannel {
    async fn run(&self, host: &Host, command: &str) -> TestbedResult<CommandOutput> {
        self.invoke(
            host,
            "ssh",
            &[self.destination(host), command.to_string()],
        )
        .await
    }

    async fn upload(&self, host: &Host, local: &Path, remote: &str) -> TestbedResult<()> {
        self.invoke(
            host,
            "scp",
            &[
                local.display().to_string(),
                format!("{}:{}", self.destination(host), remote),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn download(&self, host: &Host, remote: &str, local: &Path) -> TestbedResult<()> {
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.invoke(
            host,
            "scp",
            &[
                format!("{}:{}", self.destination(host), remote),
                local.display().to_string(),
            ],
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_diagnostics_are_silenced() {
        // Without this option, the first contact with a new host writes a
        // known-hosts warning to stderr even when the remote command
        // succeeds, and downstream consumers treat non-empty stderr on a
        // launch as a failure.
        assert!(SSH_OPTIONS.contains(&"-oLogLevel=ERROR"));
    }

    #[test]
    fn destination_includes_the_configured_user() {
        let channel = SshChannel::new(PathBuf::from("key.pem"), "ubuntu".to_string());
        assert_eq!(channel.destination(&Host::from("10.0.0.1")), "ubuntu@10.0.0.1");
    }

    #[tokio::test]
    async fn run_against_an_invalid_host_is_a_transport_error() {
        // ssh exits non-zero immediately for an unresolvable destination.
        let channel = SshChannel::new(PathBuf::from("/nonexistent.pem"), "ubuntu".to_string());
        let err = channel
            .run(&Host::from("invalid.host.local."), "true")
            .await
            .unwrap_err();
        assert!(matches!(err, TestbedError::Transport { .. }));
    }
}
