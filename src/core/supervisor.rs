//! Remote process lifecycle management
//!
//! Processes run inside uniquely named detached tmux sessions so they survive
//! the loss of the control connection. Launch failures split into two
//! channels: stderr written before the session detaches raises an execution
//! error synchronously; anything later is only visible through the log file,
//! retrieved with `inspect_log`.

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::placement::Host;
use crate::core::{commands, paths};
use crate::error::{TestbedError, TestbedResult};
use crate::traits::ControlChannel;

/// Identifies a detached remote process. Session names derive from the log
/// file name, which is unique per run, so handles are never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub host: Host,
    pub session: String,
    pub log_file: String,
}

pub struct RemoteProcessSupervisor<'a, C: ControlChannel> {
    channel: &'a C,
    /// Handles created by this supervisor; it is the only component allowed
    /// to kill them.
    handles: Mutex<Vec<RunHandle>>,
}

impl<'a, C: ControlChannel> RemoteProcessSupervisor<'a, C> {
    pub fn new(channel: &'a C) -> Self {
        Self {
            channel,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Best-effort terminate all supervised sessions on every host, and
    /// optionally remove prior log files.
    ///
    /// The two remote commands are independent: a failed log deletion does
    /// not block termination and vice versa. A missing session is not an
    /// error. Returns the hosts whose cleanup did not confirm; the call
    /// itself never fails.
    pub async fn kill_all(&self, hosts: &[Host], delete_logs: bool) -> Vec<Host> {
        let cleanups = hosts.iter().map(|host| async move {
            let mut confirmed = true;

            if delete_logs {
                if let Err(e) = self.channel.run(host, &commands::clean_logs()).await {
                    warn!("log deletion on {host} did not confirm: {e}");
                    confirmed = false;
                }
            }

            // The kill itself tolerates "no server running".
            let kill = format!("({} || true)", commands::kill());
            if let Err(e) = self.channel.run(host, &kill).await {
                warn!("kill on {host} did not confirm: {e}");
                confirmed = false;
            }

            (!confirmed).then(|| host.clone())
        });

        let unconfirmed: Vec<Host> = join_all(cleanups).await.into_iter().flatten().collect();
        self.handles.lock().await.clear();
        unconfirmed
    }

    /// Start `command` on `host` inside a detached session teeing output to
    /// `log_file`, returning as soon as the session is confirmed started.
    ///
    /// The session outlives the control connection. If the remote command
    /// writes to stderr before detaching, the launch fails with an execution
    /// error; failures after detachment only show up in the log file.
    pub async fn launch_detached(
        &self,
        host: &Host,
        command: &str,
        log_file: &str,
    ) -> TestbedResult<RunHandle> {
        let session = paths::session_name(log_file);
        let wrapped = format!("tmux new -d -s \"{session}\" \"{command} |& tee {log_file}\"");

        let output = self.channel.run(host, &wrapped).await?;
        if !output.stderr.trim().is_empty() {
            return Err(TestbedError::Execution {
                host: host.to_string(),
                stderr: output.stderr,
            });
        }

        let handle = RunHandle {
            host: host.clone(),
            session: session.clone(),
            log_file: log_file.to_string(),
        };
        self.handles.lock().await.push(handle.clone());
        debug!("launched session '{session}' on {host}");
        Ok(handle)
    }

    /// Download a run's log file for post-hoc failure analysis.
    pub async fn inspect_log(&self, handle: &RunHandle) -> TestbedResult<Vec<u8>> {
        let local = std::env::temp_dir().join(format!("{}.log", handle.session));
        self.channel
            .download(&handle.host, &handle.log_file, &local)
            .await?;
        Ok(tokio::fs::read(&local).await?)
    }

    /// Handles created since the last `kill_all`.
    pub async fn active_handles(&self) -> Vec<RunHandle> {
        self.handles.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{CommandOutput, MockControlChannel};

    #[tokio::test]
    async fn launch_returns_a_handle_named_after_the_log() {
        let mut channel = MockControlChannel::new();
        channel
            .expect_run()
            .withf(|_, cmd| cmd.contains("tmux new -d -s \"node-0\"") && cmd.contains("tee logs/node-0.log"))
            .returning(|_, _| Ok(CommandOutput::default()));

        let supervisor = RemoteProcessSupervisor::new(&channel);
        let handle = supervisor
            .launch_detached(&Host::from("10.0.0.1"), "./node --config x", "logs/node-0.log")
            .await
            .unwrap();

        assert_eq!(handle.session, "node-0");
        assert_eq!(supervisor.active_handles().await, vec![handle]);
    }

    #[tokio::test]
    async fn immediate_stderr_raises_an_execution_error() {
        let mut channel = MockControlChannel::new();
        channel.expect_run().returning(|_, _| {
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: "duplicate session: node-0".to_string(),
            })
        });

        let supervisor = RemoteProcessSupervisor::new(&channel);
        let err = supervisor
            .launch_detached(&Host::from("10.0.0.1"), "./node", "logs/node-0.log")
            .await
            .unwrap_err();

        assert!(matches!(err, TestbedError::Execution { .. }));
        assert!(supervisor.active_handles().await.is_empty());
    }

    #[tokio::test]
    async fn kill_all_is_best_effort_per_host() {
        let mut channel = MockControlChannel::new();
        channel.expect_run().returning(|host, _| {
            if host.address() == "unreachable" {
                Err(TestbedError::transport(host.address(), "timed out"))
            } else {
                Ok(CommandOutput::default())
            }
        });

        let supervisor = RemoteProcessSupervisor::new(&channel);
        let hosts = vec![Host::from("10.0.0.1"), Host::from("unreachable")];
        let unconfirmed = supervisor.kill_all(&hosts, true).await;

        // Host A cleaned, host B recorded as unconfirmed, no error raised.
        assert_eq!(unconfirmed, vec![Host::from("unreachable")]);
    }

    #[tokio::test]
    async fn kill_then_launch_reuses_the_session_name() {
        // After a kill, relaunching under the same session name must not
        // report "session already exists": the cleanup is awaited before the
        // next launch is issued.
        let mut channel = MockControlChannel::new();
        let mut order = mockall::Sequence::new();
        channel
            .expect_run()
            .withf(|_, cmd| cmd.contains("tmux kill-server"))
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok(CommandOutput::default()));
        channel
            .expect_run()
            .withf(|_, cmd| cmd.contains("tmux new -d -s \"node-0\""))
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok(CommandOutput::default()));

        let supervisor = RemoteProcessSupervisor::new(&channel);
        let host = Host::from("10.0.0.1");
        let unconfirmed = supervisor.kill_all(std::slice::from_ref(&host), false).await;
        assert!(unconfirmed.is_empty());

        let handle = supervisor
            .launch_detached(&host, "./node", "logs/node-0.log")
            .await
            .unwrap();
        assert_eq!(handle.session, "node-0");
    }

    #[tokio::test]
    async fn inspect_log_returns_the_remote_bytes() {
        let mut channel = MockControlChannel::new();
        channel
            .expect_run()
            .returning(|_, _| Ok(CommandOutput::default()));
        channel
            .expect_download()
            .withf(|_, remote, _| remote == "logs/node-0.log")
            .returning(|_, _, local| {
                std::fs::write(local, "panicked after detach\n").unwrap();
                Ok(())
            });

        let supervisor = RemoteProcessSupervisor::new(&channel);
        let handle = supervisor
            .launch_detached(&Host::from("10.0.0.1"), "./node", "logs/node-0.log")
            .await
            .unwrap();

        let log = supervisor.inspect_log(&handle).await.unwrap();
        assert_eq!(log, b"panicked after detach\n");
    }

    #[tokio::test]
    async fn kill_runs_even_when_log_deletion_fails() {
        let mut channel = MockControlChannel::new();
        channel
            .expect_run()
            .withf(|_, cmd| cmd.contains("rm -r logs"))
            .times(1)
            .returning(|host, _| Err(TestbedError::transport(host.address(), "denied")));
        channel
            .expect_run()
            .withf(|_, cmd| cmd.contains("tmux kill-server"))
            .times(1)
            .returning(|_, _| Ok(CommandOutput::default()));

        let supervisor = RemoteProcessSupervisor::new(&channel);
        let hosts = vec![Host::from("10.0.0.1")];
        let unconfirmed = supervisor.kill_all(&hosts, true).await;
        assert_eq!(unconfirmed, hosts);
    }
}
