//! Trait definitions with mockall annotations for testing
//!
//! These are the two seams between the orchestration core and the outside
//! world: the cluster provider that knows which hosts exist, and the control
//! channel that reaches them. Both are mocked in tests via mockall.

use std::path::Path;

use crate::core::placement::{Host, Inventory};
use crate::error::TestbedResult;

/// Captured output of a completed remote command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Cluster provider abstraction.
///
/// Returns the currently reachable hosts grouped by region. The result is a
/// snapshot: no caching, and callers must not assume it stays valid.
#[mockall::automock]
#[async_trait::async_trait]
pub trait HostProvider: Send + Sync {
    async fn inventory(&self) -> TestbedResult<Inventory>;
}

/// Host control channel abstraction (SSH-equivalent).
///
/// Authenticates with the testbed key and executes shell commands or file
/// transfers against a single host. Every method may block on network I/O;
/// failures surface as `TestbedError::Transport`.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ControlChannel: Send + Sync {
    /// Run a shell command on `host` and wait for it to complete.
    async fn run(&self, host: &Host, command: &str) -> TestbedResult<CommandOutput>;

    /// Upload a local file to `remote` (path relative to the remote home).
    async fn upload(&self, host: &Host, local: &Path, remote: &str) -> TestbedResult<()>;

    /// Download a remote file (path relative to the remote home) to `local`.
    async fn download(&self, host: &Host, remote: &str, local: &Path) -> TestbedResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_traits_can_be_instantiated() {
        let _provider = MockHostProvider::new();
        let _channel = MockControlChannel::new();
    }
}
