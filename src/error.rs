//! Testbed error types
//!
//! Component-level failures are `TestbedError`; the orchestrator wraps them
//! into `BenchError` together with the name of the workflow phase that failed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestbedError {
    #[error("host provider error: {message}")]
    Inventory { message: String },

    #[error("insufficient {resource}: needed {needed}, available {available}")]
    InsufficientHosts {
        resource: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<TestbedError>>,
    },

    #[error("remote command failed on {host}: {stderr}")]
    Execution { host: String, stderr: String },

    #[error("control channel failure on {host}: {message}")]
    Transport { host: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestbedError {
    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Configuration error caused by another testbed failure; the cause stays
    /// reachable through the error chain.
    pub fn config_with(message: impl Into<String>, source: TestbedError) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn transport(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            host: host.into(),
            message: message.into(),
        }
    }
}

pub type TestbedResult<T> = Result<T, TestbedError>;

/// Top-level workflow error: which phase failed, and why.
#[derive(Error, Debug)]
#[error("phase '{phase}' failed: {source}")]
pub struct BenchError {
    pub phase: &'static str,
    #[source]
    pub source: TestbedError,
}

pub type BenchResult<T> = Result<T, BenchError>;

/// Attach a phase name to a component-level result.
pub trait InPhase<T> {
    fn in_phase(self, phase: &'static str) -> BenchResult<T>;
}

impl<T> InPhase<T> for TestbedResult<T> {
    fn in_phase(self, phase: &'static str) -> BenchResult<T> {
        self.map_err(|source| BenchError { phase, source })
    }
}
