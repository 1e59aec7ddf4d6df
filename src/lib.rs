//! benchctl: deployment-and-benchmark orchestrator for a distributed node
//! cluster
//!
//! Given a pool of remote machines grouped by region, benchctl selects a
//! placement of logical roles onto machines, pushes per-node configuration,
//! launches the node processes in detached remote sessions, and retrieves
//! their logs after a run. The node binary itself is an opaque collaborator.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod settings;
pub mod traits;

// Re-export commonly used types
pub use config::{BenchParameters, Committee, NodeParameters};
pub use core::{Host, Inventory, Placement, PlacementPlanner, PlacementRequest, Region};
pub use error::{BenchError, BenchResult, TestbedError, TestbedResult};
pub use orchestrator::Orchestrator;
pub use settings::Settings;
pub use traits::{ControlChannel, HostProvider, MockControlChannel, MockHostProvider};
