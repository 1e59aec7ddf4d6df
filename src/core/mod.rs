//! Orchestration core: placement, configuration fan-out, remote process
//! supervision and log retrieval.

pub mod collector;
pub mod commands;
pub mod distributor;
pub mod paths;
pub mod placement;
pub mod supervisor;

pub use collector::LogCollector;
pub use distributor::ConfigDistributor;
pub use placement::{Host, Inventory, Placement, PlacementPlanner, PlacementRequest, Region};
pub use supervisor::{RemoteProcessSupervisor, RunHandle};
