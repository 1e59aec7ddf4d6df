//! Host inventory model and placement planning
//!
//! Planning is a pure function of a placement request and an inventory
//! snapshot: the same inputs always yield the same placement, which keeps
//! benchmark runs reproducible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TestbedError, TestbedResult};

/// A machine reachable over the control channel, identified by its address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host(pub String);

impl Host {
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Host {
    fn from(address: &str) -> Self {
        Host(address.to_string())
    }
}

/// A named group of hosts (data center / availability zone).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region(pub String);

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of currently reachable hosts, grouped by region.
///
/// Region order and host order within a region are significant: the planner
/// selects deterministic prefixes of both.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub regions: Vec<(Region, Vec<Host>)>,
}

impl Inventory {
    pub fn new(regions: Vec<(Region, Vec<Host>)>) -> Self {
        Self { regions }
    }

    /// Total host count across all regions.
    pub fn host_count(&self) -> usize {
        self.regions.iter().map(|(_, hosts)| hosts.len()).sum()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Desired benchmark topology.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
    /// Number of logical nodes (authorities).
    pub nodes: usize,
    /// Workers per node, in addition to the primary.
    pub workers: usize,
    /// Whether a node's primary and workers share one machine.
    pub collocate: bool,
}

/// Concrete assignment of logical nodes to hosts.
///
/// Every logical node carries a fully populated role set by construction;
/// an under-populated placement is never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// One host per node, shared by the primary and all its workers.
    Collocated(Vec<Host>),
    /// One ordered host list per node (`workers + 1` entries, primary first),
    /// all drawn from a single region.
    Regional(Vec<Vec<Host>>),
}

impl Placement {
    /// Number of logical nodes.
    pub fn len(&self) -> usize {
        match self {
            Placement::Collocated(hosts) => hosts.len(),
            Placement::Regional(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The host running node `i`'s primary.
    pub fn primary_host(&self, i: usize) -> &Host {
        match self {
            Placement::Collocated(hosts) => &hosts[i],
            Placement::Regional(nodes) => &nodes[i][0],
        }
    }

    /// Hosts running primaries, ordered by node index.
    pub fn primary_hosts(&self) -> Vec<Host> {
        (0..self.len()).map(|i| self.primary_host(i).clone()).collect()
    }

    /// Every distinct host in the placement, ordered by first appearance.
    pub fn all_hosts(&self) -> Vec<Host> {
        let mut seen = Vec::new();
        let mut push = |host: &Host| {
            if !seen.contains(host) {
                seen.push(host.clone());
            }
        };
        match self {
            Placement::Collocated(hosts) => hosts.iter().for_each(&mut push),
            Placement::Regional(nodes) => nodes.iter().flatten().for_each(&mut push),
        }
        seen
    }

    /// Ordered role hosts for node `i` (primary first).
    pub fn role_hosts(&self, i: usize, workers: usize) -> Vec<Host> {
        match self {
            Placement::Collocated(hosts) => vec![hosts[i].clone(); workers + 1],
            Placement::Regional(nodes) => nodes[i].clone(),
        }
    }
}

/// Computes host assignments from an inventory snapshot.
pub struct PlacementPlanner;

impl PlacementPlanner {
    /// Plan a placement for `request` against `inventory`.
    ///
    /// Collocated mode interleaves hosts round-robin across regions (one from
    /// each region in turn) to spread load before exhausting any region.
    /// Non-collocated mode assigns each node its own region so role-to-role
    /// latency within a node is uniform.
    pub fn plan(request: &PlacementRequest, inventory: &Inventory) -> TestbedResult<Placement> {
        if request.collocate {
            Self::plan_collocated(request.nodes, inventory)
        } else {
            Self::plan_regional(request.nodes, request.workers, inventory)
        }
    }

    fn plan_collocated(nodes: usize, inventory: &Inventory) -> TestbedResult<Placement> {
        let available = inventory.host_count();
        if available < nodes {
            return Err(TestbedError::InsufficientHosts {
                resource: "hosts",
                needed: nodes,
                available,
            });
        }

        // Round-robin across regions; regions that run out are skipped so the
        // interleave keeps drawing from the rest.
        let longest = inventory
            .regions
            .iter()
            .map(|(_, hosts)| hosts.len())
            .max()
            .unwrap_or(0);
        let mut selected = Vec::with_capacity(nodes);
        'outer: for round in 0..longest {
            for (_, hosts) in &inventory.regions {
                if let Some(host) = hosts.get(round) {
                    selected.push(host.clone());
                    if selected.len() == nodes {
                        break 'outer;
                    }
                }
            }
        }
        Ok(Placement::Collocated(selected))
    }

    fn plan_regional(nodes: usize, workers: usize, inventory: &Inventory) -> TestbedResult<Placement> {
        if inventory.region_count() < nodes {
            return Err(TestbedError::InsufficientHosts {
                resource: "regions",
                needed: nodes,
                available: inventory.region_count(),
            });
        }

        let per_node = workers + 1;
        let mut selected = Vec::with_capacity(nodes);
        for (_, hosts) in inventory.regions.iter().take(nodes) {
            if hosts.len() < per_node {
                return Err(TestbedError::InsufficientHosts {
                    resource: "hosts in region",
                    needed: per_node,
                    available: hosts.len(),
                });
            }
            selected.push(hosts[..per_node].to_vec());
        }
        Ok(Placement::Regional(selected))
    }
}
