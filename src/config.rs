//! Benchmark and node configuration
//!
//! `BenchParameters` and `NodeParameters` are validated once at load time and
//! consumed read-only afterwards. `Committee` is derived from a placement and
//! is the agreed mapping of logical node identities to role addresses.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::placement::{Placement, PlacementRequest};
use crate::error::{TestbedError, TestbedResult};

/// Benchmark topology parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BenchParameters {
    /// Number of logical nodes in the committee.
    pub nodes: usize,
    /// Workers per node, in addition to the primary.
    #[serde(default)]
    pub workers: usize,
    /// Whether a node's primary and workers share one machine.
    #[serde(default)]
    pub collocate: bool,
    /// Trailing nodes deliberately left unconfigured to simulate failures.
    #[serde(default)]
    pub faults: usize,
}

impl BenchParameters {
    pub fn validate(&self) -> TestbedResult<()> {
        if self.nodes == 0 {
            return Err(TestbedError::config("node count must be positive"));
        }
        if self.faults >= self.nodes {
            return Err(TestbedError::config(format!(
                "faults ({}) must be smaller than the node count ({})",
                self.faults, self.nodes
            )));
        }
        Ok(())
    }

    pub fn placement_request(&self) -> PlacementRequest {
        PlacementRequest {
            nodes: self.nodes,
            workers: self.workers,
            collocate: self.collocate,
        }
    }
}

fn default_vss_type() -> String {
    "glow".to_string()
}

/// Parameters passed through to the node binary.
///
/// The launch command line is a deterministic function of these fields and
/// the committee; nothing is sampled at launch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeParameters {
    /// VSS scheme the primaries run with (the syncer always runs `sync`).
    #[serde(default = "default_vss_type")]
    pub vss_type: String,
    pub epsilon: u64,
    pub delta: u64,
    /// Secret value each node shares.
    pub value: u64,
    /// Spread of the shared values across nodes.
    pub spread: u64,
    pub batch_size: u64,
    pub frequency: u64,
}

impl NodeParameters {
    pub fn validate(&self) -> TestbedResult<()> {
        if self.vss_type.is_empty() {
            return Err(TestbedError::config("vss_type must be set"));
        }
        if self.delta == 0 || self.batch_size == 0 || self.frequency == 0 {
            return Err(TestbedError::config(
                "delta, batch_size and frequency must be positive",
            ));
        }
        Ok(())
    }
}

/// One logical node and the addresses of its role slots (primary first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub name: String,
    pub addresses: Vec<String>,
}

/// The agreed mapping of logical node identities to network addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    pub authorities: Vec<Authority>,
    pub base_port: u16,
}

impl Committee {
    /// Build a committee from a placement.
    ///
    /// Role `k` of node `i` is addressed at `host(i, k):base_port + i + k`.
    /// Collocated nodes repeat their single host in every role slot. The
    /// resulting address set is checked for injectivity.
    pub fn from_placement(
        placement: &Placement,
        workers: usize,
        base_port: u16,
    ) -> TestbedResult<Self> {
        let mut authorities = Vec::with_capacity(placement.len());
        for i in 0..placement.len() {
            let hosts = placement.role_hosts(i, workers);
            let addresses = hosts
                .iter()
                .enumerate()
                .map(|(k, host)| format!("{}:{}", host, base_port as usize + i + k))
                .collect();
            authorities.push(Authority {
                name: i.to_string(),
                addresses,
            });
        }

        let committee = Self {
            authorities,
            base_port,
        };
        committee.check_injective()?;
        Ok(committee)
    }

    fn check_injective(&self) -> TestbedResult<()> {
        let mut seen = HashSet::new();
        for authority in &self.authorities {
            for address in &authority.addresses {
                if !seen.insert(address) {
                    return Err(TestbedError::config(format!(
                        "duplicate address in committee: {address}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.authorities.len()
    }

    /// Primary address of node `i`.
    pub fn primary_address(&self, i: usize) -> &str {
        &self.authorities[i].addresses[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::placement::Host;

    #[test]
    fn bench_parameters_reject_zero_nodes() {
        let params = BenchParameters {
            nodes: 0,
            workers: 0,
            collocate: true,
            faults: 0,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn bench_parameters_reject_faults_at_or_above_node_count() {
        let params = BenchParameters {
            nodes: 4,
            workers: 1,
            collocate: true,
            faults: 4,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn collocated_committee_repeats_host_with_distinct_ports() {
        let placement = Placement::Collocated(vec![Host::from("10.0.0.1"), Host::from("10.0.0.2")]);
        let committee = Committee::from_placement(&placement, 1, 9000).unwrap();

        assert_eq!(committee.size(), 2);
        assert_eq!(
            committee.authorities[0].addresses,
            vec!["10.0.0.1:9000", "10.0.0.1:9001"]
        );
        assert_eq!(
            committee.authorities[1].addresses,
            vec!["10.0.0.2:9001", "10.0.0.2:9002"]
        );
    }

    #[test]
    fn committee_addresses_are_injective() {
        let placement = Placement::Regional(vec![
            vec![Host::from("a1"), Host::from("a2")],
            vec![Host::from("b1"), Host::from("b2")],
        ]);
        let committee = Committee::from_placement(&placement, 1, 9000).unwrap();

        let mut addresses: Vec<_> = committee
            .authorities
            .iter()
            .flat_map(|a| a.addresses.iter())
            .collect();
        let total = addresses.len();
        addresses.sort();
        addresses.dedup();
        assert_eq!(addresses.len(), total);
    }

    #[test]
    fn primary_ports_follow_node_index() {
        let placement = Placement::Regional(vec![
            vec![Host::from("a1"), Host::from("a2")],
            vec![Host::from("b1"), Host::from("b2")],
        ]);
        let committee = Committee::from_placement(&placement, 1, 9000).unwrap();

        assert_eq!(committee.primary_address(0), "a1:9000");
        assert_eq!(committee.primary_address(1), "b1:9001");
    }

    #[test]
    fn duplicate_hosts_across_nodes_are_rejected() {
        // A placement that reuses one host for two collocated nodes would
        // collide on ports only if indices overlap; reusing the same host for
        // the same role offset must be caught.
        let placement = Placement::Regional(vec![
            vec![Host::from("a1"), Host::from("a1")],
            vec![Host::from("a1"), Host::from("a2")],
        ]);
        // node 0 role 1 -> a1:9001, node 1 role 0 -> a1:9001
        assert!(Committee::from_placement(&placement, 1, 9000).is_err());
    }
}
