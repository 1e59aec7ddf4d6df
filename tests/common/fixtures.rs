//! Test fixtures shared across the workflow tests.

use std::path::PathBuf;

use benchctl::{
    BenchParameters, Host, Inventory, MockControlChannel, MockHostProvider, NodeParameters,
    Region, Settings, TestbedResult,
};
use benchctl::traits::CommandOutput;

pub struct TestFixtures;

impl TestFixtures {
    pub const BASE_PORT: u16 = 9000;
    pub const SYNC_BASE_PORT: u16 = 10000;
    pub const SYNC_RUN_PORT: u16 = 11000;

    pub fn settings() -> Settings {
        Settings {
            key_path: PathBuf::from("testbed.pem"),
            user: "ubuntu".to_string(),
            repo_url: "https://example.com/consensus.git".to_string(),
            repo_name: "consensus".to_string(),
            branch: "main".to_string(),
            base_port: Self::BASE_PORT,
            sync_base_port: Self::SYNC_BASE_PORT,
            sync_run_port: Self::SYNC_RUN_PORT,
            inventory_path: PathBuf::from("inventory.json"),
        }
    }

    pub fn bench_parameters(nodes: usize, workers: usize, collocate: bool) -> BenchParameters {
        BenchParameters {
            nodes,
            workers,
            collocate,
            faults: 0,
        }
    }

    pub fn node_parameters() -> NodeParameters {
        NodeParameters {
            vss_type: "glow".to_string(),
            epsilon: 10,
            delta: 1000,
            value: 525000,
            spread: 20000,
            batch_size: 50,
            frequency: 50,
        }
    }

    /// Inventory of `regions` regions with `hosts_per_region` hosts each,
    /// addressed `10.0.<region>.<host>`.
    pub fn inventory(regions: usize, hosts_per_region: usize) -> Inventory {
        Inventory::new(
            (1..=regions)
                .map(|r| {
                    (
                        Region(format!("region-{r}")),
                        (1..=hosts_per_region)
                            .map(|h| Host(format!("10.0.{r}.{h}")))
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    /// Provider that always returns the given inventory snapshot.
    pub fn provider(regions: usize, hosts_per_region: usize) -> MockHostProvider {
        let mut provider = MockHostProvider::new();
        provider
            .expect_inventory()
            .returning(move || Ok(Self::inventory(regions, hosts_per_region)));
        provider
    }

    /// Channel accepting every command and transfer.
    pub fn permissive_channel() -> MockControlChannel {
        let mut channel = MockControlChannel::new();
        channel
            .expect_run()
            .returning(|_, _| ok_output());
        channel.expect_upload().returning(|_, _, _| Ok(()));
        channel.expect_download().returning(|_, _, _| Ok(()));
        channel
    }
}

pub fn ok_output() -> TestbedResult<CommandOutput> {
    Ok(CommandOutput::default())
}
