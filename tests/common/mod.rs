#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use testbed_scheduler::domain::clock::clock_mock::MockClock;
use testbed_scheduler::domain::cluster::resolver::{ResolverPolicy, StaticResolver};
use testbed_scheduler::domain::cluster::topology::ClusterTopology;
use testbed_scheduler::domain::persistence::persistence_trait::{ReservationPersistence, Snapshot};
use testbed_scheduler::domain::schedule::schedule::ScheduleConfig;
use testbed_scheduler::domain::scheduler::reservation_manager::ReservationManager;
use testbed_scheduler::domain::scheduler::scheduler_config::SchedulerConfig;
use testbed_scheduler::error::{Error, Result};
use testbed_scheduler::logger::LogConfig;

/// 2023-11-14 22:13:20 UTC, 13:20 into its hourly slice.
pub const NOW: i64 = 1_700_000_000;

/// Start of the hourly slice containing `NOW`.
pub const CURRENT_SLICE_START: i64 = 1_699_999_200;

pub const HOUR: i64 = 3600;

pub fn schedule_config(node_count: usize, min_schedule_minutes: i64, max_slices: usize) -> ScheduleConfig {
    ScheduleConfig { slice_minutes: 60, min_schedule_minutes, max_slices, node_count }
}

pub fn scheduler_config(node_count: usize, vlan_range: RangeInclusive<u32>) -> SchedulerConfig {
    let topology = ClusterTopology::new("kn", 1, node_count, 0).unwrap();

    SchedulerConfig {
        schedule: schedule_config(topology.node_count(), 24 * 60, 24 * 14),
        topology,
        vlan_range,
        resolver: ResolverPolicy { timeout: Duration::from_millis(200), retries: 0 },
        speculative_iterations: 10,
        speculative_step_minutes: 10,
        data_dir: PathBuf::from("unused"),
        log: LogConfig::default(),
    }
}

pub fn resolver_for(config: &SchedulerConfig) -> StaticResolver {
    StaticResolver::for_topology(&config.topology, Ipv4Addr::new(10, 0, 0, 1))
}

/// In-memory persistence that can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub saved: Mutex<Option<Snapshot>>,
    pub fail_saves: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_saves.lock().unwrap() = failing;
    }

    pub fn preload(&self, snapshot: Snapshot) {
        *self.saved.lock().unwrap() = Some(snapshot);
    }

    pub fn saved(&self) -> Option<Snapshot> {
        self.saved.lock().unwrap().clone()
    }
}

impl ReservationPersistence for MemoryStore {
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if *self.fail_saves.lock().unwrap() {
            return Err(Error::PersistenceError("disk full".to_string()));
        }

        *self.saved.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.saved())
    }
}

pub struct Harness {
    pub manager: ReservationManager,
    pub clock: MockClock,
    pub store: Arc<MemoryStore>,
}

pub fn harness(node_count: usize, vlan_range: RangeInclusive<u32>) -> Harness {
    let config = scheduler_config(node_count, vlan_range);
    let resolver = resolver_for(&config);
    harness_with_resolver(config, resolver)
}

pub fn harness_with_resolver(config: SchedulerConfig, resolver: StaticResolver) -> Harness {
    let clock = MockClock::new(NOW);
    let store = Arc::new(MemoryStore::new());

    let manager = ReservationManager::new(config, Arc::new(clock.clone()), Arc::new(resolver), store.clone()).unwrap();

    Harness { manager, clock, store }
}

/// Asserts the contiguity and width invariants of a list of slices.
pub fn assert_contiguous(slices: &[testbed_scheduler::domain::schedule::time_slice::TimeSlice], node_count: usize) {
    for slice in slices {
        assert_eq!(slice.nodes.len(), node_count);
        assert_eq!(slice.end - slice.start, HOUR - 1);
    }

    for pair in slices.windows(2) {
        assert_eq!(pair[0].end + 1, pair[1].start, "slices are not contiguous");
    }
}
