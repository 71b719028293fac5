use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::clock::clock::SystemClock;
use crate::domain::cluster::topology::ClusterTopology;
use crate::domain::reservation::reservation::{Reservation, ReservationId};
use crate::domain::schedule::block_finder::find_contiguous_blocks;
use crate::domain::schedule::schedule::Schedule;
use crate::domain::scheduler::request::RequestShape;
use crate::error::{Error, Result};

/// A block of nodes stamped into the schedule for one reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: ReservationId,

    /// Occupied node indices, ascending.
    pub node_indices: Vec<usize>,

    pub start_time: i64,
    pub end_time: i64,
}

/// Finds the earliest feasible node/time block for a request and stamps it into a schedule.
///
/// The search walks the schedule from its second slice (the first one is partially elapsed),
/// growing the schedule on demand, but never beyond `ScheduleConfig::max_slices` slices.
#[derive(Debug, Clone)]
pub struct Allocator {
    topology: ClusterTopology,
    clock: Arc<dyn SystemClock>,
}

impl Allocator {
    pub fn new(topology: ClusterTopology, clock: Arc<dyn SystemClock>) -> Self {
        Allocator { topology, clock }
    }

    /// Finds `node_count` adjacent nodes for `minutes`, starting as soon as possible.
    ///
    /// # Returns
    /// The reservation (without owner, name, VLAN and PXE names) and the schedule with the
    /// reservation stamped in. `schedule` itself is left untouched.
    pub fn find_reservation(&self, schedule: &Schedule, minutes: i64, node_count: usize) -> Result<(Reservation, Schedule)> {
        self.find_reservation_after(schedule, minutes, node_count, self.clock.get_current_time_in_s())
    }

    /// Like [`Allocator::find_reservation`], but the reservation starts no earlier than `not_before`.
    pub fn find_reservation_after(&self, schedule: &Schedule, minutes: i64, node_count: usize, not_before: i64) -> Result<(Reservation, Schedule)> {
        self.find_reservation_generic(schedule, minutes, &RequestShape::Count(node_count), not_before, &HashSet::new())
    }

    /// Reserves exactly the named hosts, starting no earlier than `not_before`.
    pub fn find_reservation_by_hosts(&self, schedule: &Schedule, minutes: i64, hosts: &[String], not_before: i64) -> Result<(Reservation, Schedule)> {
        self.find_reservation_generic(schedule, minutes, &RequestShape::Hosts(hosts.to_vec()), not_before, &HashSet::new())
    }

    /// Searches a copy of `schedule`; ids in `taken` are never handed out.
    pub fn find_reservation_generic(
        &self,
        schedule: &Schedule,
        minutes: i64,
        shape: &RequestShape,
        not_before: i64,
        taken: &HashSet<ReservationId>,
    ) -> Result<(Reservation, Schedule)> {
        let mut new_schedule = schedule.clone();
        let allocation = self.allocate(&mut new_schedule, minutes, shape, not_before, taken)?;

        let hosts = self.topology.node_names(&allocation.node_indices);
        let reservation = Reservation::new(allocation.id, hosts, allocation.start_time, allocation.end_time);

        Ok((reservation, new_schedule))
    }

    /// Searches `schedule` and stamps the accepted block into it.
    ///
    /// On error the schedule holds no stamp of the request, though it may have been extended.
    pub fn allocate(
        &self,
        schedule: &mut Schedule,
        minutes: i64,
        shape: &RequestShape,
        not_before: i64,
        taken: &HashSet<ReservationId>,
    ) -> Result<Allocation> {
        if minutes <= 0 {
            return Err(Error::InvalidRequest(format!("duration must be positive, got {} minutes", minutes)));
        }
        shape.validate()?;

        let config = *schedule.config();
        let needed_slices = config.slices_for_minutes(minutes);
        let no_capacity = || Error::NoCapacity { node_count: shape.node_count(), minutes, max_slices: config.max_slices };

        // convert hostnames to indexes
        let requested_indices: Option<Vec<usize>> = match shape {
            RequestShape::Count(count) if *count > config.node_count => return Err(no_capacity()),
            RequestShape::Count(_) => None,
            RequestShape::Hosts(hosts) => {
                let mut indices = self.topology.node_indices(hosts)?;
                indices.sort_unstable();

                if let Some(pair) = indices.windows(2).find(|pair| pair[0] == pair[1]) {
                    return Err(Error::InvalidRequest(format!("host {} is requested twice", self.topology.node_name(pair[0]))));
                }

                Some(indices)
            }
        };

        // the current slice can never be booked
        if needed_slices >= config.max_slices {
            return Err(no_capacity());
        }

        if schedule.is_empty() {
            schedule.initialize(self.clock.get_current_time_in_s());
        }

        let id = self.fresh_id(schedule, taken);

        // We start with the *second* time slice, because the first is the current slice
        // and is partially consumed
        let mut slice_index = 1;

        loop {
            // Make sure the schedule has enough time left in it
            if schedule.len() < slice_index + needed_slices {
                if slice_index + needed_slices > config.max_slices {
                    log::info!(
                        "No room for {} node(s) over {} minutes within {} slices (search reached slice {}).",
                        shape.node_count(),
                        minutes,
                        config.max_slices,
                        slice_index
                    );
                    return Err(no_capacity());
                }

                let missing = slice_index + needed_slices - schedule.len();
                schedule.extend(missing as i64 * config.slice_minutes);
            }

            let candidate = &schedule.slices()[slice_index];

            if candidate.start < not_before {
                slice_index += 1;
                continue;
            }

            let blocks = match &requested_indices {
                Some(indices) if candidate.are_nodes_free(indices) => vec![indices.clone()],
                Some(_) => Vec::new(),
                None => find_contiguous_blocks(&candidate.nodes, shape.node_count()).unwrap_or_default(),
            };

            let window = slice_index..slice_index + needed_slices;

            // the first block that stays free for the whole window wins
            let accepted = blocks.into_iter().find(|block| schedule.slices()[window.clone()].iter().all(|slice| slice.are_nodes_free(block)));

            if let Some(block) = accepted {
                for index in window {
                    if let Some(slice) = schedule.slice_mut(index) {
                        slice.stamp(&block, id);
                    }
                }

                let start_time = schedule.slices()[slice_index].start;
                let end_time = start_time + minutes * 60;

                log::debug!("Reservation {} placed on nodes {:?} from {} to {} ({} slices).", id, block, start_time, end_time, needed_slices);

                return Ok(Allocation { id, node_indices: block, start_time, end_time });
            }

            slice_index += 1;
        }
    }

    /// Draws an id that is neither in `taken` nor anywhere in the schedule.
    fn fresh_id(&self, schedule: &Schedule, taken: &HashSet<ReservationId>) -> ReservationId {
        loop {
            let id = ReservationId::generate();

            if !taken.contains(&id) && !schedule.contains_reservation(id) {
                return id;
            }
        }
    }
}
