use std::collections::HashSet;

use crate::domain::reservation::reservation::{Reservation, ReservationId};
use crate::domain::schedule::time_slice::TimeSlice;
use crate::error::{Error, Result};

/// Shape of the schedule: slice width, horizon bounds and grid width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Width of one slice in minutes.
    pub slice_minutes: i64,

    /// The schedule is kept at least this many minutes long (counting the current slice).
    pub min_schedule_minutes: i64,

    /// Upper bound on the number of slices the allocator may grow the schedule to while searching.
    pub max_slices: usize,

    /// Number of cluster nodes, i.e. the length of every occupancy vector.
    pub node_count: usize,
}

impl ScheduleConfig {
    pub fn slice_seconds(&self) -> i64 {
        self.slice_minutes * 60
    }

    /// Number of slices needed to cover `minutes`, rounded up. Saturates at `usize::MAX`.
    pub fn slices_for_minutes(&self, minutes: i64) -> usize {
        if minutes <= 0 || self.slice_minutes <= 0 {
            return 0;
        }

        let slices = (minutes as u64).div_ceil(self.slice_minutes as u64);
        usize::try_from(slices).unwrap_or(usize::MAX)
    }
}

/// The rolling, contiguous sequence of time slices describing cluster occupancy from the
/// current slice into the future.
///
/// Invariants: slices are sorted by `start`, every slice starts one second after its predecessor
/// ends, and all occupancy vectors have `node_count` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    config: ScheduleConfig,
    slices: Vec<TimeSlice>,
}

impl Schedule {
    /// Creates an empty schedule. It is populated by [`Schedule::initialize`] or [`Schedule::expire`].
    pub fn new(config: ScheduleConfig) -> Self {
        Schedule { config, slices: Vec::new() }
    }

    /// Rebuilds a schedule from persisted slices, checking the schedule invariants.
    pub fn from_slices(config: ScheduleConfig, slices: Vec<TimeSlice>) -> Result<Self> {
        let schedule = Schedule { config, slices };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn slices(&self) -> &[TimeSlice] {
        &self.slices
    }

    pub fn slice(&self, index: usize) -> Option<&TimeSlice> {
        self.slices.get(index)
    }

    pub(crate) fn slice_mut(&mut self, index: usize) -> Option<&mut TimeSlice> {
        self.slices.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Forward time span covered by the schedule, in minutes.
    pub fn horizon_minutes(&self) -> i64 {
        self.slices.len() as i64 * self.config.slice_minutes
    }

    /// Starts over with a single free slice containing `now` (aligned down to the slice width),
    /// then extends to the minimum horizon.
    pub fn initialize(&mut self, now: i64) {
        let width = self.config.slice_seconds();
        let start = now - now.rem_euclid(width);

        self.slices.clear();
        self.slices.push(TimeSlice::new(start, start + width - 1, self.config.node_count));

        // we already have one slice
        self.extend(self.config.min_schedule_minutes - self.config.slice_minutes);

        log::debug!("Schedule initialized at {} with {} slices.", start, self.slices.len());
    }

    /// Appends `ceil(minutes / slice_minutes)` free slices to the tail, but never grows the schedule
    /// beyond `max_slices`. Returns how many were added.
    pub fn extend(&mut self, minutes: i64) -> usize {
        let requested = self.config.slices_for_minutes(minutes);
        let count = requested.min(self.config.max_slices.saturating_sub(self.slices.len()));
        let width = self.config.slice_seconds();

        let Some(tail) = self.slices.last() else {
            log::error!("Cannot extend an empty schedule by {} minutes; initialize it first.", minutes);
            return 0;
        };

        if count < requested {
            log::warn!("Extension by {} minutes capped at {} slices (maximum schedule length {}).", minutes, count, self.config.max_slices);
        }

        let mut prev_end = tail.end;
        self.slices.reserve(count);

        for _ in 0..count {
            // Starts 1 second after the previous slice ends
            let start = prev_end + 1;
            let end = start + width - 1;
            self.slices.push(TimeSlice::new(start, end, self.config.node_count));
            prev_end = end;
        }

        count
    }

    /// Drops slices that ended at or before `now` and restores the minimum horizon.
    ///
    /// If the whole schedule lies in the past (or there is none), it is rebuilt from scratch.
    /// Callers must have reloaded any persisted state by then: reservations still recorded
    /// elsewhere are not carried into the fresh slices.
    pub fn expire(&mut self, now: i64) {
        let fully_expired = match self.slices.last() {
            Some(last) => last.end <= now,
            None => true,
        };

        if fully_expired {
            if !self.slices.is_empty() {
                log::info!("Schedule ended before {}; starting a fresh one.", now);
            }
            self.initialize(now);
        }

        if let Some(first_valid) = self.slices.iter().position(|slice| slice.end > now) {
            if first_valid > 0 {
                self.slices.drain(..first_valid);
                log::debug!("Dropped {} expired slices.", first_valid);
            }
        }

        if self.horizon_minutes() < self.config.min_schedule_minutes {
            self.extend(self.config.min_schedule_minutes - self.horizon_minutes());
        }
    }

    /// Frees every node held by `id` in every slice. Returns the number of freed cells.
    pub fn release(&mut self, id: ReservationId) -> usize {
        self.slices.iter_mut().map(|slice| slice.release(id)).sum()
    }

    pub fn contains_reservation(&self, id: ReservationId) -> bool {
        self.slices.iter().any(|slice| slice.nodes.contains(&id.as_u64()))
    }

    /// Every id stamped anywhere in the schedule.
    pub fn reservation_ids(&self) -> HashSet<ReservationId> {
        self.slices.iter().flat_map(|slice| slice.nodes.iter()).filter_map(|raw| ReservationId::new(*raw)).collect()
    }

    /// True if `reservation` holds nodes in every slice that starts inside its time window.
    pub fn holds(&self, reservation: &Reservation) -> bool {
        self.slices
            .iter()
            .filter(|slice| reservation.start_time <= slice.start && slice.start < reservation.end_time)
            .all(|slice| slice.nodes.contains(&reservation.id.as_u64()))
    }

    /// Checks the ordering, contiguity and width invariants.
    pub fn validate(&self) -> Result<()> {
        for (index, slice) in self.slices.iter().enumerate() {
            if slice.end < slice.start {
                return Err(Error::PersistenceError(format!("slice {} ends ({}) before it starts ({})", index, slice.end, slice.start)));
            }

            if slice.nodes.len() != self.config.node_count {
                return Err(Error::PersistenceError(format!(
                    "slice {} tracks {} nodes, but the cluster has {}",
                    index,
                    slice.nodes.len(),
                    self.config.node_count
                )));
            }
        }

        for (index, pair) in self.slices.windows(2).enumerate() {
            if pair[0].end + 1 != pair[1].start {
                return Err(Error::PersistenceError(format!(
                    "slices {} and {} are not contiguous ({} -> {})",
                    index,
                    index + 1,
                    pair[0].end,
                    pair[1].start
                )));
            }
        }

        Ok(())
    }

    pub fn into_slices(self) -> Vec<TimeSlice> {
        self.slices
    }
}
