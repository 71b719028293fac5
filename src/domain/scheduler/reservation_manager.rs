use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::clock::clock::SystemClock;
use crate::domain::cluster::pxe::derive_pxe_names;
use crate::domain::cluster::resolver::NameResolver;
use crate::domain::persistence::persistence_trait::{ReservationPersistence, Snapshot};
use crate::domain::reservation::reservation::{Reservation, ReservationId};
use crate::domain::reservation::reservation_store::ReservationStore;
use crate::domain::reservation::vlan::pick_vlan;
use crate::domain::schedule::schedule::{Schedule, ScheduleConfig};
use crate::domain::scheduler::allocator::Allocator;
use crate::domain::scheduler::request::ReservationRequest;
use crate::domain::scheduler::scheduler_config::SchedulerConfig;
use crate::error::{Error, Result};

/// The schedule and the registry. They are only ever touched together, under one lock.
///
/// A reservation is pending from the moment it is stamped until its PXE names are known. Pending
/// reservations hold their nodes but are invisible to listings and are never saved.
#[derive(Debug)]
struct SchedulerState {
    schedule: Schedule,
    store: ReservationStore,
    pending: HashSet<ReservationId>,
}

impl SchedulerState {
    fn new(config: ScheduleConfig) -> Self {
        SchedulerState { schedule: Schedule::new(config), store: ReservationStore::new(), pending: HashSet::new() }
    }

    /// Rebuilds the state from a saved snapshot, rejecting snapshots whose registry and
    /// schedule disagree.
    fn restore(config: ScheduleConfig, snapshot: Snapshot) -> Result<Self> {
        let schedule = Schedule::from_slices(config, snapshot.schedule)?;
        let store = ReservationStore::from_reservations(snapshot.reservations)?;

        let registered = store.ids();
        if let Some(id) = schedule.reservation_ids().into_iter().find(|id| !registered.contains(id)) {
            return Err(Error::PersistenceError(format!("schedule holds nodes for unregistered reservation {}", id)));
        }

        if let Some(reservation) = store.sorted().into_iter().find(|reservation| !schedule.holds(reservation)) {
            return Err(Error::PersistenceError(format!(
                "reservation {} (id: {}) is missing from the schedule",
                reservation.name, reservation.id
            )));
        }

        Ok(SchedulerState { schedule, store, pending: HashSet::new() })
    }

    /// The committed part of the state: pending reservations and their stamps are left out.
    fn snapshot(&self) -> Snapshot {
        let reservations = self.store.to_vec().into_iter().filter(|reservation| !self.pending.contains(&reservation.id)).collect();

        let mut schedule = self.schedule.slices().to_vec();
        for id in &self.pending {
            for slice in schedule.iter_mut() {
                slice.release(*id);
            }
        }

        Snapshot { reservations, schedule }
    }

    fn is_visible(&self, reservation: &Reservation) -> bool {
        !self.pending.contains(&reservation.id)
    }

    /// Brings both structures up to date with `now`.
    fn expire(&mut self, now: i64) {
        self.schedule.expire(now);

        // a reservation can end inside the current slice
        for reservation in self.store.expire(now) {
            self.pending.remove(&reservation.id);
            self.schedule.release(reservation.id);
        }

        // a rebuilt schedule no longer holds the stamps of reservations that are still live
        let orphaned: Vec<ReservationId> =
            self.store.sorted().into_iter().filter(|reservation| !self.schedule.holds(reservation)).map(|reservation| reservation.id).collect();

        for id in orphaned {
            self.pending.remove(&id);
            self.schedule.release(id);
            if let Some(reservation) = self.store.remove(id) {
                log::warn!("Dropped reservation {} (id: {}): its slices are no longer in the schedule.", reservation.name, id);
            }
        }
    }
}

/// One window offered by a speculative request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeculativeWindow {
    pub start_time: i64,
    pub end_time: i64,
    pub hosts: Vec<String>,
}

/// Owner of the cluster schedule and the reservation registry.
///
/// Cloning the manager yields another handle to the same state. Every mutation (allocation,
/// deletion, maintenance) runs its read-then-write under the write lock, so two allocations can
/// never interleave their search and stamp phases. Listings and speculative previews share the
/// read lock and work on copies.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    state: Arc<RwLock<SchedulerState>>,
    allocator: Allocator,
    config: Arc<SchedulerConfig>,
    clock: Arc<dyn SystemClock>,
    resolver: Arc<dyn NameResolver>,
    persistence: Arc<dyn ReservationPersistence>,
}

impl ReservationManager {
    /// Restores the last saved state (if any) and brings it up to date with the clock.
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn SystemClock>,
        resolver: Arc<dyn NameResolver>,
        persistence: Arc<dyn ReservationPersistence>,
    ) -> Result<Self> {
        let mut state = match persistence.load()? {
            Some(snapshot) => SchedulerState::restore(config.schedule, snapshot)?,
            None => SchedulerState::new(config.schedule),
        };

        state.expire(clock.get_current_time_in_s());

        log::info!(
            "ReservationManager ready: {} nodes, {} reservations, {} slices of {} minutes.",
            config.topology.node_count(),
            state.store.len(),
            state.schedule.len(),
            config.schedule.slice_minutes
        );

        let allocator = Allocator::new(config.topology.clone(), clock.clone());

        Ok(ReservationManager { state: Arc::new(RwLock::new(state)), allocator, config: Arc::new(config), clock, resolver, persistence })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn now(&self) -> i64 {
        self.clock.get_current_time_in_s()
    }

    /// Saves the committed state. The blocking write runs on tokio's blocking pool.
    async fn persist(&self, state: &SchedulerState) -> Result<()> {
        let snapshot = state.snapshot();
        let persistence = self.persistence.clone();

        match tokio::task::spawn_blocking(move || persistence.save(&snapshot)).await {
            Ok(result) => result,
            Err(e) => Err(Error::PersistenceError(format!("save task failed: {}", e))),
        }
    }

    /// Builds the schedule if there is none. An existing schedule is left as it is.
    pub async fn initialize_schedule(&self) -> Result<()> {
        let mut state = self.state.write().await;

        if state.schedule.is_empty() {
            let now = self.now();
            state.schedule.initialize(now);
            self.persist(&state).await?;
        }

        Ok(())
    }

    /// Drops past slices and ended reservations, then restores the minimum horizon.
    pub async fn expire_schedule(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let now = self.now();

        state.expire(now);
        self.persist(&state).await
    }

    /// Appends slices covering `minutes` to the schedule, up to the maximum schedule length.
    /// Returns the number of new slices.
    pub async fn extend_schedule(&self, minutes: i64) -> Result<usize> {
        let mut state = self.state.write().await;
        let now = self.now();

        state.expire(now);
        let added = state.schedule.extend(minutes);

        if added > 0 {
            self.persist(&state).await?;
        }

        Ok(added)
    }

    /// Allocates, registers and persists a reservation.
    ///
    /// Search, stamp and VLAN assignment happen under the write lock. Host name resolution for
    /// the PXE names runs after the lock is released, while the reservation is pending; if it
    /// fails (or the final save fails), the stamp and the registry entry are rolled back before
    /// the error is returned.
    pub async fn submit(&self, request: ReservationRequest) -> Result<Reservation> {
        request.validate()?;

        let mut reservation = {
            let mut state = self.state.write().await;
            let now = self.now();
            state.expire(now);

            if state.store.contains_name(&request.name) {
                return Err(Error::DuplicateReservation(request.name.clone()));
            }

            let not_before = request.not_before.unwrap_or(now);
            let taken = state.store.ids();

            let (mut reservation, new_schedule) =
                self.allocator.find_reservation_generic(&state.schedule, request.duration_minutes, &request.shape, not_before, &taken)?;

            // the stamped schedule is only committed once a VLAN is available
            let vlan = pick_vlan(self.config.vlan_range.clone(), &state.store.live_vlans(now))?;

            reservation.vlan = Some(vlan);
            reservation.name = request.name.clone();
            reservation.owner = request.owner.clone();
            reservation.kernel_args = request.kernel_args.clone();

            state.store.add(reservation.clone())?;
            state.pending.insert(reservation.id);
            state.schedule = new_schedule;

            tracing::info!(
                reservation = %reservation.name,
                id = %reservation.id,
                vlan,
                start = reservation.start_time,
                end = reservation.end_time,
                "stamped reservation on {} node(s)",
                reservation.hosts.len()
            );

            reservation
        };

        let pxe_names = match derive_pxe_names(self.resolver.as_ref(), &reservation.hosts, self.config.resolver).await {
            Ok(pxe_names) => pxe_names,
            Err(err) => {
                let mut state = self.state.write().await;
                self.rollback(&mut state, reservation.id, &err);
                return Err(err);
            }
        };

        let mut state = self.state.write().await;

        if !state.pending.remove(&reservation.id) {
            return Err(Error::UnknownReservation(reservation.name.clone()));
        }

        match state.store.get_mut(reservation.id) {
            Some(stored) => stored.pxe_names = pxe_names.clone(),
            None => return Err(Error::UnknownReservation(reservation.name.clone())),
        }
        reservation.pxe_names = pxe_names;

        if let Err(err) = self.persist(&state).await {
            self.rollback(&mut state, reservation.id, &err);
            return Err(err);
        }

        tracing::info!(reservation = %reservation.name, id = %reservation.id, "committed reservation");
        Ok(reservation)
    }

    /// Undoes a stamped but uncommitted reservation. Saved state never contains it.
    fn rollback(&self, state: &mut SchedulerState, id: ReservationId, cause: &Error) {
        state.pending.remove(&id);
        let released = state.schedule.release(id);
        let removed = state.store.remove(id);

        tracing::warn!(
            id = %id,
            released_cells = released,
            "rolled back reservation {}: {}",
            removed.map(|reservation| reservation.name).unwrap_or_default(),
            cause
        );
    }

    /// Previews the next feasible windows for `request` without reserving anything.
    ///
    /// The search is repeated `speculative_iterations` times, moving the earliest start
    /// forward by `speculative_step_minutes` each round.
    pub async fn speculate(&self, request: &ReservationRequest) -> Result<Vec<SpeculativeWindow>> {
        request.validate()?;

        let (mut schedule, taken) = {
            let state = self.state.read().await;
            (state.schedule.clone(), state.store.ids())
        };

        let now = self.now();
        schedule.expire(now);

        let first_start = request.not_before.unwrap_or(now);
        let mut windows = Vec::with_capacity(self.config.speculative_iterations);

        for iteration in 0..self.config.speculative_iterations {
            let not_before = first_start + iteration as i64 * self.config.speculative_step_minutes * 60;
            let (reservation, _) = self.allocator.find_reservation_generic(&schedule, request.duration_minutes, &request.shape, not_before, &taken)?;

            windows.push(SpeculativeWindow { start_time: reservation.start_time, end_time: reservation.end_time, hosts: reservation.hosts });
        }

        Ok(windows)
    }

    /// Removes a committed reservation and frees its nodes in every slice.
    ///
    /// If the new state cannot be saved, the reservation is restored and the error returned.
    pub async fn delete(&self, name: &str) -> Result<Reservation> {
        let mut state = self.state.write().await;

        let id = state
            .store
            .get_by_name(name)
            .filter(|reservation| state.is_visible(reservation))
            .map(|reservation| reservation.id)
            .ok_or_else(|| Error::UnknownReservation(name.to_string()))?;

        let previous_schedule = state.schedule.clone();
        let reservation = state.store.remove(id).ok_or_else(|| Error::UnknownReservation(name.to_string()))?;
        let released = state.schedule.release(id);

        if let Err(err) = self.persist(&state).await {
            state.schedule = previous_schedule;
            if let Err(restore_err) = state.store.add(reservation) {
                log::error!("Could not restore reservation {} after a failed save: {}", name, restore_err);
            }

            log::error!("Could not save the deletion of reservation {}, it was restored: {}", name, err);
            return Err(err);
        }

        log::info!("Deleted reservation {} (id: {}), freed {} node slots.", name, reservation.id, released);
        Ok(reservation)
    }

    /// A committed reservation by name.
    pub async fn get(&self, name: &str) -> Option<Reservation> {
        let state = self.state.read().await;
        state.store.get_by_name(name).filter(|reservation| state.is_visible(reservation)).cloned()
    }

    /// All committed reservations, ordered by start time.
    pub async fn list(&self) -> Vec<Reservation> {
        self.state.read().await.snapshot().reservations
    }

    /// A copy of the current schedule. Nodes held by pending reservations show as occupied.
    pub async fn schedule(&self) -> Schedule {
        self.state.read().await.schedule.clone()
    }

    /// The committed state, as it would be saved.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot()
    }
}
