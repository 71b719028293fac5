use bimap::BiMap;
use std::collections::{HashMap, HashSet};

use crate::domain::reservation::reservation::{Reservation, ReservationId};
use crate::error::{Error, Result};

/// Registry of all known reservations, indexed by id and by user given name.
#[derive(Debug, Clone, Default)]
pub struct ReservationStore {
    /// Reservation Storage.
    reservations: HashMap<ReservationId, Reservation>,

    /// Name <-> id lookup. Names are unique among stored reservations.
    name_index: BiMap<String, ReservationId>,
}

impl ReservationStore {
    pub fn new() -> Self {
        ReservationStore { reservations: HashMap::new(), name_index: BiMap::new() }
    }

    /// Rebuilds a store from persisted reservations.
    pub fn from_reservations(reservations: Vec<Reservation>) -> Result<Self> {
        let mut store = ReservationStore::new();

        for reservation in reservations {
            store.add(reservation)?;
        }

        Ok(store)
    }

    /// Adds a reservation.
    ///
    /// # Returns
    /// `Error::DuplicateReservation` if the name is taken, `Error::InvalidRequest` if the id is.
    pub fn add(&mut self, reservation: Reservation) -> Result<()> {
        if self.name_index.contains_left(&reservation.name) {
            return Err(Error::DuplicateReservation(reservation.name.clone()));
        }

        if self.reservations.contains_key(&reservation.id) {
            return Err(Error::InvalidRequest(format!("reservation id {} is already in use", reservation.id)));
        }

        self.name_index.insert(reservation.name.clone(), reservation.id);
        self.reservations.insert(reservation.id, reservation);

        Ok(())
    }

    pub fn get(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    pub fn get_mut(&mut self, id: ReservationId) -> Option<&mut Reservation> {
        self.reservations.get_mut(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Reservation> {
        let id = self.name_index.get_by_left(name)?;
        self.reservations.get(id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.name_index.contains_left(name)
    }

    pub fn remove(&mut self, id: ReservationId) -> Option<Reservation> {
        self.name_index.remove_by_right(&id);
        self.reservations.remove(&id)
    }

    pub fn ids(&self) -> HashSet<ReservationId> {
        self.reservations.keys().copied().collect()
    }

    /// VLANs held by reservations that have not ended at `now`.
    pub fn live_vlans(&self, now: i64) -> HashSet<u32> {
        self.reservations.values().filter(|reservation| reservation.is_live(now)).filter_map(|reservation| reservation.vlan).collect()
    }

    /// Removes every reservation whose end time has passed. Returns the removed reservations.
    pub fn expire(&mut self, now: i64) -> Vec<Reservation> {
        let expired: Vec<ReservationId> =
            self.reservations.values().filter(|reservation| !reservation.is_live(now)).map(|reservation| reservation.id).collect();

        let removed: Vec<Reservation> = expired.into_iter().filter_map(|id| self.remove(id)).collect();

        for reservation in &removed {
            log::info!("Reservation {} (id: {}) ended at {} and was removed.", reservation.name, reservation.id, reservation.end_time);
        }

        removed
    }

    /// All reservations ordered by start time, then name.
    pub fn sorted(&self) -> Vec<&Reservation> {
        let mut reservations: Vec<&Reservation> = self.reservations.values().collect();
        reservations.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.name.cmp(&b.name)));
        reservations
    }

    pub fn to_vec(&self) -> Vec<Reservation> {
        self.sorted().into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}
