use serde::{Deserialize, Serialize};

use crate::domain::reservation::reservation::Reservation;
use crate::domain::schedule::time_slice::TimeSlice;
use crate::error::Result;

/// Everything needed to restore the scheduler: the registry and the grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub reservations: Vec<Reservation>,
    pub schedule: Vec<TimeSlice>,
}

/// Durable storage of scheduler state.
///
/// `save` replaces the previously stored snapshot as a whole, registry and schedule together;
/// `load` returns `None` if nothing was ever saved. Both are blocking calls.
pub trait ReservationPersistence: Send + Sync + std::fmt::Debug {
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    fn load(&self) -> Result<Option<Snapshot>>;
}
