use crate::domain::persistence::persistence_trait::{ReservationPersistence, Snapshot};
use crate::error::Result;

/// Keeps nothing. For dry runs and tests that do not care about durability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl ReservationPersistence for NullStore {
    fn save(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(None)
    }
}
