use std::path::{Path, PathBuf};

use crate::domain::persistence::persistence_trait::{ReservationPersistence, Snapshot};
use crate::error::Result;
use crate::loader::parser::{parse_optional_json_file, write_json_file};

const SNAPSHOT_FILE: &str = "snapshot.json";

/// Stores the registry and the schedule together as one JSON document in `data_dir`.
///
/// The document is replaced atomically, so a crash leaves either the previous or the new
/// snapshot on disk, never a mix of both.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

impl ReservationPersistence for JsonFileStore {
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        write_json_file(self.snapshot_path(), snapshot)?;

        log::debug!(
            "Saved {} reservations and {} slices to {}.",
            snapshot.reservations.len(),
            snapshot.schedule.len(),
            self.snapshot_path().display()
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>> {
        let snapshot: Option<Snapshot> = parse_optional_json_file(self.snapshot_path())?;

        if let Some(snapshot) = &snapshot {
            log::info!("Loaded {} reservations and {} slices from {}.", snapshot.reservations.len(), snapshot.schedule.len(), self.data_dir.display());
        }

        Ok(snapshot)
    }
}
