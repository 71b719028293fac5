use std::path::Path;
use std::sync::Arc;

use crate::api::config_dto::cluster_config_dto::ClusterConfigDto;
use crate::domain::clock::clock::SystemClock;
use crate::domain::cluster::resolver::NameResolver;
use crate::domain::persistence::json_store::JsonFileStore;
use crate::domain::scheduler::reservation_manager::ReservationManager;
use crate::domain::scheduler::scheduler_config::SchedulerConfig;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads and validates the JSON configuration file.
pub fn load_config(file_path: impl AsRef<Path>) -> Result<SchedulerConfig> {
    let dto: ClusterConfigDto = parse_json_file(file_path.as_ref())?;
    log::debug!("Configuration file {} parsed successfully.", file_path.as_ref().display());

    let config = SchedulerConfig::try_from(dto)?;
    Ok(config)
}

/// Builds a manager persisting to the configured data directory, restoring any saved state.
pub fn generate_reservation_manager(
    config: SchedulerConfig,
    clock: Arc<dyn SystemClock>,
    resolver: Arc<dyn NameResolver>,
) -> Result<ReservationManager> {
    let persistence = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    ReservationManager::new(config, clock, resolver, persistence)
}
