use log::LevelFilter;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::config_dto::cluster_config_dto::ClusterConfigDto;
use crate::domain::cluster::resolver::ResolverPolicy;
use crate::domain::cluster::topology::ClusterTopology;
use crate::domain::schedule::schedule::ScheduleConfig;
use crate::error::ConversionError;
use crate::logger::LogConfig;

const MINUTES_PER_YEAR: i64 = 366 * 24 * 60;

/// Validated configuration of a `ReservationManager`.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub topology: ClusterTopology,
    pub schedule: ScheduleConfig,
    pub vlan_range: RangeInclusive<u32>,
    pub resolver: ResolverPolicy,

    /// Number of windows a speculative request previews.
    pub speculative_iterations: usize,

    /// Offset between the earliest start of two consecutive previewed windows.
    pub speculative_step_minutes: i64,

    pub data_dir: PathBuf,
    pub log: LogConfig,
}

impl TryFrom<ClusterConfigDto> for SchedulerConfig {
    type Error = ConversionError;

    fn try_from(dto: ClusterConfigDto) -> Result<Self, Self::Error> {
        let cluster = dto.cluster;
        if cluster.start > cluster.end {
            return Err(ConversionError::EmptyRange { field: "cluster.start..cluster.end", min: cluster.start as i64, max: cluster.end as i64 });
        }

        let topology = ClusterTopology::new(cluster.prefix, cluster.start, cluster.end, cluster.pad_len)
            .map_err(|e| ConversionError::InvalidField { field: "cluster", reason: e.to_string() })?;

        let scheduler = dto.scheduler;
        if scheduler.slice_minutes <= 0 {
            return Err(ConversionError::InvalidField { field: "scheduler.sliceMinutes", reason: format!("must be positive, got {}", scheduler.slice_minutes) });
        }

        if scheduler.min_schedule_minutes < scheduler.slice_minutes {
            return Err(ConversionError::InvalidField {
                field: "scheduler.minScheduleMinutes",
                reason: format!("must cover at least one slice ({} minutes), got {}", scheduler.slice_minutes, scheduler.min_schedule_minutes),
            });
        }

        let mut schedule = ScheduleConfig {
            slice_minutes: scheduler.slice_minutes,
            min_schedule_minutes: scheduler.min_schedule_minutes,
            max_slices: 0,
            node_count: topology.node_count(),
        };

        let min_slices = schedule.slices_for_minutes(scheduler.min_schedule_minutes);
        schedule.max_slices = scheduler.max_extension_slices.unwrap_or_else(|| schedule.slices_for_minutes(MINUTES_PER_YEAR).max(min_slices + 1));

        if schedule.max_slices <= min_slices {
            return Err(ConversionError::InvalidField {
                field: "scheduler.maxExtensionSlices",
                reason: format!("must exceed the minimum schedule length of {} slices, got {}", min_slices, schedule.max_slices),
            });
        }

        if scheduler.speculative_iterations == 0 {
            return Err(ConversionError::InvalidField { field: "scheduler.speculativeIterations", reason: "must be at least 1".to_string() });
        }

        if scheduler.speculative_step_minutes < 0 {
            return Err(ConversionError::InvalidField {
                field: "scheduler.speculativeStepMinutes",
                reason: format!("must not be negative, got {}", scheduler.speculative_step_minutes),
            });
        }

        let network = dto.network;
        if network.vlan_min > network.vlan_max {
            return Err(ConversionError::EmptyRange { field: "network.vlanMin..network.vlanMax", min: network.vlan_min as i64, max: network.vlan_max as i64 });
        }

        if dto.resolver.timeout_ms == 0 {
            return Err(ConversionError::InvalidField { field: "resolver.timeoutMs", reason: "must be positive".to_string() });
        }

        let level = dto
            .logging
            .level
            .parse::<LevelFilter>()
            .map_err(|_| ConversionError::InvalidField { field: "logging.level", reason: format!("unknown level {:?}", dto.logging.level) })?;

        Ok(SchedulerConfig {
            topology,
            schedule,
            vlan_range: network.vlan_min..=network.vlan_max,
            resolver: ResolverPolicy { timeout: Duration::from_millis(dto.resolver.timeout_ms), retries: dto.resolver.retries },
            speculative_iterations: scheduler.speculative_iterations,
            speculative_step_minutes: scheduler.speculative_step_minutes,
            data_dir: PathBuf::from(dto.storage.data_dir),
            log: LogConfig { log_dir: PathBuf::from(dto.logging.log_dir), log_file: dto.logging.log_file, level },
        })
    }
}
