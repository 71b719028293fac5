use serde::Deserialize;

/// Root of the JSON configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfigDto {
    pub cluster: ClusterDto,
    #[serde(default)]
    pub scheduler: SchedulerDto,
    pub network: NetworkDto,
    #[serde(default)]
    pub resolver: ResolverDto,
    #[serde(default)]
    pub storage: StorageDto,
    #[serde(default)]
    pub logging: LoggingDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDto {
    pub prefix: String,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub pad_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerDto {
    pub slice_minutes: i64,
    pub min_schedule_minutes: i64,
    /// Defaults to one year worth of slices.
    pub max_extension_slices: Option<usize>,
    pub speculative_iterations: usize,
    pub speculative_step_minutes: i64,
}

impl Default for SchedulerDto {
    fn default() -> Self {
        SchedulerDto {
            slice_minutes: 60,
            min_schedule_minutes: 7 * 24 * 60,
            max_extension_slices: None,
            speculative_iterations: 10,
            speculative_step_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDto {
    pub vlan_min: u32,
    pub vlan_max: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverDto {
    pub timeout_ms: u64,
    pub retries: u32,
}

impl Default for ResolverDto {
    fn default() -> Self {
        ResolverDto { timeout_ms: 2000, retries: 2 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageDto {
    pub data_dir: String,
}

impl Default for StorageDto {
    fn default() -> Self {
        StorageDto { data_dir: "data".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingDto {
    pub log_dir: String,
    pub log_file: String,
    pub level: String,
}

impl Default for LoggingDto {
    fn default() -> Self {
        LoggingDto { log_dir: "logs".to_string(), log_file: "igor.log".to_string(), level: "info".to_string() }
    }
}
