use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now" for the scheduler. Every time value handled by the schedule is a Unix
/// timestamp in seconds.
pub trait SystemClock: std::fmt::Debug + Send + Sync {
    fn get_current_time_in_s(&self) -> i64;
}

/// The wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl WallClock {
    pub fn new() -> Self {
        WallClock
    }
}

impl SystemClock for WallClock {
    fn get_current_time_in_s(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs() as i64
    }
}
