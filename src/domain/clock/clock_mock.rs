use std::sync::{Arc, RwLock};

use crate::domain::clock::clock::SystemClock;

/// Manually driven clock. Clones share the same time, so a test can hold one handle and
/// advance the time seen by a scheduler holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    pub time: Arc<RwLock<i64>>,
}

impl MockClock {
    pub fn new(time: i64) -> MockClock {
        MockClock { time: Arc::new(RwLock::new(time)) }
    }

    pub fn set_time(&self, time: i64) {
        match self.time.write() {
            Ok(mut guard) => *guard = time,
            Err(poisoned) => *poisoned.into_inner() = time,
        }
    }

    pub fn advance(&self, seconds: i64) {
        let now = self.get_current_time_in_s();
        self.set_time(now + seconds);
    }
}

impl SystemClock for MockClock {
    fn get_current_time_in_s(&self) -> i64 {
        match self.time.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
