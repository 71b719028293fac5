use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a reservation. It is stamped into the occupancy vectors of the schedule, where
/// `0` marks a free node, so an id is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ReservationId(u64);

impl ReservationId {
    /// Marker of a free node in an occupancy vector.
    pub const FREE: u64 = 0;

    pub fn new(raw: u64) -> Option<Self> {
        if raw == Self::FREE { None } else { Some(ReservationId(raw)) }
    }

    /// Draws a random id. Ids stay below `i64::MAX` so they survive tools that read them as signed.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        ReservationId(rng.random_range(1..=i64::MAX as u64))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ReservationId {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        ReservationId::new(raw).ok_or_else(|| "reservation id 0 is reserved for free nodes".to_string())
    }
}

impl From<ReservationId> for u64 {
    fn from(id: ReservationId) -> Self {
        id.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block of nodes granted to a user for a time window.
///
/// The reservation only holds a snapshot of what it was granted (host names and times); the
/// schedule is the source of truth for which node indices it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,

    /// User chosen name, unique among live reservations.
    pub name: String,

    pub owner: String,

    /// Granted node names, in grid order.
    pub hosts: Vec<String>,

    /// One boot identifier per resolved address of the hosts.
    pub pxe_names: Vec<String>,

    /// Start of the first occupied slice (Unix seconds).
    pub start_time: i64,

    /// `start_time` plus the requested duration (Unix seconds).
    pub end_time: i64,

    /// Informational, derived from the time window.
    pub duration_minutes: f64,

    /// Network segment, assigned once the reservation is committed.
    pub vlan: Option<u32>,

    /// Passed through to the boot configuration untouched.
    pub kernel_args: String,
}

impl Reservation {
    pub fn new(id: ReservationId, hosts: Vec<String>, start_time: i64, end_time: i64) -> Self {
        Reservation {
            id,
            name: String::new(),
            owner: String::new(),
            hosts,
            pxe_names: Vec::new(),
            start_time,
            end_time,
            duration_minutes: (end_time - start_time) as f64 / 60.0,
            vlan: None,
            kernel_args: String::new(),
        }
    }

    /// A reservation is live until its end time has passed.
    pub fn is_live(&self, now: i64) -> bool {
        self.end_time > now
    }
}
