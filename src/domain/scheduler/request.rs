use std::collections::HashSet;

use crate::error::{Error, Result};

/// Which nodes a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestShape {
    /// Any `n` adjacent nodes.
    Count(usize),

    /// Exactly these nodes, by name.
    Hosts(Vec<String>),
}

impl RequestShape {
    pub fn node_count(&self) -> usize {
        match self {
            RequestShape::Count(count) => *count,
            RequestShape::Hosts(hosts) => hosts.len(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RequestShape::Count(0) => Err(Error::InvalidRequest("node count must be positive".to_string())),
            RequestShape::Count(_) => Ok(()),
            RequestShape::Hosts(hosts) if hosts.is_empty() => Err(Error::InvalidRequest("host list is empty".to_string())),
            RequestShape::Hosts(hosts) => {
                let mut seen = HashSet::new();
                match hosts.iter().find(|host| !seen.insert(host.as_str())) {
                    Some(duplicate) => Err(Error::InvalidRequest(format!("host {} is requested twice", duplicate))),
                    None => Ok(()),
                }
            }
        }
    }
}

/// A user request for a reservation, as handed to the `ReservationManager`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub name: String,
    pub owner: String,
    pub duration_minutes: i64,
    pub shape: RequestShape,

    /// Earliest allowed start (Unix seconds). `None` means now.
    pub not_before: Option<i64>,

    pub kernel_args: String,
}

impl ReservationRequest {
    pub fn by_count(name: impl Into<String>, owner: impl Into<String>, duration_minutes: i64, count: usize) -> Self {
        ReservationRequest {
            name: name.into(),
            owner: owner.into(),
            duration_minutes,
            shape: RequestShape::Count(count),
            not_before: None,
            kernel_args: String::new(),
        }
    }

    pub fn by_hosts(name: impl Into<String>, owner: impl Into<String>, duration_minutes: i64, hosts: Vec<String>) -> Self {
        ReservationRequest {
            name: name.into(),
            owner: owner.into(),
            duration_minutes,
            shape: RequestShape::Hosts(hosts),
            not_before: None,
            kernel_args: String::new(),
        }
    }

    pub fn with_not_before(mut self, not_before: i64) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn with_kernel_args(mut self, kernel_args: impl Into<String>) -> Self {
        self.kernel_args = kernel_args.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRequest("reservation name is empty".to_string()));
        }

        if self.duration_minutes <= 0 {
            return Err(Error::InvalidRequest(format!("duration must be positive, got {} minutes", self.duration_minutes)));
        }

        self.shape.validate()
    }
}
