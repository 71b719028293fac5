pub mod clock;
pub mod cluster;
pub mod persistence;
pub mod reservation;
pub mod schedule;
pub mod scheduler;
