pub mod block_finder;
pub mod schedule;
pub mod time_slice;
