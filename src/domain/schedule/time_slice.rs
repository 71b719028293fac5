use serde::{Deserialize, Serialize};

use crate::domain::reservation::reservation::ReservationId;
use crate::domain::schedule::block_finder;

/// One fixed-width interval of the schedule and the occupancy of every cluster node in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlice {
    /// First second of the slice (Unix time, inclusive).
    pub start: i64,

    /// Last second of the slice (Unix time, inclusive).
    pub end: i64,

    /// One entry per node index: `ReservationId::FREE` or the id of the occupying reservation.
    pub nodes: Vec<u64>,
}

impl TimeSlice {
    /// Creates a slice in which every node is free.
    pub fn new(start: i64, end: i64, node_count: usize) -> Self {
        TimeSlice { start, end, nodes: vec![ReservationId::FREE; node_count] }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_node_free(&self, index: usize) -> bool {
        block_finder::is_free(&self.nodes, index, 1)
    }

    pub fn are_nodes_free(&self, indices: &[usize]) -> bool {
        block_finder::are_nodes_free(&self.nodes, indices)
    }

    /// The reservation occupying node `index`, if any.
    pub fn occupant(&self, index: usize) -> Option<ReservationId> {
        self.nodes.get(index).and_then(|raw| ReservationId::new(*raw))
    }

    /// Marks the given nodes as occupied by `id`.
    ///
    /// Callers check [`TimeSlice::are_nodes_free`] first; a node held by another reservation is
    /// left untouched and reported.
    pub fn stamp(&mut self, indices: &[usize], id: ReservationId) {
        for &index in indices {
            match self.nodes.get_mut(index) {
                Some(cell) if *cell == ReservationId::FREE || *cell == id.as_u64() => *cell = id.as_u64(),
                Some(cell) => {
                    log::error!("Node {} in slice starting at {} is held by {}, refusing to stamp {}.", index, self.start, cell, id);
                }
                None => log::error!("Node index {} is outside of the slice ({} nodes).", index, self.nodes.len()),
            }
        }
    }

    /// Frees every node held by `id`. Returns the number of freed nodes.
    pub fn release(&mut self, id: ReservationId) -> usize {
        let mut released = 0;

        for cell in self.nodes.iter_mut().filter(|cell| **cell == id.as_u64()) {
            *cell = ReservationId::FREE;
            released += 1;
        }

        released
    }

    /// Node indices held by `id`, ascending.
    pub fn indices_of(&self, id: ReservationId) -> Vec<usize> {
        self.nodes.iter().enumerate().filter(|(_, cell)| **cell == id.as_u64()).map(|(index, _)| index).collect()
    }

    pub fn free_count(&self) -> usize {
        self.nodes.iter().filter(|cell| **cell == ReservationId::FREE).count()
    }

    pub fn contains_time(&self, time: i64) -> bool {
        self.start <= time && time <= self.end
    }
}
