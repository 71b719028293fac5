//! Read-only searches over the occupancy vector of a single slice.
//!
//! Whether a block stays free across several slices is decided by the allocator, which repeats
//! these checks slice by slice.

use crate::domain::reservation::reservation::ReservationId;
use crate::error::{Error, Result};

/// Returns true if `nodes[index]` through `nodes[index + count - 1]` are all free.
///
/// A window reaching past the end of the vector is never free.
pub fn is_free(nodes: &[u64], index: usize, count: usize) -> bool {
    match index.checked_add(count) {
        Some(window_end) if window_end <= nodes.len() => nodes[index..window_end].iter().all(|cell| *cell == ReservationId::FREE),
        _ => false,
    }
}

/// Returns true if every requested node index is free.
pub fn are_nodes_free(nodes: &[u64], indices: &[usize]) -> bool {
    indices.iter().all(|index| is_free(nodes, *index, 1))
}

/// Returns every window of `count` adjacent free nodes, as index lists in ascending start order.
///
/// Windows may overlap: on an empty vector of 4 nodes and `count = 2` the result is
/// `[[0, 1], [1, 2], [2, 3]]`.
pub fn find_contiguous_blocks(nodes: &[u64], count: usize) -> Result<Vec<Vec<usize>>> {
    let mut blocks = Vec::new();

    if count > 0 {
        let mut index = 0;
        while index + count <= nodes.len() {
            if is_free(nodes, index, count) {
                blocks.push((index..index + count).collect());
            }
            index += 1;
        }
    }

    if blocks.is_empty() {
        return Err(Error::NoSpaceInSlice { count });
    }

    Ok(blocks)
}
