use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Picks the lowest VLAN in `range` that no live reservation holds.
pub fn pick_vlan(range: RangeInclusive<u32>, in_use: &HashSet<u32>) -> Result<u32> {
    let (min, max) = (*range.start(), *range.end());

    range
        .into_iter()
        .find(|candidate| !in_use.contains(candidate))
        .ok_or_else(|| Error::ResourceExhausted(format!("couldn't assign a vlan: all of {}..={} are in use", min, max)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_free_vlan_wins() {
        assert_eq!(pick_vlan(100..=105, &HashSet::new()).unwrap(), 100);
        assert_eq!(pick_vlan(100..=105, &HashSet::from([100, 101, 103])).unwrap(), 102);
    }

    /// A VLAN held by any live reservation must be skipped, whichever reservation holds it.
    #[test]
    fn test_used_vlans_are_never_reassigned() {
        let in_use = HashSet::from([101, 100]);
        assert_eq!(pick_vlan(100..=102, &in_use).unwrap(), 102);
    }

    #[test]
    fn test_exhausted_pool() {
        let in_use = HashSet::from([100, 101]);
        assert!(matches!(pick_vlan(100..=101, &in_use), Err(Error::ResourceExhausted(_))));
    }
}
