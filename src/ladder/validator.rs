use std::collections::HashSet;

use super::tracer::trace_final;
use crate::types::Lattice;

/// True when tracing lanes `0..player_count` lands on `player_count` distinct
/// bottom lanes, i.e. the ladder is a permutation.
pub fn is_valid(player_count: usize, lattice: &Lattice, height: usize) -> bool {
    let mut finals = HashSet::with_capacity(player_count);
    for lane in 0..player_count {
        if !finals.insert(trace_final(lane, lattice, height)) {
            return false;
        }
    }
    finals.len() == player_count
}
