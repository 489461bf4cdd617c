use crate::constants::FALLBACK_RUNG_PROBABILITY;
use crate::rng::RandomSource;
use crate::types::{LadderDimensions, Lattice, Rung};

/// Builds a candidate ladder level by level.
///
/// A position `i` (joining lanes `i` and `i + 1`) is available on a level only
/// when neither lane was an endpoint of a rung on the level directly above.
/// From the available positions a random non-empty subset is drawn and thinned
/// so that no two chosen positions are adjacent.
pub fn generate<R: RandomSource>(dims: LadderDimensions, rng: &mut R) -> Lattice {
    let mut lattice = Lattice::new();
    let mut occupied = vec![false; dims.player_count];

    for level in dims.rung_levels() {
        let available: Vec<usize> = (0..dims.rung_positions())
            .filter(|&pos| !occupied[pos] && !occupied[pos + 1])
            .collect();

        occupied.iter_mut().for_each(|lane| *lane = false);
        for left in choose_positions(available, rng) {
            occupied[left] = true;
            occupied[left + 1] = true;
            lattice.push(Rung::new(left, level));
        }
    }

    lattice
}

/// Picks a random non-empty, pairwise non-adjacent subset of `available`.
/// Returns the positions in ascending order.
pub(crate) fn choose_positions<R: RandomSource>(
    mut available: Vec<usize>,
    rng: &mut R,
) -> Vec<usize> {
    if available.is_empty() {
        return available;
    }

    let max_rungs = available.len().min((available.len() / 2).max(1));
    rng.shuffle(&mut available);
    available.truncate(rng.pick_index(max_rungs) + 1);
    available.sort_unstable();

    let mut chosen: Vec<usize> = Vec::with_capacity(available.len());
    for pos in available {
        match chosen.last() {
            Some(&last) if pos <= last + 1 => {}
            _ => chosen.push(pos),
        }
    }
    chosen
}

/// Terminal fallback: each level gets at most one rung, placed with
/// probability [`FALLBACK_RUNG_PROBABILITY`] at a uniform position. No
/// cross-level constraint is applied.
pub fn generate_fallback<R: RandomSource>(dims: LadderDimensions, rng: &mut R) -> Lattice {
    let mut lattice = Lattice::new();
    for level in dims.rung_levels() {
        if rng.bool(FALLBACK_RUNG_PROBABILITY) {
            let left = rng.pick_index(dims.rung_positions());
            lattice.push(Rung::new(left, level));
        }
    }
    lattice
}
