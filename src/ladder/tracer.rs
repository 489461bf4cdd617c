use crate::types::{LadderDimensions, LanePath, Lattice};

/// Lane reached at the bottom when starting from `start_lane`.
pub fn trace_final(start_lane: usize, lattice: &Lattice, height: usize) -> usize {
    (1..height).fold(start_lane, |lane, level| step_lane(lane, lattice, level))
}

/// Lane at every level `0..=height`; the first entry is `start_lane` and the
/// last equals [`trace_final`].
pub fn trace_path(start_lane: usize, lattice: &Lattice, height: usize) -> LanePath {
    let mut lanes = Vec::with_capacity(height + 1);
    let mut lane = start_lane;
    lanes.push(lane);
    for level in 1..height {
        lane = step_lane(lane, lattice, level);
        lanes.push(lane);
    }
    // bottom row carries no rungs
    lanes.push(lane);
    LanePath::from_lanes(lanes)
}

/// Final lane for every starting lane `0..player_count`, indexed by start.
pub fn trace_all(dims: LadderDimensions, lattice: &Lattice) -> Vec<usize> {
    (0..dims.player_count)
        .map(|lane| trace_final(lane, lattice, dims.height))
        .collect()
}

/// Full path for every starting lane `0..player_count`, indexed by start.
pub fn trace_paths(dims: LadderDimensions, lattice: &Lattice) -> Vec<LanePath> {
    (0..dims.player_count)
        .map(|lane| trace_path(lane, lattice, dims.height))
        .collect()
}

fn step_lane(lane: usize, lattice: &Lattice, level: usize) -> usize {
    lattice
        .rung_touching(level, lane)
        .map_or(lane, |rung| rung.other_end(lane))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rung;

    #[test]
    fn single_rung_swaps_two_lanes() {
        let lattice = Lattice::from_rungs(vec![Rung::new(0, 1)]);
        assert_eq!(trace_final(0, &lattice, 2), 1);
        assert_eq!(trace_final(1, &lattice, 2), 0);
        assert_eq!(trace_path(0, &lattice, 2).as_slice(), &[0, 1, 1]);
    }

    #[test]
    fn repeated_rung_cancels_out() {
        let lattice = Lattice::from_rungs(vec![Rung::new(0, 1), Rung::new(0, 2)]);
        for lane in 0..4 {
            assert_eq!(trace_final(lane, &lattice, 3), lane);
        }
        assert_eq!(trace_path(0, &lattice, 3).as_slice(), &[0, 1, 0, 0]);
    }

    #[test]
    fn empty_lattice_is_identity() {
        let lattice = Lattice::new();
        for lane in 0..5 {
            assert_eq!(trace_final(lane, &lattice, 10), lane);
            assert!(trace_path(lane, &lattice, 10)
                .as_slice()
                .iter()
                .all(|&at| at == lane));
        }
    }

    #[test]
    fn path_has_one_entry_per_level() {
        let lattice = Lattice::from_rungs(vec![Rung::new(1, 2), Rung::new(0, 4)]);
        for height in 1..8 {
            let path = trace_path(2, &lattice, height);
            assert_eq!(path.len(), height + 1);
            assert_eq!(path.start_lane(), 2);
            assert_eq!(path.final_lane(), trace_final(2, &lattice, height));
        }
    }

    #[test]
    fn rungs_below_the_height_are_ignored() {
        let lattice = Lattice::from_rungs(vec![Rung::new(0, 5)]);
        assert_eq!(trace_final(0, &lattice, 5), 0);
        assert_eq!(trace_final(0, &lattice, 6), 1);
    }

    #[test]
    fn chained_rungs_move_across_several_lanes() {
        let lattice = Lattice::from_rungs(vec![Rung::new(0, 1), Rung::new(1, 2), Rung::new(2, 3)]);
        let dims = LadderDimensions::new(4, 4).expect("valid dimensions");
        assert_eq!(trace_path(0, &lattice, 4).as_slice(), &[0, 1, 2, 3, 3]);
        assert_eq!(trace_all(dims, &lattice), vec![3, 0, 1, 2]);
        let finals: Vec<usize> = trace_paths(dims, &lattice)
            .iter()
            .map(LanePath::final_lane)
            .collect();
        assert_eq!(finals, vec![3, 0, 1, 2]);
    }
}
