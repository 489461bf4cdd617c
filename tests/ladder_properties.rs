//! Property tests for ladder generation and tracing.
//!
//! 1. Accepted ladders map players one-to-one onto bottom lanes
//! 2. Every rung joins two adjacent lanes
//! 3. Rungs on one level never share or touch a lane
//! 4. Paths start at the starting lane and end at the traced lane
//! 5. Tracing is pure
//! 6. An empty ladder leaves every player in place

use std::collections::HashSet;

use dino_ladder_server::constants::MAX_GENERATION_ATTEMPTS;
use dino_ladder_server::ladder::{
    generate, generate_fallback, generate_valid_ladder, is_valid, trace_all, trace_final,
    trace_path,
};
use dino_ladder_server::rng::Rng;
use dino_ladder_server::types::{LadderDimensions, Lattice, LatticeOrigin, Rung};
use proptest::prelude::*;

fn dims_strategy() -> impl Strategy<Value = LadderDimensions> {
    (2usize..12, 1usize..24).prop_map(|(players, height)| {
        LadderDimensions::new(players, height).expect("strategy yields valid dimensions")
    })
}

proptest! {
    #[test]
    fn accepted_ladders_are_permutations(dims in dims_strategy(), seed in any::<u32>()) {
        let mut rng = Rng::new(seed);
        let ladder = generate_valid_ladder(dims, &mut rng);
        let within_budget = matches!(
            ladder.origin,
            LatticeOrigin::Primary { attempts } if attempts <= MAX_GENERATION_ATTEMPTS
        );
        prop_assert!(within_budget, "origin {:?}", ladder.origin);
        let finals: HashSet<usize> = trace_all(dims, &ladder.rungs).into_iter().collect();
        prop_assert_eq!(finals.len(), dims.player_count);
        prop_assert!(finals.iter().all(|&lane| lane < dims.player_count));
    }

    #[test]
    fn rungs_join_adjacent_lanes_without_touching(dims in dims_strategy(), seed in any::<u32>()) {
        let mut rng = Rng::new(seed);
        let lattice = generate(dims, &mut rng);
        for rung in lattice.rungs() {
            prop_assert_eq!(rung.right(), rung.left() + 1);
            prop_assert!(rung.right() < dims.player_count);
            prop_assert!(rung.level() >= 1 && rung.level() < dims.height);
        }
        for level in dims.rung_levels() {
            let rungs: Vec<&Rung> = lattice.at_level(level).collect();
            for (i, a) in rungs.iter().enumerate() {
                for b in &rungs[i + 1..] {
                    prop_assert!(a.left().abs_diff(b.left()) >= 2);
                }
            }
        }
    }

    #[test]
    fn fallback_ladders_still_trace_to_permutations(dims in dims_strategy(), seed in any::<u32>()) {
        let mut rng = Rng::new(seed);
        let lattice = generate_fallback(dims, &mut rng);
        prop_assert!(is_valid(dims.player_count, &lattice, dims.height));
    }

    #[test]
    fn path_ends_agree_with_trace(dims in dims_strategy(), seed in any::<u32>()) {
        let mut rng = Rng::new(seed);
        let lattice = generate(dims, &mut rng);
        for lane in 0..dims.player_count {
            let path = trace_path(lane, &lattice, dims.height);
            prop_assert_eq!(path.len(), dims.height + 1);
            prop_assert_eq!(path.start_lane(), lane);
            prop_assert_eq!(path.final_lane(), trace_final(lane, &lattice, dims.height));
            prop_assert_eq!(trace_final(lane, &lattice, dims.height), trace_final(lane, &lattice, dims.height));
        }
    }

    #[test]
    fn path_moves_at_most_one_lane_per_level(dims in dims_strategy(), seed in any::<u32>()) {
        let mut rng = Rng::new(seed);
        let lattice = generate(dims, &mut rng);
        for lane in 0..dims.player_count {
            let path = trace_path(lane, &lattice, dims.height);
            for pair in path.as_slice().windows(2) {
                prop_assert!(pair[0].abs_diff(pair[1]) <= 1);
            }
        }
    }

    #[test]
    fn empty_ladder_is_identity(dims in dims_strategy()) {
        let lattice = Lattice::new();
        for lane in 0..dims.player_count {
            prop_assert_eq!(trace_final(lane, &lattice, dims.height), lane);
        }
        prop_assert!(is_valid(dims.player_count, &lattice, dims.height));
    }
}

#[test]
fn two_players_one_rung_swap() {
    let lattice = Lattice::from_rungs(vec![Rung::new(0, 1)]);
    assert_eq!(trace_final(0, &lattice, 2), 1);
    assert_eq!(trace_final(1, &lattice, 2), 0);
    assert!(is_valid(2, &lattice, 2));
}

#[test]
fn repeated_rung_swaps_back() {
    let lattice = Lattice::from_rungs(vec![Rung::new(0, 1), Rung::new(0, 2)]);
    for lane in 0..4 {
        assert_eq!(trace_final(lane, &lattice, 3), lane);
    }
    assert_eq!(trace_path(0, &lattice, 3).as_slice(), &[0, 1, 0, 0]);
}
