//! Ladder (amidakuji) generation, tracing and validation.
//!
//! [`generate_valid_ladder`] is the entry point: it draws candidates from the
//! primary generator until one traces to a permutation, and after
//! [`MAX_GENERATION_ATTEMPTS`] rejected candidates falls back to a single
//! simplified ladder whose verdict is reported in [`LatticeOrigin`].

use tracing::{debug, warn};

use crate::constants::MAX_GENERATION_ATTEMPTS;
use crate::rng::{RandomSource, ThreadRandom};
use crate::types::{GeneratedLadder, LadderDimensions, Lattice, LatticeOrigin};

mod generator;
mod tracer;
mod validator;

pub use self::generator::{generate, generate_fallback};
pub use self::tracer::{trace_all, trace_final, trace_path, trace_paths};
pub use self::validator::is_valid;

pub fn generate_valid_ladder<R: RandomSource>(
    dims: LadderDimensions,
    rng: &mut R,
) -> GeneratedLadder {
    generate_with_retries(dims, rng, MAX_GENERATION_ATTEMPTS, generate)
}

/// [`generate_valid_ladder`] with a fresh thread-local random source.
pub fn generate_random_ladder(dims: LadderDimensions) -> GeneratedLadder {
    generate_valid_ladder(dims, &mut ThreadRandom)
}

fn generate_with_retries<R, F>(
    dims: LadderDimensions,
    rng: &mut R,
    max_attempts: usize,
    mut candidate: F,
) -> GeneratedLadder
where
    R: RandomSource,
    F: FnMut(LadderDimensions, &mut R) -> Lattice,
{
    for attempt in 1..=max_attempts {
        let lattice = candidate(dims, rng);
        if is_valid(dims.player_count, &lattice, dims.height) {
            return GeneratedLadder {
                dimensions: dims,
                rungs: lattice,
                origin: LatticeOrigin::Primary { attempts: attempt },
            };
        }
        debug!(
            attempt,
            players = dims.player_count,
            height = dims.height,
            "rejected ladder candidate"
        );
    }

    let lattice = generate_fallback(dims, rng);
    let verified = is_valid(dims.player_count, &lattice, dims.height);
    if verified {
        warn!(
            attempts = max_attempts,
            players = dims.player_count,
            height = dims.height,
            "generation attempts exhausted, using fallback ladder"
        );
    } else {
        warn!(
            attempts = max_attempts,
            players = dims.player_count,
            height = dims.height,
            "fallback ladder does not map players one-to-one"
        );
    }

    GeneratedLadder {
        dimensions: dims,
        rungs: lattice,
        origin: LatticeOrigin::Fallback {
            attempts: max_attempts,
            verified,
        },
    }
}
