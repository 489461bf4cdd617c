//! Dinosaur ladder game (amidakuji) core and server glue.
//!
//! The [`ladder`] module builds random ladders whose traced paths form a
//! permutation of the lanes; [`session`] drives one round of the game as a
//! tick-advanced state machine on top of it.

pub mod constants;
pub mod error;
pub mod ladder;
pub mod rng;
pub mod roster;
pub mod server_protocol;
pub mod server_utils;
pub mod session;
pub mod types;

pub use error::{LadderError, SessionError};
pub use ladder::{
    generate_random_ladder, generate_valid_ladder, is_valid, trace_final, trace_path,
};
pub use session::{AnimationTiming, GameSession};
pub use types::{GeneratedLadder, LadderDimensions, LanePath, Lattice, LatticeOrigin, Rung};
