use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LadderError {
    #[error("a ladder needs at least 2 players, got {0}")]
    TooFewPlayers(usize),

    #[error("ladder height must be at least 1")]
    ZeroHeight,

    #[error("rung must join adjacent lanes, got {left} and {right}")]
    NonAdjacentRung { left: usize, right: usize },

    #[error("rungs cannot sit on the start level")]
    RungAtStartLevel,
}

pub type Result<T> = std::result::Result<T, LadderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("ladder was generated for {got_players} players x {got_height} levels, session expects {want_players} x {want_height}")]
    DimensionMismatch {
        got_players: usize,
        got_height: usize,
        want_players: usize,
        want_height: usize,
    },
}
