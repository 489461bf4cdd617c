use serde::{Deserialize, Serialize};

use crate::error::{LadderError, Result};

/// Lane count and height for one ladder. Changing either means regenerating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LadderDimensions {
    #[serde(rename = "playerCount")]
    pub player_count: usize,
    pub height: usize,
}

impl LadderDimensions {
    pub fn new(player_count: usize, height: usize) -> Result<Self> {
        if player_count < 2 {
            return Err(LadderError::TooFewPlayers(player_count));
        }
        if height == 0 {
            return Err(LadderError::ZeroHeight);
        }
        Ok(Self {
            player_count,
            height,
        })
    }

    /// Number of positions a rung can take on one level (`left` in `0..positions`).
    pub fn rung_positions(&self) -> usize {
        self.player_count - 1
    }

    /// Levels that may hold rungs: `1..height`.
    pub fn rung_levels(&self) -> std::ops::Range<usize> {
        1..self.height
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct RungWire {
    left: usize,
    right: usize,
    level: usize,
}

/// Horizontal connector between lanes `left` and `left + 1` at `level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RungWire")]
pub struct Rung {
    left: usize,
    right: usize,
    level: usize,
}

impl Rung {
    pub fn new(left: usize, level: usize) -> Self {
        debug_assert!(level >= 1, "rungs start at level 1");
        Self {
            left,
            right: left + 1,
            level,
        }
    }

    pub fn try_new(left: usize, right: usize, level: usize) -> Result<Self> {
        if right != left + 1 {
            return Err(LadderError::NonAdjacentRung { left, right });
        }
        if level == 0 {
            return Err(LadderError::RungAtStartLevel);
        }
        Ok(Self { left, right, level })
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn touches(&self, lane: usize) -> bool {
        self.left == lane || self.right == lane
    }

    /// Lane on the opposite end from `lane`. Only meaningful when `touches(lane)`.
    pub fn other_end(&self, lane: usize) -> usize {
        if self.left == lane {
            self.right
        } else {
            self.left
        }
    }
}

impl TryFrom<RungWire> for Rung {
    type Error = LadderError;

    fn try_from(wire: RungWire) -> Result<Self> {
        Self::try_new(wire.left, wire.right, wire.level)
    }
}

/// All rungs of one ladder, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lattice {
    rungs: Vec<Rung>,
}

impl Lattice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rungs(rungs: Vec<Rung>) -> Self {
        Self { rungs }
    }

    pub fn push(&mut self, rung: Rung) {
        self.rungs.push(rung);
    }

    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    pub fn at_level(&self, level: usize) -> impl Iterator<Item = &Rung> + '_ {
        self.rungs.iter().filter(move |rung| rung.level == level)
    }

    /// First rung at `level` with `lane` as an endpoint.
    pub fn rung_touching(&self, level: usize, lane: usize) -> Option<&Rung> {
        self.at_level(level).find(|rung| rung.touches(lane))
    }
}

/// Lane occupied at each level `0..=height` for one starting lane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LanePath {
    lanes: Vec<usize>,
}

impl LanePath {
    pub(crate) fn from_lanes(lanes: Vec<usize>) -> Self {
        debug_assert!(!lanes.is_empty());
        Self { lanes }
    }

    pub fn start_lane(&self) -> usize {
        self.lanes[0]
    }

    pub fn final_lane(&self) -> usize {
        self.lanes[self.lanes.len() - 1]
    }

    pub fn lane_at(&self, level: usize) -> Option<usize> {
        self.lanes.get(level).copied()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.lanes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatticeOrigin {
    /// Accepted by the validator on attempt `attempts` of the primary generator.
    Primary { attempts: usize },
    /// Primary attempts exhausted; `verified` is the validator's verdict on the fallback.
    Fallback { attempts: usize, verified: bool },
}

impl LatticeOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// False only for an unverified fallback lattice.
    pub fn is_verified(&self) -> bool {
        match self {
            Self::Primary { .. } => true,
            Self::Fallback { verified, .. } => *verified,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedLadder {
    pub dimensions: LadderDimensions,
    pub rungs: Lattice,
    pub origin: LatticeOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DinosaurKind {
    TRex,
    Triceratops,
    Stegosaurus,
    Velociraptor,
    Brontosaurus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub lane: usize,
    pub dinosaur: DinosaurKind,
    pub emoji: &'static str,
    #[serde(rename = "hueDeg")]
    pub hue_deg: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Generating,
    Ready,
    Animating { step: usize },
    Finished,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub dinosaur: DinosaurKind,
    #[serde(rename = "startLane")]
    pub start_lane: usize,
    #[serde(rename = "finalLane")]
    pub final_lane: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    #[serde(rename = "finishedAt")]
    pub finished_at: String,
    pub origin: LatticeOrigin,
    pub results: Vec<RoundResult>,
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Animating { .. } => "animating",
            Self::Finished => "finished",
        }
    }
}

/// Everything a client needs to redraw a session from scratch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionState {
    #[serde(flatten)]
    pub phase: SessionPhase,
    pub dimensions: LadderDimensions,
    pub players: Vec<PlayerView>,
    pub rungs: Option<Lattice>,
    pub origin: Option<LatticeOrigin>,
    pub lanes: Vec<usize>,
    pub summary: Option<RoundSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        paths: Vec<LanePath>,
    },
    Step {
        step: usize,
        lanes: Vec<usize>,
    },
    Finished {
        summary: RoundSummary,
    },
}
