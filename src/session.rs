use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::constants::{PRE_ROLL_MS, STEP_MS};
use crate::error::SessionError;
use crate::ladder::{generate_valid_ladder, trace_paths};
use crate::rng::RandomSource;
use crate::roster::{build_roster, resize_roster, sanitize_name};
use crate::types::{
    GeneratedLadder, LadderDimensions, LanePath, PlayerView, RoundResult, RoundSummary,
    SessionEvent, SessionPhase, SessionState,
};

/// Pacing for the step-by-step reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTiming {
    pub pre_roll_ms: u64,
    pub step_ms: u64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            pre_roll_ms: PRE_ROLL_MS,
            step_ms: STEP_MS,
        }
    }
}

/// One round of the ladder game, advanced by [`GameSession::step`].
///
/// Phases run `Idle -> Generating -> Ready -> Animating { step } -> Finished`.
/// Paths are computed once when the round starts; each step only reads them.
#[derive(Clone, Debug)]
pub struct GameSession {
    dims: LadderDimensions,
    timing: AnimationTiming,
    players: Vec<PlayerView>,
    phase: SessionPhase,
    ladder: Option<GeneratedLadder>,
    paths: Vec<LanePath>,
    summary: Option<RoundSummary>,
    clock_ms: u64,
    next_step: usize,
}

impl GameSession {
    pub fn new(dims: LadderDimensions) -> Self {
        Self::with_timing(dims, AnimationTiming::default())
    }

    pub fn with_timing(dims: LadderDimensions, timing: AnimationTiming) -> Self {
        Self {
            dims,
            timing,
            players: build_roster(dims.player_count),
            phase: SessionPhase::Idle,
            ladder: None,
            paths: Vec::new(),
            summary: None,
            clock_ms: 0,
            next_step: 0,
        }
    }

    pub fn dimensions(&self) -> LadderDimensions {
        self.dims
    }

    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn players(&self) -> &[PlayerView] {
        &self.players
    }

    pub fn ladder(&self) -> Option<&GeneratedLadder> {
        self.ladder.as_ref()
    }

    pub fn paths(&self) -> &[LanePath] {
        &self.paths
    }

    pub fn summary(&self) -> Option<&RoundSummary> {
        self.summary.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, SessionPhase::Animating { .. })
    }

    /// Lane of every player at the current point of the round.
    pub fn current_lanes(&self) -> Vec<usize> {
        match self.phase {
            SessionPhase::Animating { step } => self.lanes_at(step),
            SessionPhase::Finished => self.paths.iter().map(LanePath::final_lane).collect(),
            _ => (0..self.dims.player_count).collect(),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            dimensions: self.dims,
            players: self.players.clone(),
            rungs: self.ladder.as_ref().map(|ladder| ladder.rungs.clone()),
            origin: self.ladder.as_ref().map(|ladder| ladder.origin),
            lanes: self.current_lanes(),
            summary: self.summary.clone(),
        }
    }

    /// Changes lane count or height. Drops the current ladder.
    pub fn configure(&mut self, dims: LadderDimensions) -> Result<(), SessionError> {
        self.ensure_not_animating("configure")?;
        if dims.player_count != self.dims.player_count {
            self.players = resize_roster(&self.players, dims.player_count);
        }
        self.dims = dims;
        self.clear_round();
        self.phase = SessionPhase::Idle;
        info!(
            players = dims.player_count,
            height = dims.height,
            "session configured"
        );
        Ok(())
    }

    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        self.ensure_not_animating("generate")?;
        self.clear_round();
        self.phase = SessionPhase::Generating;
        Ok(())
    }

    pub fn complete_generation(
        &mut self,
        ladder: GeneratedLadder,
    ) -> Result<&GeneratedLadder, SessionError> {
        if self.phase != SessionPhase::Generating {
            return Err(self.invalid_phase("accept a ladder"));
        }
        if ladder.dimensions != self.dims {
            return Err(SessionError::DimensionMismatch {
                got_players: ladder.dimensions.player_count,
                got_height: ladder.dimensions.height,
                want_players: self.dims.player_count,
                want_height: self.dims.height,
            });
        }
        info!(
            rungs = ladder.rungs.len(),
            fallback = ladder.origin.is_fallback(),
            "ladder ready"
        );
        self.phase = SessionPhase::Ready;
        Ok(&*self.ladder.insert(ladder))
    }

    pub fn regenerate<R: RandomSource>(
        &mut self,
        rng: &mut R,
    ) -> Result<&GeneratedLadder, SessionError> {
        self.begin_generation()?;
        let ladder = generate_valid_ladder(self.dims, rng);
        self.complete_generation(ladder)
    }

    /// Traces every lane and starts the reveal clock.
    pub fn start(&mut self) -> Result<SessionEvent, SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(self.invalid_phase("start"));
        }
        let Some(ladder) = self.ladder.as_ref() else {
            return Err(self.invalid_phase("start"));
        };
        self.paths = trace_paths(self.dims, &ladder.rungs);
        self.clock_ms = 0;
        self.next_step = 0;
        self.phase = SessionPhase::Animating { step: 0 };
        info!(players = self.dims.player_count, "round started");
        Ok(SessionEvent::Started {
            paths: self.paths.clone(),
        })
    }

    /// Advances the reveal clock by `dt_ms` and returns what became due.
    ///
    /// Step `k` is due at `pre_roll_ms + k * step_ms` for `k` in `0..=height`;
    /// the round finishes one step after the last level.
    pub fn step(&mut self, dt_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.is_animating() {
            return events;
        }
        self.clock_ms += dt_ms;

        loop {
            let due_ms = self.timing.pre_roll_ms + self.timing.step_ms * self.next_step as u64;
            if self.clock_ms < due_ms {
                break;
            }
            if self.next_step <= self.dims.height {
                let step = self.next_step;
                self.phase = SessionPhase::Animating { step };
                self.next_step += 1;
                events.push(SessionEvent::Step {
                    step,
                    lanes: self.lanes_at(step),
                });
            } else {
                if let Some(summary) = self.build_summary() {
                    self.summary = Some(summary.clone());
                    info!(players = self.dims.player_count, "round finished");
                    events.push(SessionEvent::Finished { summary });
                }
                self.phase = SessionPhase::Finished;
                break;
            }
        }
        events
    }

    /// Back to `Idle`, keeping dimensions and player names.
    pub fn reset(&mut self) {
        self.clear_round();
        self.phase = SessionPhase::Idle;
    }

    pub fn rename(&mut self, player_id: &str, name: &str) -> Result<(), SessionError> {
        self.ensure_not_animating("rename")?;
        let player = self
            .players
            .iter_mut()
            .find(|player| player.id == player_id)
            .ok_or_else(|| SessionError::UnknownPlayer(player_id.to_string()))?;
        player.name = sanitize_name(name, &player.name);
        Ok(())
    }

    fn lanes_at(&self, step: usize) -> Vec<usize> {
        self.paths
            .iter()
            .map(|path| path.lane_at(step).unwrap_or_else(|| path.final_lane()))
            .collect()
    }

    fn build_summary(&self) -> Option<RoundSummary> {
        let origin = self.ladder.as_ref()?.origin;
        let results = self
            .players
            .iter()
            .zip(&self.paths)
            .map(|(player, path)| RoundResult {
                player_id: player.id.clone(),
                name: player.name.clone(),
                dinosaur: player.dinosaur,
                start_lane: path.start_lane(),
                final_lane: path.final_lane(),
            })
            .collect();
        Some(RoundSummary {
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            origin,
            results,
        })
    }

    fn clear_round(&mut self) {
        self.ladder = None;
        self.paths.clear();
        self.summary = None;
        self.clock_ms = 0;
        self.next_step = 0;
    }

    fn ensure_not_animating(&self, action: &'static str) -> Result<(), SessionError> {
        if self.is_animating() {
            return Err(self.invalid_phase(action));
        }
        Ok(())
    }

    fn invalid_phase(&self, action: &'static str) -> SessionError {
        SessionError::InvalidPhase {
            action,
            phase: self.phase.label(),
        }
    }
}
