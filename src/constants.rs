pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAX_GENERATION_ATTEMPTS: usize = 100;
pub const FALLBACK_RUNG_PROBABILITY: f32 = 0.5;

pub const SUPPORTED_PLAYER_COUNTS: [usize; 4] = [2, 3, 4, 5];
pub const SUPPORTED_HEIGHTS: [usize; 4] = [8, 10, 12, 15];
pub const DEFAULT_PLAYER_COUNT: usize = 4;
pub const DEFAULT_HEIGHT: usize = 10;

pub const PRE_ROLL_MS: u64 = 300;
pub const STEP_MS: u64 = 800;

pub const MAX_NAME_CHARS: usize = 16;

/// Wall-clock length of a full round, pre-roll included.
pub fn round_duration_ms(height: usize, pre_roll_ms: u64, step_ms: u64) -> u64 {
    pre_roll_ms + step_ms * (height as u64 + 1)
}
