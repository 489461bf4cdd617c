use rand::Rng as _;

/// Source of uniform floats in `[0, 1)` consumed by ladder generation.
///
/// Everything else (indices, coin flips, shuffles) is derived from
/// `next_f32`, so a scripted source fully determines the generated lattice.
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;

    fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.pick_index(i + 1);
            items.swap(i, j);
        }
    }
}

/// Seeded mulberry32 generator. Used by the simulator and tests that need
/// reproducible ladders.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl RandomSource for Rng {
    fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        // f64 -> f32 can round up to exactly 1.0
        ((out as f64 / 4_294_967_296.0) as f32).min(ONE_MINUS_EPSILON)
    }
}

/// Thread-local OS-seeded generator; every ladder is independently random.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f32(&mut self) -> f32 {
        rand::rng().random::<f32>()
    }
}

/// Replays a fixed list of values, wrapping around at the end.
#[derive(Clone, Debug)]
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Number of values drawn so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next_f32(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, ONE_MINUS_EPSILON)
    }
}

const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON;
