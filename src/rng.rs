/// Seeded mulberry32 stream. Equal seeds replay identical autopilot runs.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// Uniform in `[0, scale)`, used to break ties between equally scored moves.
    pub fn jitter(&mut self, scale: f32) -> f32 {
        self.next_f32() * scale
    }

    /// Index in `0..len`. Returns 0 for empty or single-element ranges.
    pub fn index_below(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_u32() as u64 * len as u64) >> 32) as usize
    }
}
