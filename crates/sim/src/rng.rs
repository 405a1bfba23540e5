use crate::fixed::Fixed;

/// Simulation-local deterministic generator (32-bit xorshift). Every draw in
/// a session comes from this one stream, so two runs fed the same command
/// stream see the same numbers in the same order. The draw counter is part
/// of the state digest; a desynced peer shows up as a counter mismatch long
/// before positions drift far enough to eyeball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRng {
    state: u32,
    draws: u64,
}

impl SimRng {
    pub fn new(seed: u32) -> SimRng {
        SimRng {
            // Xorshift has a single absorbing zero state; remap it.
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
            draws: 0,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.draws = self.draws.saturating_add(1);
        x
    }

    /// Uniform draw in `0..bound` via widening multiply (no modulo bias
    /// worth caring about at game scale, and no data-dependent loop).
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        ((self.next_u32() as u64 * bound as u64) >> 32) as u32
    }

    /// Signed draw in `-spread..=spread`.
    pub fn spread(&mut self, spread: u32) -> i32 {
        let width = spread.saturating_mul(2).saturating_add(1);
        self.below(width) as i32 - spread as i32
    }

    /// Fixed-point draw in `[0, 1)`.
    pub fn unit_fixed(&mut self) -> Fixed {
        Fixed::from_raw((self.next_u32() >> 16) as i32)
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}
