use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEED_SALT: AtomicU64 = AtomicU64::new(0x9e3779b97f4a7c15);

/// Small xorshift generator for decorative randomness (icons, confetti).
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        // xorshift gets stuck on zero.
        let state = if seed == 0 { 0x2545f4914f6cdd1d } else { seed };
        Self { state }
    }

    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let salt = SEED_SALT.fetch_add(0x9e3779b97f4a7c15, Ordering::Relaxed);
        Self::new(nanos ^ salt.rotate_left(17))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn below(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}
