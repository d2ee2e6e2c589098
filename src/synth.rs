use crate::head::config::HeadConfig;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded synthetic inputs for demos and benches.
pub struct Synth {
    rng: SmallRng,
}

impl Synth {
    pub fn new(seed: u64) -> Self { Self { rng: SmallRng::seed_from_u64(seed) } }

    /// `n` features uniformly drawn from the full int16 range.
    pub fn features(&mut self, n: usize) -> Vec<i16> {
        (0..n).map(|_| self.rng.gen::<i16>()).collect()
    }

    /// Weight table for `cfg` with weights in `[-limit, limit]` and biases
    /// drawn from the full int16 range.
    pub fn weights(&mut self, cfg: &HeadConfig, limit: i16) -> Vec<i16> {
        let limit = limit.max(0);
        let mut out = Vec::with_capacity(cfg.weight_len());
        for _ in 0..cfg.out_ch {
            out.push(self.rng.gen::<i16>());
            for _ in 0..cfg.in_ch { out.push(self.rng.gen_range(-limit..=limit)); }
        }
        out
    }
}
