use rand::{rngs::StdRng, Rng, SeedableRng};

/// RandMode controls random generator behaviour. May be predictable for testing or truly random for gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandMode {
    Predictable,
    RandomUniform,
}

/// Source for the `random` opcode
pub struct ZRand {
    rng: StdRng,
    rand_mode: RandMode,
}

impl ZRand {
    pub fn new_uniform() -> ZRand {
        ZRand {
            rng: StdRng::from_entropy(),
            rand_mode: RandMode::RandomUniform,
        }
    }

    pub fn new_predictable(seed: u64) -> ZRand {
        ZRand {
            rng: StdRng::seed_from_u64(seed),
            rand_mode: RandMode::Predictable,
        }
    }

    pub fn mode(&self) -> RandMode {
        self.rand_mode
    }

    /// Uniform value in 1..=range
    pub fn gen_range(&mut self, range: u16) -> u16 {
        self.rng.gen_range(1..=range.max(1))
    }

    /// Reseed from a fixed seed; later values are reproducible
    pub fn reseed(&mut self, seed: u64) {
        *self = ZRand::new_predictable(seed);
    }

    /// Go back to unpredictable values
    pub fn randomize(&mut self) {
        *self = ZRand::new_uniform();
    }
}
