use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::Mutex;

const OTP_RANGE: RangeInclusive<u32> = 1000..=9999;

/// Source of 4-digit one-time codes. The generator is injected into the
/// registration workflow so tests can seed it.
pub struct OtpGenerator {
    rng: Mutex<StdRng>,
}

impl OtpGenerator {
    pub fn from_os_rng() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng: Mutex::new(rng) }
    }

    /// Uniform draw over 1000..=9999, rendered as a decimal string.
    pub fn generate(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(OTP_RANGE).to_string()
    }
}

impl Default for OtpGenerator {
    fn default() -> Self {
        Self::from_os_rng()
    }
}
