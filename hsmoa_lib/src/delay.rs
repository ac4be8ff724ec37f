//! Randomized settle delay between page load and the API call.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

pub const DEFAULT_MIN_MS: u64 = 3000;
pub const DEFAULT_MAX_MS: u64 = 5000;

/// Uniformly random pause in `[min_ms, max_ms]` milliseconds.
pub struct SettleDelay {
    min_ms: u64,
    max_ms: u64,
    rng: Box<dyn RngCore + Send>,
}

impl SettleDelay {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Uses `rng` as the randomness source, e.g. a seeded `StdRng` in tests.
    pub fn with_rng<R: RngCore + Send + 'static>(rng: R) -> Self {
        Self {
            min_ms: DEFAULT_MIN_MS,
            max_ms: DEFAULT_MAX_MS,
            rng: Box::new(rng),
        }
    }

    /// Overrides the bounds. Swapped bounds are reordered.
    pub fn with_bounds(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_ms = min_ms.min(max_ms);
        self.max_ms = min_ms.max(max_ms);
        self
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self::new().with_bounds(0, 0)
    }

    pub fn next_duration(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }

    pub async fn wait(&mut self) {
        let pause = self.next_duration();
        tracing::debug!("Settling for {} ms", pause.as_millis());
        tokio::time::sleep(pause).await;
    }
}

impl Default for SettleDelay {
    fn default() -> Self {
        Self::new()
    }
}
