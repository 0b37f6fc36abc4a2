//! Jittered pacing before each publish call

use rand::Rng;
use std::time::Duration;

/// Upper bound of the random delay applied before each group is published.
///
/// Spreads requests against the receiving platforms' rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    max_delay: Duration,
}

impl Pacing {
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// No delay at all (tests, local runs)
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.max_delay.as_millis() == 0
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Uniform draw from `[0, max_delay)`
    pub fn draw(&self) -> Duration {
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DELAY)
    }
}
