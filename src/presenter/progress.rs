//! Synthetic progress indicator
//!
//! Purely cosmetic: advances on a fixed tick toward 100% over a fixed
//! duration, regardless of how far the real request has got.

use std::time::Duration;

pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct ProgressClock {
    duration: Duration,
    tick: Duration,
}

impl ProgressClock {
    pub fn new(duration: Duration) -> Self {
        Self::with_tick(duration, DEFAULT_TICK)
    }

    pub fn with_tick(duration: Duration, tick: Duration) -> Self {
        Self {
            duration,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Percentage shown after `elapsed` of loading, whole ticks only
    pub fn percent_after(&self, elapsed: Duration) -> u8 {
        let tick_ms = self.tick.as_millis();
        let total_ticks = (self.duration.as_millis() / tick_ms).max(1);
        let ticks = elapsed.as_millis() / tick_ms;

        (ticks * 100 / total_ticks).min(100) as u8
    }
}
