//! Pause-aware round clock.

use std::time::Duration;

/// Elapsed round time measured against a monotonic timestamp.
///
/// Paused intervals are accumulated and subtracted from the wall time, so the
/// elapsed value never advances while the clock is paused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationClock {
    started_at: Option<Duration>,
    paused_total: Duration,
    paused_since: Option<Duration>,
}

impl SimulationClock {
    /// Restarts the clock at the provided timestamp.
    pub fn start(&mut self, now: Duration) {
        *self = Self {
            started_at: Some(now),
            ..Self::default()
        };
    }

    /// Freezes elapsed time until [`SimulationClock::resume`] is called.
    pub fn pause(&mut self, now: Duration) {
        if self.started_at.is_some() && self.paused_since.is_none() {
            self.paused_since = Some(now);
        }
    }

    /// Adds the time spent paused to the accumulated pause duration.
    pub fn resume(&mut self, now: Duration) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total = self.paused_total.saturating_add(now.saturating_sub(since));
        }
    }

    /// Reports whether the clock is currently frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Total time spent paused across completed pauses.
    #[must_use]
    pub const fn paused_total(&self) -> Duration {
        self.paused_total
    }

    /// Pause-adjusted time elapsed since the clock started.
    #[must_use]
    pub fn elapsed(&self, now: Duration) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let reference = self.paused_since.unwrap_or(now);
        reference
            .saturating_sub(started_at)
            .saturating_sub(self.paused_total)
    }
}
