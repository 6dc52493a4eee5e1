//! Per-actor progress tracking and the pursuer's power-up effect.

use std::time::Duration;

/// Consecutive decision ticks without positional progress for one actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StuckCounter {
    stalled_for: u32,
}

impl StuckCounter {
    /// Records a tick in which the actor did not move and returns the new count.
    pub fn record_stall(&mut self) -> u32 {
        self.stalled_for = self.stalled_for.saturating_add(1);
        self.stalled_for
    }

    /// Records positional progress, clearing the count.
    pub fn reset(&mut self) {
        self.stalled_for = 0;
    }

    /// Current number of consecutive stalled ticks.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.stalled_for
    }

    /// Reports whether the count reached the provided threshold.
    #[must_use]
    pub const fn has_reached(&self, threshold: u32) -> bool {
        self.stalled_for >= threshold
    }
}

/// Temporary speed boost granted by collecting a power-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerUpEffect {
    remaining: Option<Duration>,
}

impl PowerUpEffect {
    /// Starts, or restarts, the effect for the provided duration.
    pub fn activate(&mut self, duration: Duration) {
        self.remaining = Some(duration);
    }

    /// Counts the effect down by one frame. Returns `true` when it expired
    /// during this frame.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        let left = remaining.saturating_sub(dt);
        if left.is_zero() {
            self.remaining = None;
            true
        } else {
            self.remaining = Some(left);
            false
        }
    }

    /// Ends the effect immediately.
    pub fn clear(&mut self) {
        self.remaining = None;
    }

    /// Reports whether the effect is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Time left before the effect expires.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        self.remaining
    }
}
