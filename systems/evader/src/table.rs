//! Cumulative-probability choice evaluated against a single draw.

use pursuit_core::EvaderWeights;

/// Action the evader takes when the weighted table is consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvaderAction {
    /// Step to a uniformly random passable neighbour.
    Random,
    /// Perform the policy's purposeful move: roam or avoid.
    Purposeful,
    /// Keep the current cell.
    Stay,
}

/// Ordered `(outcome, weight)` entries selected by cumulative bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedTable<T> {
    entries: Vec<(T, f64)>,
}

impl<T: Copy> WeightedTable<T> {
    /// Creates a table from entries evaluated in the provided order.
    #[must_use]
    pub fn new(entries: Vec<(T, f64)>) -> Self {
        Self { entries }
    }

    /// Selects the entry whose cumulative bucket contains `draw`.
    ///
    /// A draw at or past the total weight resolves to the last entry, which
    /// absorbs floating-point rounding in the weight sum. Returns `None` only
    /// for an empty table.
    #[must_use]
    pub fn select(&self, draw: f64) -> Option<T> {
        let mut cumulative = 0.0;
        for (outcome, weight) in &self.entries {
            cumulative += weight;
            if draw < cumulative {
                return Some(*outcome);
            }
        }
        self.entries.last().map(|(outcome, _)| *outcome)
    }
}

impl WeightedTable<EvaderAction> {
    /// Table of the three evader actions: random, purposeful, then stay.
    #[must_use]
    pub fn for_weights(weights: &EvaderWeights) -> Self {
        Self::new(vec![
            (EvaderAction::Random, weights.random),
            (EvaderAction::Purposeful, weights.purposeful),
            (EvaderAction::Stay, weights.stay),
        ])
    }
}
