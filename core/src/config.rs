//! Ruleset configuration unifying the classic and the timed game variants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Difficulty;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Behaviour family of the evader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaderPolicyKind {
    /// Roams toward random cells and flees along a best-first path when the
    /// pursuer comes close.
    #[default]
    CloseRange,
    /// Steps to the neighbour that maximises distance from the pursuer.
    Avoid,
}

/// Probability weights for a single difficulty.
///
/// `random`, `purposeful` and `stay` form the cumulative table that one draw
/// selects from and must sum to one. `purposeful` means roaming for
/// [`EvaderPolicyKind::CloseRange`] and avoiding for [`EvaderPolicyKind::Avoid`].
/// `close_range` is the probability of fleeing along a path when the pursuer
/// is near; it is ignored by the avoid policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaderWeights {
    /// Weight of stepping to a uniformly random passable neighbour.
    pub random: f64,
    /// Weight of the policy's purposeful action.
    pub purposeful: f64,
    /// Weight of staying in place.
    pub stay: f64,
    /// Probability of the close-range flight override.
    #[serde(default)]
    pub close_range: f64,
}

impl EvaderWeights {
    /// Creates a weight set.
    #[must_use]
    pub const fn new(random: f64, purposeful: f64, stay: f64, close_range: f64) -> Self {
        Self {
            random,
            purposeful,
            stay,
            close_range,
        }
    }

    fn validate(&self, difficulty: Difficulty) -> Result<(), ConfigError> {
        let weights = [self.random, self.purposeful, self.stay];
        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(ConfigError::NegativeWeight { difficulty });
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { difficulty, sum });
        }
        check_probability("close_range", self.close_range)
    }
}

/// Evader weights for each difficulty preset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DifficultyWeights {
    /// Weights used on easy difficulty.
    pub easy: EvaderWeights,
    /// Weights used on medium difficulty.
    pub medium: EvaderWeights,
    /// Weights used on hard difficulty.
    pub hard: EvaderWeights,
}

impl DifficultyWeights {
    /// Weights of the close-range policy.
    #[must_use]
    pub const fn close_range() -> Self {
        Self {
            easy: EvaderWeights::new(0.7, 0.2, 0.1, 0.2),
            medium: EvaderWeights::new(0.4, 0.5, 0.1, 0.7),
            hard: EvaderWeights::new(0.1, 0.8, 0.1, 0.9),
        }
    }

    /// Weights of the avoid policy.
    #[must_use]
    pub const fn avoid() -> Self {
        Self {
            easy: EvaderWeights::new(0.6, 0.3, 0.1, 0.0),
            medium: EvaderWeights::new(0.35, 0.55, 0.1, 0.0),
            hard: EvaderWeights::new(0.15, 0.75, 0.1, 0.0),
        }
    }

    /// Weights for the provided difficulty.
    #[must_use]
    pub const fn for_difficulty(&self, difficulty: Difficulty) -> &EvaderWeights {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self::close_range()
    }
}

/// Numeric constants of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Number of cells along each side of the grid.
    pub grid_size: u32,
    /// Probability that a non-corner cell is generated as a wall.
    pub wall_probability: f64,
    /// Number of random layouts tried before falling back to an open grid.
    pub generation_attempts: u32,
    /// Number of power-ups placed on every generated grid.
    pub power_up_count: u32,
    /// Consecutive stalled decision ticks that trigger a regeneration.
    pub stuck_threshold: u32,
    /// Baseline decision interval in milliseconds.
    pub move_interval_ms: u64,
    /// Decision interval while a power-up is active, in milliseconds.
    pub boosted_move_interval_ms: u64,
    /// Duration of the power-up effect in milliseconds.
    pub power_up_duration_ms: u64,
    /// Duration of the invalid-move flash in milliseconds.
    pub invalid_move_flash_ms: u64,
    /// Delay before a finished round returns to the menu, in milliseconds.
    pub outcome_display_ms: u64,
    /// Manhattan distance at or below which the close-range override applies.
    pub close_range_distance: u32,
}

impl Tuning {
    /// Baseline decision interval.
    #[must_use]
    pub const fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }

    /// Decision interval while a power-up is active.
    #[must_use]
    pub const fn boosted_move_interval(&self) -> Duration {
        Duration::from_millis(self.boosted_move_interval_ms)
    }

    /// Duration of the power-up effect.
    #[must_use]
    pub const fn power_up_duration(&self) -> Duration {
        Duration::from_millis(self.power_up_duration_ms)
    }

    /// Duration of the invalid-move flash.
    #[must_use]
    pub const fn invalid_move_flash(&self) -> Duration {
        Duration::from_millis(self.invalid_move_flash_ms)
    }

    /// Delay before a finished round returns to the menu.
    #[must_use]
    pub const fn outcome_display(&self) -> Duration {
        Duration::from_millis(self.outcome_display_ms)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grid_size: 20,
            wall_probability: 0.3,
            generation_attempts: 10,
            power_up_count: 3,
            stuck_threshold: 10,
            move_interval_ms: 500,
            boosted_move_interval_ms: 250,
            power_up_duration_ms: 10_000,
            invalid_move_flash_ms: 200,
            outcome_display_ms: 3_000,
            close_range_distance: 5,
        }
    }
}

/// Rules selected at round start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesetConfig {
    /// Round duration after which an uncaptured evader wins, in seconds.
    pub time_limit_secs: Option<u64>,
    /// Behaviour family of the evader.
    pub evader_policy: EvaderPolicyKind,
    /// Whether a paused round may be abandoned for the menu.
    pub pause_menu_enabled: bool,
    /// Whether a finished round may be restarted directly.
    pub retry_enabled: bool,
    /// Evader weights per difficulty.
    pub evader_weights: DifficultyWeights,
    /// Numeric constants.
    pub tuning: Tuning,
}

impl RulesetConfig {
    /// Untimed rules with the close-range evader and a pause menu.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            time_limit_secs: None,
            evader_policy: EvaderPolicyKind::CloseRange,
            pause_menu_enabled: true,
            retry_enabled: false,
            evader_weights: DifficultyWeights::close_range(),
            tuning: Tuning::default(),
        }
    }

    /// Sixty-second rounds with the avoiding evader and retries.
    #[must_use]
    pub fn timed() -> Self {
        Self {
            time_limit_secs: Some(60),
            evader_policy: EvaderPolicyKind::Avoid,
            pause_menu_enabled: false,
            retry_enabled: true,
            evader_weights: DifficultyWeights::avoid(),
            tuning: Tuning::default(),
        }
    }

    /// Round time limit, if the rules have one.
    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs)
    }

    /// Checks that every value lies within its meaningful range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tuning = &self.tuning;
        if tuning.grid_size < 2 {
            return Err(ConfigError::GridTooSmall {
                size: tuning.grid_size,
            });
        }
        check_probability("wall_probability", tuning.wall_probability)?;
        if tuning.generation_attempts == 0 {
            return Err(ConfigError::ZeroValue {
                name: "generation_attempts",
            });
        }
        if tuning.stuck_threshold == 0 {
            return Err(ConfigError::ZeroValue {
                name: "stuck_threshold",
            });
        }
        if tuning.move_interval_ms == 0 {
            return Err(ConfigError::ZeroValue {
                name: "move_interval_ms",
            });
        }
        if tuning.boosted_move_interval_ms == 0 {
            return Err(ConfigError::ZeroValue {
                name: "boosted_move_interval_ms",
            });
        }
        if self.time_limit_secs == Some(0) {
            return Err(ConfigError::ZeroValue {
                name: "time_limit_secs",
            });
        }
        for difficulty in Difficulty::ALL {
            self.evader_weights
                .for_difficulty(difficulty)
                .validate(difficulty)?;
        }
        Ok(())
    }
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self::classic()
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

/// Reasons a ruleset fails validation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The grid cannot hold two distinct corners.
    #[error("grid size {size} is too small; at least 2 is required")]
    GridTooSmall {
        /// Configured grid size.
        size: u32,
    },
    /// A probability lies outside `0.0..=1.0`.
    #[error("{name} must lie within 0..=1 (received {value})")]
    ProbabilityOutOfRange {
        /// Name of the offending setting.
        name: &'static str,
        /// Configured value.
        value: f64,
    },
    /// A setting that must be positive is zero.
    #[error("{name} must be positive")]
    ZeroValue {
        /// Name of the offending setting.
        name: &'static str,
    },
    /// An evader weight is negative or not finite.
    #[error("evader weights for {difficulty:?} must be finite and non-negative")]
    NegativeWeight {
        /// Difficulty whose weights are invalid.
        difficulty: Difficulty,
    },
    /// The action weights of a difficulty do not sum to one.
    #[error("evader weights for {difficulty:?} sum to {sum}, expected 1")]
    WeightsDoNotSumToOne {
        /// Difficulty whose weights are invalid.
        difficulty: Difficulty,
        /// Actual sum of the weights.
        sum: f64,
    },
}
