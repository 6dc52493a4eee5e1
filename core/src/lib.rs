#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the pursuit engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the simulation systems. Adapters translate player
//! input into [`Intent`] values, the round state machine turns accepted intents
//! into [`Command`] values, the world executes those commands via its `apply`
//! entry point, and then broadcasts [`Event`] values for systems to react to.
//! Systems query immutable views and respond exclusively with new commands.

mod config;
mod grid;
mod round;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use config::{
    ConfigError, DifficultyWeights, EvaderPolicyKind, EvaderWeights, RulesetConfig, Tuning,
};
pub use grid::{CellKind, Grid, GridLayout, GridParseError};
pub use round::{RoundState, RoundTrigger};

/// Score awarded for a capture at zero elapsed seconds.
pub const SCORE_BASE: u32 = 10_000;

/// Score deducted for every whole second that elapses before the capture.
pub const SCORE_PENALTY_PER_SECOND: u32 = 100;

/// Computes the capture score for the provided whole number of elapsed seconds.
///
/// The score decreases linearly and is clamped at zero, so
/// `score_for_elapsed_secs(150)` is `0` rather than negative.
#[must_use]
pub fn score_for_elapsed_secs(elapsed_secs: u64) -> u32 {
    let penalty = elapsed_secs.saturating_mul(u64::from(SCORE_PENALTY_PER_SECOND));
    let remaining = u64::from(SCORE_BASE).saturating_sub(penalty);
    u32::try_from(remaining).unwrap_or(0)
}

/// Computes the capture score for an elapsed duration, truncated to whole seconds.
#[must_use]
pub fn score_for_elapsed(elapsed: Duration) -> u32 {
    score_for_elapsed_secs(elapsed.as_secs())
}

/// Location of a single grid cell expressed as row and column indices.
///
/// Ordering follows row-major scan order, which is also the tie-breaking
/// order used whenever a search must pick between equally good cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: u32,
    column: u32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Returns the neighbouring position in the provided direction, if it
    /// stays within a square grid of `size` cells per side.
    #[must_use]
    pub fn step(self, direction: Direction, size: u32) -> Option<Position> {
        let (row, column) = match direction {
            Direction::North => (self.row.checked_sub(1)?, self.column),
            Direction::South => (self.row.checked_add(1)?, self.column),
            Direction::West => (self.row, self.column.checked_sub(1)?),
            Direction::East => (self.row, self.column.checked_add(1)?),
        };

        if row < size && column < size {
            Some(Position::new(row, column))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Cardinal movement directions available to both actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
    /// Movement toward increasing column indices.
    East,
}

impl Direction {
    /// Neighbour enumeration order: up, down, left, right.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];
}

/// Ordered sequence of cells leading away from a start cell.
///
/// The start cell is excluded and the goal cell is included, so the first
/// element is always the next step to take. An empty path means either that no
/// route exists or, for routing queries, that the start already is the goal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    cells: Vec<Position>,
}

impl Path {
    /// Creates a path from the provided cells.
    #[must_use]
    pub fn new(cells: Vec<Position>) -> Self {
        Self { cells }
    }

    /// Creates a path that contains no cells.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cells that compose the path, next step first.
    #[must_use]
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// The next step along the path, if any.
    #[must_use]
    pub fn first(&self) -> Option<Position> {
        self.cells.first().copied()
    }

    /// The final cell of the path, if any.
    #[must_use]
    pub fn last(&self) -> Option<Position> {
        self.cells.last().copied()
    }

    /// Number of steps contained in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consumes the path, yielding the underlying cells.
    #[must_use]
    pub fn into_vec(self) -> Vec<Position> {
        self.cells
    }
}

/// Difficulty presets that select the evader's behaviour weights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Mostly random evader.
    Easy,
    /// Balanced evader.
    #[default]
    Medium,
    /// Mostly purposeful evader.
    Hard,
}

impl Difficulty {
    /// Every difficulty in menu order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Human-readable label used by presentation layers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Control mode of the pursuer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuerMode {
    /// The pursuer follows the routing policy on every decision tick.
    #[default]
    Automatic,
    /// The pursuer only moves in response to movement intents.
    Manual,
}

impl PursuerMode {
    /// Returns the opposite mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Automatic => Self::Manual,
            Self::Manual => Self::Automatic,
        }
    }

    /// Human-readable label used by presentation layers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Automatic => "Auto",
            Self::Manual => "Manual",
        }
    }
}

/// The two actors that inhabit the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Actor {
    /// The actor seeking the capture.
    Pursuer,
    /// The fleeing actor governed by the stochastic policy.
    Evader,
}

/// Outcome of the pursuer's routing on a decision tick in automatic mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PursuerPlan {
    /// Move to the provided neighbouring cell.
    Step(Position),
    /// A route exists but no move is needed this tick.
    Hold,
    /// Routing exhausted every fallback.
    Blocked,
}

/// Reasons the pathfinding layer reports when no move is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// Every routing fallback was exhausted.
    #[error("no route from {from} toward {target}")]
    NoRoute {
        /// Cell the search started from.
        from: Position,
        /// Cell the search attempted to reach.
        target: Position,
    },
}

/// Reasons grid generation reports when validation never succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// None of the attempted layouts connected the two corners.
    #[error("no reachable layout found after {attempts} attempts")]
    UnreachableGoal {
        /// Number of layouts that were generated and rejected.
        attempts: u32,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Chooses the evader difficulty for the next round. Accepted only in the menu.
    SelectDifficulty {
        /// Difficulty that should become active.
        difficulty: Difficulty,
    },
    /// Starts a round from the menu and captures the round start timestamp.
    StartRound,
    /// Pauses a running round or resumes a paused one.
    TogglePause,
    /// Switches the pursuer between automatic and manual control.
    ToggleMode,
    /// Moves the pursuer one cell in manual mode, outside the decision cadence.
    MovePursuer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Returns to the menu and resets all per-round state using the provided layout.
    ReturnToMenu {
        /// Layout installed for the next round.
        layout: GridLayout,
    },
    /// Restarts the round directly from a finished round using the provided layout.
    RetryRound {
        /// Layout installed for the restarted round.
        layout: GridLayout,
    },
    /// Requests that the session ends.
    Quit,
    /// Advances the simulation clock by the provided frame delta.
    Tick {
        /// Duration of real time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Ends a running round as lost if the ruleset's time limit has elapsed.
    CheckTimeLimit,
    /// Applies the evader's decision for the current decision tick.
    StepEvader {
        /// Cell chosen by the evader policy; equal to the current cell to stay.
        to: Position,
    },
    /// Records the pursuer path computed for display.
    SetPursuerPath {
        /// Route from the pursuer toward the evader.
        path: Path,
    },
    /// Applies the automatic pursuer's routing outcome.
    AdvancePursuer {
        /// Outcome of the routing fallback policy.
        plan: PursuerPlan,
    },
    /// Replaces the grid and power-ups after an actor got stuck.
    RegenerateGrid {
        /// Freshly generated layout.
        layout: GridLayout,
        /// Actor whose stuck counter triggered the regeneration.
        stuck: Actor,
    },
    /// Collects a power-up under the pursuer and checks for a capture.
    ResolveEncounters,
}

impl Command {
    /// Discriminant used when reporting rejected commands.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::SelectDifficulty { .. } => CommandKind::SelectDifficulty,
            Self::StartRound => CommandKind::StartRound,
            Self::TogglePause => CommandKind::TogglePause,
            Self::ToggleMode => CommandKind::ToggleMode,
            Self::MovePursuer { .. } => CommandKind::MovePursuer,
            Self::ReturnToMenu { .. } => CommandKind::ReturnToMenu,
            Self::RetryRound { .. } => CommandKind::RetryRound,
            Self::Quit => CommandKind::Quit,
            Self::Tick { .. } => CommandKind::Tick,
            Self::CheckTimeLimit => CommandKind::CheckTimeLimit,
            Self::StepEvader { .. } => CommandKind::StepEvader,
            Self::SetPursuerPath { .. } => CommandKind::SetPursuerPath,
            Self::AdvancePursuer { .. } => CommandKind::AdvancePursuer,
            Self::RegenerateGrid { .. } => CommandKind::RegenerateGrid,
            Self::ResolveEncounters => CommandKind::ResolveEncounters,
        }
    }
}

/// Payload-free discriminant of [`Command`].
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SelectDifficulty,
    StartRound,
    TogglePause,
    ToggleMode,
    MovePursuer,
    ReturnToMenu,
    RetryRound,
    Quit,
    Tick,
    CheckTimeLimit,
    StepEvader,
    SetPursuerPath,
    AdvancePursuer,
    RegenerateGrid,
    ResolveEncounters,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the frame.
        dt: Duration,
    },
    /// Signals that enough pause-adjusted time accumulated for a decision tick.
    DecisionDue,
    /// Announces a round state transition.
    RoundStateChanged {
        /// State before the transition.
        from: RoundState,
        /// State after the transition.
        to: RoundState,
    },
    /// Confirms that a new difficulty was selected.
    DifficultyChanged {
        /// Difficulty that became active.
        difficulty: Difficulty,
    },
    /// Confirms that the pursuer's control mode changed.
    PursuerModeChanged {
        /// Mode that became active.
        mode: PursuerMode,
    },
    /// Confirms that an actor moved between two cells.
    ActorAdvanced {
        /// Actor that moved.
        actor: Actor,
        /// Cell occupied before moving.
        from: Position,
        /// Cell occupied after moving.
        to: Position,
    },
    /// Reports that an actor made no positional progress on a decision tick.
    ActorStalled {
        /// Actor that did not move.
        actor: Actor,
        /// Consecutive decision ticks without progress, including this one.
        stalled_for: u32,
    },
    /// Reports that an actor's stuck counter reached the regeneration threshold.
    StuckThresholdReached {
        /// Actor that got stuck.
        actor: Actor,
    },
    /// Confirms that the grid and power-ups were replaced.
    GridRegenerated {
        /// Actor whose stuck counter triggered the regeneration.
        stuck: Actor,
        /// Whether the installed layout was validated as corner-to-corner reachable.
        reachable: bool,
    },
    /// Confirms that all per-round state was reset.
    RoundReset {
        /// Whether the installed layout was validated as corner-to-corner reachable.
        reachable: bool,
    },
    /// Reports that a manual move targeted an impassable cell.
    ManualMoveRejected {
        /// Cell the pursuer occupied when the move was attempted.
        from: Position,
        /// Direction of the rejected move.
        direction: Direction,
    },
    /// Confirms that the pursuer collected a power-up.
    PowerUpCollected {
        /// Cell that bore the power-up.
        cell: Position,
    },
    /// Reports that the power-up effect ran out.
    PowerUpExpired,
    /// Confirms that the pursuer caught the evader.
    EvaderCaptured {
        /// Final score awarded for the round.
        score: u32,
        /// Pause-adjusted round duration at the time of capture.
        elapsed: Duration,
        /// Whether the score replaced the session best.
        new_best: bool,
    },
    /// Reports that the round's time limit elapsed before a capture.
    TimeLimitExpired,
    /// Reports that the result display delay elapsed after a finished round.
    OutcomeDisplayElapsed,
    /// Reports that a command is not legal in the current round state.
    CommandRejected {
        /// Kind of command that was rejected.
        command: CommandKind,
        /// Round state that rejected the command.
        state: RoundState,
    },
    /// Confirms that the session should end.
    QuitRequested,
}

/// Discrete requests fed back by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Choose the evader difficulty.
    SelectDifficulty(Difficulty),
    /// Start a round from the menu.
    StartRound,
    /// Pause or resume the round.
    TogglePause,
    /// Switch between automatic and manual pursuer control.
    ToggleMode,
    /// Move the pursuer in manual mode.
    MovePursuer(Direction),
    /// Leave a paused round for the menu.
    ReturnToMenu,
    /// Restart a finished round.
    RetryRound,
    /// End the session.
    Quit,
}

/// Intents gathered during a single frame.
///
/// Distinct intent kinds are independent of each other; within a kind the
/// last recorded intent wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntentFrame {
    /// Last difficulty selection of the frame.
    pub difficulty: Option<Difficulty>,
    /// Whether a round start was requested.
    pub start_round: bool,
    /// Whether a pause toggle was requested.
    pub toggle_pause: bool,
    /// Whether a mode toggle was requested.
    pub toggle_mode: bool,
    /// Last manual movement of the frame.
    pub movement: Option<Direction>,
    /// Whether a return to the menu was requested.
    pub return_to_menu: bool,
    /// Whether a retry was requested.
    pub retry_round: bool,
    /// Whether the session should end.
    pub quit: bool,
}

impl IntentFrame {
    /// Creates a frame from an ordered list of intents.
    #[must_use]
    pub fn from_intents<I>(intents: I) -> Self
    where
        I: IntoIterator<Item = Intent>,
    {
        let mut frame = Self::default();
        for intent in intents {
            frame.record(intent);
        }
        frame
    }

    /// Records a single intent, replacing any earlier intent of the same kind.
    pub fn record(&mut self, intent: Intent) {
        match intent {
            Intent::SelectDifficulty(difficulty) => self.difficulty = Some(difficulty),
            Intent::StartRound => self.start_round = true,
            Intent::TogglePause => self.toggle_pause = true,
            Intent::ToggleMode => self.toggle_mode = true,
            Intent::MovePursuer(direction) => self.movement = Some(direction),
            Intent::ReturnToMenu => self.return_to_menu = true,
            Intent::RetryRound => self.retry_round = true,
            Intent::Quit => self.quit = true,
        }
    }

    /// Reports whether the frame carries no intents at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Read-only snapshot of the world handed to presentation every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Current grid contents.
    pub grid: Grid,
    /// Cell occupied by the pursuer.
    pub pursuer: Position,
    /// Cell occupied by the evader.
    pub evader: Position,
    /// Last route computed for the pursuer.
    pub pursuer_path: Path,
    /// Manhattan distance between the two actors.
    pub distance: u32,
    /// Current round state.
    pub round: RoundState,
    /// Pause-adjusted time elapsed in the round.
    pub elapsed: Duration,
    /// Time left before the round is lost, when the ruleset has a limit.
    pub remaining: Option<Duration>,
    /// Score a capture would award right now.
    pub score: u32,
    /// Score of the most recent won round, if any.
    pub last_score: Option<u32>,
    /// Best score achieved during this session.
    pub best_score: u32,
    /// Remaining duration of the active power-up effect.
    pub power_up_remaining: Option<Duration>,
    /// Set for one frame after the grid was regenerated.
    pub grid_regenerated: bool,
    /// Set while the invalid-move flash is visible.
    pub invalid_move: bool,
    /// Current pursuer control mode.
    pub mode: PursuerMode,
    /// Current difficulty.
    pub difficulty: Difficulty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = Position::new(1, 1);
        let destination = Position::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn score_decreases_and_clamps_at_zero() {
        assert_eq!(score_for_elapsed_secs(0), 10_000);
        assert_eq!(score_for_elapsed_secs(37), 6_300);
        assert_eq!(score_for_elapsed_secs(100), 0);
        assert_eq!(score_for_elapsed_secs(150), 0);
        assert_eq!(score_for_elapsed_secs(u64::MAX), 0);
    }

    #[test]
    fn score_truncates_partial_seconds() {
        assert_eq!(score_for_elapsed(Duration::from_millis(2_999)), 9_800);
    }

    #[test]
    fn step_stays_within_bounds() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Direction::North, 3), None);
        assert_eq!(corner.step(Direction::West, 3), None);
        assert_eq!(corner.step(Direction::South, 3), Some(Position::new(1, 0)));
        assert_eq!(corner.step(Direction::East, 3), Some(Position::new(0, 1)));
        assert_eq!(Position::new(2, 2).step(Direction::East, 3), None);
    }

    #[test]
    fn intent_frame_keeps_last_intent_per_kind() {
        let frame = IntentFrame::from_intents([
            Intent::MovePursuer(Direction::North),
            Intent::SelectDifficulty(Difficulty::Easy),
            Intent::MovePursuer(Direction::West),
            Intent::SelectDifficulty(Difficulty::Hard),
        ]);

        assert_eq!(frame.movement, Some(Direction::West));
        assert_eq!(frame.difficulty, Some(Difficulty::Hard));
        assert!(!frame.start_round);
        assert!(!frame.is_empty());
        assert!(IntentFrame::default().is_empty());
    }

    #[test]
    fn positions_order_by_scan_order() {
        let mut cells = vec![
            Position::new(1, 0),
            Position::new(0, 2),
            Position::new(0, 1),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 0)
            ]
        );
    }
}
