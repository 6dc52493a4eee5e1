#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the pursuit engine.
//!
//! The [`World`] aggregate owns every piece of mutable simulation state. It is
//! mutated exclusively through [`apply`] and observed through the [`query`]
//! module.

mod actors;
mod clock;

use std::{collections::BTreeSet, time::Duration};

use pursuit_core::{
    score_for_elapsed, Actor, Command, Difficulty, Direction, Event, Grid, GridLayout, Path,
    Position, PursuerMode, PursuerPlan, RoundState, RoundTrigger, RulesetConfig,
};
use tracing::{debug, info, warn};

pub use actors::{PowerUpEffect, StuckCounter};
pub use clock::SimulationClock;

/// Represents the authoritative pursuit world state.
#[derive(Debug)]
pub struct World {
    ruleset: RulesetConfig,
    difficulty: Difficulty,
    round: RoundState,
    grid: Grid,
    power_ups: BTreeSet<Position>,
    reachable: bool,
    pursuer: Position,
    evader: Position,
    pursuer_stuck: StuckCounter,
    evader_stuck: StuckCounter,
    mode: PursuerMode,
    pursuer_path: Path,
    now: Duration,
    clock: SimulationClock,
    decision_accumulator: Duration,
    power_up: PowerUpEffect,
    invalid_move_flash: Duration,
    grid_regenerated: bool,
    outcome_countdown: Duration,
    last_score: Option<u32>,
    best_score: u32,
    quit_requested: bool,
}

impl World {
    /// Creates a world in the menu state using the provided rules and layout.
    #[must_use]
    pub fn new(ruleset: RulesetConfig, layout: GridLayout) -> Self {
        let (grid, power_ups, reachable) = layout.into_parts();
        let pursuer = grid.start_corner();
        let evader = grid.goal_corner();
        Self {
            ruleset,
            difficulty: Difficulty::default(),
            round: RoundState::Menu,
            power_ups: power_ups.into_iter().collect(),
            reachable,
            pursuer,
            evader,
            grid,
            pursuer_stuck: StuckCounter::default(),
            evader_stuck: StuckCounter::default(),
            mode: PursuerMode::default(),
            pursuer_path: Path::empty(),
            now: Duration::ZERO,
            clock: SimulationClock::default(),
            decision_accumulator: Duration::ZERO,
            power_up: PowerUpEffect::default(),
            invalid_move_flash: Duration::ZERO,
            grid_regenerated: false,
            outcome_countdown: Duration::ZERO,
            last_score: None,
            best_score: 0,
            quit_requested: false,
        }
    }

    fn install_layout(&mut self, layout: GridLayout) {
        let (grid, power_ups, reachable) = layout.into_parts();
        self.grid = grid;
        self.power_ups = power_ups.into_iter().collect();
        self.reachable = reachable;
        self.pursuer_stuck.reset();
        self.evader_stuck.reset();
    }

    fn reset_round(&mut self, layout: GridLayout) {
        self.install_layout(layout);
        self.pursuer = self.grid.start_corner();
        self.evader = self.grid.goal_corner();
        self.mode = PursuerMode::Automatic;
        self.pursuer_path = Path::empty();
        self.clock = SimulationClock::default();
        self.decision_accumulator = Duration::ZERO;
        self.power_up.clear();
        self.invalid_move_flash = Duration::ZERO;
        self.grid_regenerated = false;
        self.outcome_countdown = Duration::ZERO;
    }

    fn transition(&mut self, trigger: RoundTrigger, out_events: &mut Vec<Event>) -> bool {
        let Some(next) = self.round.transition(trigger) else {
            return false;
        };
        let from = self.round;
        self.round = next;
        out_events.push(Event::RoundStateChanged { from, to: next });
        true
    }

    fn finish_round(&mut self, trigger: RoundTrigger, out_events: &mut Vec<Event>) -> bool {
        if !self.transition(trigger, out_events) {
            return false;
        }
        self.clock.pause(self.now);
        self.outcome_countdown = self.ruleset.tuning.outcome_display();
        true
    }

    fn decision_interval(&self) -> Duration {
        if self.power_up.is_active() {
            self.ruleset.tuning.boosted_move_interval()
        } else {
            self.ruleset.tuning.move_interval()
        }
    }

    fn can_return_to_menu(&self) -> bool {
        match self.round {
            RoundState::Paused => self.ruleset.pause_menu_enabled,
            RoundState::Won { .. } | RoundState::Lost => self.outcome_countdown.is_zero(),
            RoundState::Menu | RoundState::Running => false,
        }
    }

    fn is_single_step(&self, from: Position, to: Position) -> bool {
        from.manhattan_distance(to) == 1 && self.grid.is_passable(to)
    }

    fn stuck_counter_mut(&mut self, actor: Actor) -> &mut StuckCounter {
        match actor {
            Actor::Pursuer => &mut self.pursuer_stuck,
            Actor::Evader => &mut self.evader_stuck,
        }
    }

    fn position_mut(&mut self, actor: Actor) -> &mut Position {
        match actor {
            Actor::Pursuer => &mut self.pursuer,
            Actor::Evader => &mut self.evader,
        }
    }

    fn advance_actor(&mut self, actor: Actor, to: Position, out_events: &mut Vec<Event>) {
        let position = self.position_mut(actor);
        let from = *position;
        *position = to;
        self.stuck_counter_mut(actor).reset();
        out_events.push(Event::ActorAdvanced { actor, from, to });
    }

    fn stall_actor(&mut self, actor: Actor, out_events: &mut Vec<Event>) {
        let threshold = self.ruleset.tuning.stuck_threshold;
        let counter = self.stuck_counter_mut(actor);
        let stalled_for = counter.record_stall();
        let reached = counter.has_reached(threshold);
        out_events.push(Event::ActorStalled { actor, stalled_for });
        if reached {
            out_events.push(Event::StuckThresholdReached { actor });
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.now = self.now.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        match self.round {
            RoundState::Running => {
                self.grid_regenerated = false;
                self.invalid_move_flash = self.invalid_move_flash.saturating_sub(dt);
                if self.power_up.tick(dt) {
                    out_events.push(Event::PowerUpExpired);
                }

                self.decision_accumulator = self.decision_accumulator.saturating_add(dt);
                if self.decision_accumulator >= self.decision_interval() {
                    self.decision_accumulator = Duration::ZERO;
                    out_events.push(Event::DecisionDue);
                }
            }
            RoundState::Won { .. } | RoundState::Lost => {
                if !self.outcome_countdown.is_zero() {
                    self.outcome_countdown = self.outcome_countdown.saturating_sub(dt);
                    if self.outcome_countdown.is_zero() {
                        out_events.push(Event::OutcomeDisplayElapsed);
                    }
                }
            }
            RoundState::Menu | RoundState::Paused => {}
        }
    }

    fn move_pursuer_manually(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let from = self.pursuer;
        let candidate = from
            .step(direction, self.grid.size())
            .filter(|cell| self.grid.is_passable(*cell));

        match candidate {
            Some(to) => self.advance_actor(Actor::Pursuer, to, out_events),
            None => {
                self.invalid_move_flash = self.ruleset.tuning.invalid_move_flash();
                out_events.push(Event::ManualMoveRejected { from, direction });
            }
        }
    }

    fn resolve_encounters(&mut self, out_events: &mut Vec<Event>) {
        let cell = self.pursuer;
        if self.power_ups.remove(&cell) && self.grid.consume_power_up(cell) {
            self.power_up
                .activate(self.ruleset.tuning.power_up_duration());
            out_events.push(Event::PowerUpCollected { cell });
        }

        if self.pursuer != self.evader {
            return;
        }

        let elapsed = self.clock.elapsed(self.now);
        let score = score_for_elapsed(elapsed);
        let new_best = score > self.best_score;
        if new_best {
            self.best_score = score;
        }
        self.last_score = Some(score);
        info!(
            score,
            elapsed_secs = elapsed.as_secs(),
            new_best,
            "evader captured"
        );
        out_events.push(Event::EvaderCaptured {
            score,
            elapsed,
            new_best,
        });
        let _ = self.finish_round(RoundTrigger::Capture { score }, out_events);
    }

    fn accepts(&self, command: &Command) -> bool {
        let running = self.round == RoundState::Running;
        match command {
            Command::SelectDifficulty { .. } => self.round == RoundState::Menu,
            Command::StartRound => self.round == RoundState::Menu,
            Command::TogglePause => self.round.is_in_round(),
            Command::ToggleMode => self.round.is_in_round(),
            Command::MovePursuer { .. } => running && self.mode == PursuerMode::Manual,
            Command::ReturnToMenu { .. } => self.can_return_to_menu(),
            Command::RetryRound { .. } => self.ruleset.retry_enabled && self.round.is_finished(),
            Command::Quit | Command::Tick { .. } => true,
            Command::AdvancePursuer { .. } => running && self.mode == PursuerMode::Automatic,
            Command::CheckTimeLimit
            | Command::StepEvader { .. }
            | Command::SetPursuerPath { .. }
            | Command::RegenerateGrid { .. }
            | Command::ResolveEncounters => running,
        }
    }
}

/// Applies the provided command to the world.
///
/// Commands that are not legal in the current round state leave the world
/// untouched and produce [`Event::CommandRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if !world.accepts(&command) {
        debug!(command = ?command.kind(), state = ?world.round, "command rejected");
        out_events.push(Event::CommandRejected {
            command: command.kind(),
            state: world.round,
        });
        return;
    }

    match command {
        Command::SelectDifficulty { difficulty } => {
            world.difficulty = difficulty;
            out_events.push(Event::DifficultyChanged { difficulty });
        }
        Command::StartRound => {
            if world.transition(RoundTrigger::Start, out_events) {
                world.clock.start(world.now);
                world.decision_accumulator = Duration::ZERO;
            }
        }
        Command::TogglePause => {
            if world.round == RoundState::Running {
                if world.transition(RoundTrigger::Pause, out_events) {
                    world.clock.pause(world.now);
                }
            } else if world.transition(RoundTrigger::Resume, out_events) {
                world.clock.resume(world.now);
            }
        }
        Command::ToggleMode => {
            world.mode = world.mode.toggled();
            info!(mode = world.mode.label(), "pursuer mode switched");
            out_events.push(Event::PursuerModeChanged { mode: world.mode });
        }
        Command::MovePursuer { direction } => world.move_pursuer_manually(direction, out_events),
        Command::ReturnToMenu { layout } => {
            if world.transition(RoundTrigger::ReturnToMenu, out_events) {
                let reachable = layout.reachable();
                world.reset_round(layout);
                out_events.push(Event::RoundReset { reachable });
            }
        }
        Command::RetryRound { layout } => {
            if world.transition(RoundTrigger::Retry, out_events) {
                let reachable = layout.reachable();
                world.reset_round(layout);
                world.clock.start(world.now);
                out_events.push(Event::RoundReset { reachable });
            }
        }
        Command::Quit => {
            world.quit_requested = true;
            out_events.push(Event::QuitRequested);
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::CheckTimeLimit => {
            let Some(limit) = world.ruleset.time_limit() else {
                return;
            };
            if world.clock.elapsed(world.now) > limit {
                info!(limit_secs = limit.as_secs(), "round time limit expired");
                out_events.push(Event::TimeLimitExpired);
                let _ = world.finish_round(RoundTrigger::TimeExpired, out_events);
            }
        }
        Command::StepEvader { to } => {
            if to != world.evader && world.is_single_step(world.evader, to) {
                world.advance_actor(Actor::Evader, to, out_events);
            } else {
                if to != world.evader {
                    debug!(from = %world.evader, %to, "evader step is not a single passable move");
                }
                world.stall_actor(Actor::Evader, out_events);
            }
        }
        Command::SetPursuerPath { path } => world.pursuer_path = path,
        Command::AdvancePursuer { plan } => match plan {
            PursuerPlan::Step(to) if world.is_single_step(world.pursuer, to) => {
                world.advance_actor(Actor::Pursuer, to, out_events);
            }
            PursuerPlan::Hold => world.pursuer_stuck.reset(),
            PursuerPlan::Step(_) | PursuerPlan::Blocked => {
                world.stall_actor(Actor::Pursuer, out_events);
            }
        },
        Command::RegenerateGrid { layout, stuck } => {
            let reachable = layout.reachable();
            world.install_layout(layout);
            world.grid_regenerated = true;
            if reachable {
                info!(?stuck, "grid regenerated");
            } else {
                warn!(?stuck, "grid regenerated without a validated corner-to-corner route");
            }
            out_events.push(Event::GridRegenerated { stuck, reachable });
        }
        Command::ResolveEncounters => world.resolve_encounters(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::BTreeSet, time::Duration};

    use pursuit_core::{
        score_for_elapsed, Actor, Difficulty, Grid, Path, Position, PursuerMode, RoundState,
        RulesetConfig, Snapshot,
    };

    use super::World;

    /// Rules the world was created with.
    #[must_use]
    pub fn ruleset(world: &World) -> &RulesetConfig {
        &world.ruleset
    }

    /// Current round state.
    #[must_use]
    pub fn round_state(world: &World) -> RoundState {
        world.round
    }

    /// Currently selected difficulty.
    #[must_use]
    pub fn difficulty(world: &World) -> Difficulty {
        world.difficulty
    }

    /// Current pursuer control mode.
    #[must_use]
    pub fn pursuer_mode(world: &World) -> PursuerMode {
        world.mode
    }

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Cells currently bearing a power-up, in scan order.
    #[must_use]
    pub fn power_ups(world: &World) -> &BTreeSet<Position> {
        &world.power_ups
    }

    /// Whether the installed grid was validated as corner-to-corner reachable.
    #[must_use]
    pub fn grid_validated(world: &World) -> bool {
        world.reachable
    }

    /// Cell occupied by the pursuer.
    #[must_use]
    pub fn pursuer(world: &World) -> Position {
        world.pursuer
    }

    /// Cell occupied by the evader.
    #[must_use]
    pub fn evader(world: &World) -> Position {
        world.evader
    }

    /// Last route computed for the pursuer.
    #[must_use]
    pub fn pursuer_path(world: &World) -> &Path {
        &world.pursuer_path
    }

    /// Consecutive stalled decision ticks recorded for an actor.
    #[must_use]
    pub fn stalled_for(world: &World, actor: Actor) -> u32 {
        match actor {
            Actor::Pursuer => world.pursuer_stuck.get(),
            Actor::Evader => world.evader_stuck.get(),
        }
    }

    /// Pause-adjusted time elapsed in the current round.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock.elapsed(world.now)
    }

    /// Interval between decision ticks, shortened while a power-up is active.
    #[must_use]
    pub fn decision_interval(world: &World) -> Duration {
        world.decision_interval()
    }

    /// Remaining duration of the power-up effect.
    #[must_use]
    pub fn power_up_remaining(world: &World) -> Option<Duration> {
        world.power_up.remaining()
    }

    /// Best score achieved during the session.
    #[must_use]
    pub fn best_score(world: &World) -> u32 {
        world.best_score
    }

    /// Score of the most recently won round.
    #[must_use]
    pub fn last_score(world: &World) -> Option<u32> {
        world.last_score
    }

    /// Whether a quit was requested.
    #[must_use]
    pub fn quit_requested(world: &World) -> bool {
        world.quit_requested
    }

    /// Captures everything the presentation layer draws in a frame.
    #[must_use]
    pub fn snapshot(world: &World) -> Snapshot {
        let elapsed = elapsed(world);
        let remaining = world
            .ruleset
            .time_limit()
            .map(|limit| limit.saturating_sub(elapsed));
        Snapshot {
            grid: world.grid.clone(),
            pursuer: world.pursuer,
            evader: world.evader,
            pursuer_path: world.pursuer_path.clone(),
            distance: world.pursuer.manhattan_distance(world.evader),
            round: world.round,
            elapsed,
            remaining,
            score: score_for_elapsed(elapsed),
            last_score: world.last_score,
            best_score: world.best_score,
            power_up_remaining: world.power_up.remaining(),
            grid_regenerated: world.grid_regenerated,
            invalid_move: !world.invalid_move_flash.is_zero(),
            mode: world.mode,
            difficulty: world.difficulty,
        }
    }
}
