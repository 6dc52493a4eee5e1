#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that sequences intents, time and the decision pipeline.
//!
//! [`RoundStateMachine::frame`] is the single entry point of the cooperative
//! frame loop. Every mutation of a frame completes before the call returns, so
//! a quit request observed at the start of the next frame never interrupts a
//! half-applied decision tick.

use std::time::Duration;

use pursuit_core::{Command, Event, GridLayout, IntentFrame, RoundState, RulesetConfig, Snapshot};
use pursuit_system_director::PursuitDirector;
use pursuit_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Owns the world and drives it one frame at a time.
#[derive(Debug)]
pub struct RoundStateMachine {
    world: World,
    director: PursuitDirector,
    rng: ChaCha8Rng,
    frame_events: Vec<Event>,
}

impl RoundStateMachine {
    /// Creates a session in the menu using the provided random source.
    #[must_use]
    pub fn new(ruleset: RulesetConfig, mut rng: ChaCha8Rng) -> Self {
        let director = PursuitDirector::from_ruleset(&ruleset);
        let layout = director.generator().generate(&mut rng);
        Self {
            world: World::new(ruleset, layout),
            director,
            rng,
            frame_events: Vec::new(),
        }
    }

    /// Creates a session whose randomness is reproducible from `seed`.
    #[must_use]
    pub fn seeded(ruleset: RulesetConfig, seed: u64) -> Self {
        Self::new(ruleset, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Creates a session seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy(ruleset: RulesetConfig) -> Self {
        Self::new(ruleset, ChaCha8Rng::from_entropy())
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current round state.
    #[must_use]
    pub fn state(&self) -> RoundState {
        query::round_state(&self.world)
    }

    /// Captures the data the presentation layer draws.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        query::snapshot(&self.world)
    }

    /// Reports whether the session should end.
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        query::quit_requested(&self.world)
    }

    /// Advances the session by one rendered frame.
    ///
    /// Intents are applied first, then the clock advances by `dt` and any
    /// decision tick that became due runs to completion. Returns every event
    /// the world emitted during the frame.
    pub fn frame(&mut self, dt: Duration, intents: &IntentFrame) -> &[Event] {
        self.frame_events.clear();
        if intents.quit {
            self.apply(Command::Quit);
            return &self.frame_events;
        }
        if self.quit_requested() {
            return &self.frame_events;
        }

        self.apply_intents(intents);

        let first_tick_event = self.frame_events.len();
        self.apply(Command::Tick { dt });
        if self.state() == RoundState::Running {
            self.apply(Command::CheckTimeLimit);
        }
        let tick_events = self.frame_events[first_tick_event..].to_vec();
        self.run_director(tick_events);

        if self.frame_events.contains(&Event::OutcomeDisplayElapsed) {
            let layout = self.fresh_layout();
            self.apply(Command::ReturnToMenu { layout });
        }

        &self.frame_events
    }

    fn apply_intents(&mut self, intents: &IntentFrame) {
        if let Some(difficulty) = intents.difficulty {
            self.apply(Command::SelectDifficulty { difficulty });
        }
        if intents.start_round {
            self.apply(Command::StartRound);
        }
        if intents.toggle_pause {
            self.apply(Command::TogglePause);
        }
        if intents.toggle_mode {
            self.apply(Command::ToggleMode);
        }
        if let Some(direction) = intents.movement {
            self.apply(Command::MovePursuer { direction });
        }
        if intents.return_to_menu {
            if self.state() == RoundState::Paused {
                let layout = self.fresh_layout();
                self.apply(Command::ReturnToMenu { layout });
            } else {
                debug!(state = ?self.state(), "return to menu only leaves a paused round");
            }
        }
        if intents.retry_round {
            if self.state().is_finished() {
                let layout = self.fresh_layout();
                self.apply(Command::RetryRound { layout });
            } else {
                debug!(state = ?self.state(), "retry only restarts a finished round");
            }
        }
    }

    /// Feeds world events to the director until it stops emitting commands.
    fn run_director(&mut self, mut events: Vec<Event>) {
        let mut commands = Vec::new();
        loop {
            self.director
                .handle(&events, &self.world, &mut self.rng, &mut commands);
            if commands.is_empty() {
                return;
            }

            events.clear();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.frame_events.extend(events.iter().cloned());
        }
    }

    fn fresh_layout(&mut self) -> GridLayout {
        self.director.generator().generate(&mut self.rng)
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.frame_events);
    }
}
