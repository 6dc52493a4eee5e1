#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-decision-tick orchestration of both actors.
//!
//! The director reacts to world events and answers with commands, one stage
//! at a time. A decision tick runs through these stages:
//!
//! 1. time-limit check and the evader's step,
//! 2. grid regeneration when the evader's stuck counter reached its threshold,
//! 3. routing the pursuer and, in automatic mode, advancing it,
//! 4. grid regeneration when the pursuer's stuck counter reached its threshold,
//! 5. power-up collection and capture detection.
//!
//! Each stage is decided against the world state produced by the previous
//! one, so the caller must apply the emitted commands and feed the resulting
//! events back until the director stops emitting commands.

use pursuit_core::{
    Actor, Command, Event, Path, PursuerMode, PursuerPlan, RoundState, RulesetConfig,
};
use pursuit_system_evader::EvaderPolicy;
use pursuit_system_grid_generation::{Config as GeneratorConfig, GridGenerator};
use pursuit_system_pathfinding::route_toward;
use pursuit_world::{query, World};
use rand::Rng;
use tracing::debug;

/// Stage of the decision tick awaiting the world's response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Idle,
    Evader,
    EvaderRegeneration,
    Pursuer,
    PursuerRegeneration,
}

/// System that sequences evader decisions, pursuer routing, stuck recovery
/// and encounter resolution.
#[derive(Debug)]
pub struct PursuitDirector {
    policy: EvaderPolicy,
    generator: GridGenerator,
    stage: Stage,
}

impl PursuitDirector {
    /// Creates a director from an evader policy and a grid generator.
    #[must_use]
    pub fn new(policy: EvaderPolicy, generator: GridGenerator) -> Self {
        Self {
            policy,
            generator,
            stage: Stage::Idle,
        }
    }

    /// Creates the director described by the ruleset.
    #[must_use]
    pub fn from_ruleset(ruleset: &RulesetConfig) -> Self {
        Self::new(
            EvaderPolicy::from_ruleset(ruleset),
            GridGenerator::new(GeneratorConfig::from_tuning(&ruleset.tuning)),
        )
    }

    /// Generator used for stuck recovery.
    #[must_use]
    pub fn generator(&self) -> &GridGenerator {
        &self.generator
    }

    /// Reports whether no decision tick is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stage == Stage::Idle
    }

    /// Consumes world events and emits the commands of the next stage.
    pub fn handle<R>(
        &mut self,
        events: &[Event],
        world: &World,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        if self.stage != Stage::Idle && interrupted(events) {
            debug!(stage = ?self.stage, "decision tick ended early");
            self.stage = Stage::Idle;
            return;
        }

        match self.stage {
            Stage::Idle => {
                let due = events.iter().any(|event| *event == Event::DecisionDue);
                if due && query::round_state(world) == RoundState::Running {
                    self.step_evader(world, rng, out);
                }
            }
            Stage::Evader => {
                if stuck(events, Actor::Evader) {
                    self.regenerate(Actor::Evader, rng, out);
                } else {
                    self.route_pursuer(world, out);
                }
            }
            Stage::EvaderRegeneration => self.route_pursuer(world, out),
            Stage::Pursuer => {
                if stuck(events, Actor::Pursuer) {
                    self.regenerate(Actor::Pursuer, rng, out);
                } else {
                    self.resolve(out);
                }
            }
            Stage::PursuerRegeneration => self.resolve(out),
        }
    }

    fn step_evader<R>(&mut self, world: &World, rng: &mut R, out: &mut Vec<Command>)
    where
        R: Rng + ?Sized,
    {
        let to = self.policy.decide(
            query::evader(world),
            query::pursuer(world),
            query::difficulty(world),
            query::grid(world),
            rng,
        );
        out.push(Command::CheckTimeLimit);
        out.push(Command::StepEvader { to });
        self.stage = Stage::Evader;
    }

    fn regenerate<R>(&mut self, actor: Actor, rng: &mut R, out: &mut Vec<Command>)
    where
        R: Rng + ?Sized,
    {
        let layout = self.generator.generate(rng);
        out.push(Command::RegenerateGrid {
            layout,
            stuck: actor,
        });
        self.stage = match actor {
            Actor::Evader => Stage::EvaderRegeneration,
            Actor::Pursuer => Stage::PursuerRegeneration,
        };
    }

    fn route_pursuer(&mut self, world: &World, out: &mut Vec<Command>) {
        let (path, plan) = match route_toward(
            query::grid(world),
            query::pursuer(world),
            query::evader(world),
        ) {
            Ok(path) => {
                let plan = path.first().map_or(PursuerPlan::Hold, PursuerPlan::Step);
                (path, plan)
            }
            Err(error) => {
                debug!(%error, "pursuer is enclosed");
                (Path::empty(), PursuerPlan::Blocked)
            }
        };
        out.push(Command::SetPursuerPath { path });

        match query::pursuer_mode(world) {
            PursuerMode::Automatic => {
                out.push(Command::AdvancePursuer { plan });
                self.stage = Stage::Pursuer;
            }
            PursuerMode::Manual => self.resolve(out),
        }
    }

    fn resolve(&mut self, out: &mut Vec<Command>) {
        out.push(Command::ResolveEncounters);
        self.stage = Stage::Idle;
    }
}

fn interrupted(events: &[Event]) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            Event::RoundStateChanged { .. } | Event::CommandRejected { .. }
        )
    })
}

fn stuck(events: &[Event], actor: Actor) -> bool {
    events.contains(&Event::StuckThresholdReached { actor })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use pursuit_core::{Grid, GridLayout, Position};
    use pursuit_world::apply;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DECISION: Duration = Duration::from_millis(500);

    struct Harness {
        world: World,
        director: PursuitDirector,
        rng: ChaCha8Rng,
    }

    impl Harness {
        fn new(ruleset: RulesetConfig, layout: GridLayout) -> Self {
            let director = PursuitDirector::from_ruleset(&ruleset);
            let mut world = World::new(ruleset, layout);
            let mut events = Vec::new();
            apply(&mut world, Command::StartRound, &mut events);
            Self {
                world,
                director,
                rng: ChaCha8Rng::seed_from_u64(0xd1ec_7002),
            }
        }

        fn apply(&mut self, command: Command) -> Vec<Event> {
            let mut events = Vec::new();
            apply(&mut self.world, command, &mut events);
            events
        }

        fn decision_tick(&mut self) -> Vec<Event> {
            let mut events = self.apply(Command::Tick { dt: DECISION });
            let mut log = events.clone();
            loop {
                let mut commands = Vec::new();
                self.director
                    .handle(&events, &self.world, &mut self.rng, &mut commands);
                if commands.is_empty() {
                    break;
                }
                events.clear();
                for command in commands {
                    apply(&mut self.world, command, &mut events);
                }
                log.extend(events.iter().cloned());
            }
            assert!(self.director.is_idle());
            log
        }
    }

    fn grid(text: &str) -> GridLayout {
        GridLayout::new(Grid::from_ascii(text).expect("valid grid"), true)
    }

    #[test]
    fn automatic_pursuer_advances_each_decision_tick() {
        let mut harness = Harness::new(RulesetConfig::classic(), GridLayout::open(8));
        let events = harness.decision_tick();

        assert!(events.contains(&Event::ActorAdvanced {
            actor: Actor::Pursuer,
            from: Position::new(0, 0),
            to: query::pursuer(&harness.world),
        }));
        assert!(!query::pursuer_path(&harness.world).is_empty());
    }

    #[test]
    fn enclosed_evader_triggers_regeneration_on_tenth_stall() {
        let mut harness = Harness::new(
            RulesetConfig::classic(),
            grid(
                "
                .....
                .....
                .....
                ....#
                ...#.
                ",
            ),
        );

        for _ in 0..9 {
            let events = harness.decision_tick();
            let regenerated = events
                .iter()
                .any(|event| matches!(event, Event::GridRegenerated { .. }));
            assert!(!regenerated);
        }
        let events = harness.decision_tick();
        assert!(events.iter().any(|event| matches!(
            event,
            Event::GridRegenerated {
                stuck: Actor::Evader,
                ..
            }
        )));
        assert_eq!(query::stalled_for(&harness.world, Actor::Evader), 0);
    }

    #[test]
    fn enclosed_pursuer_triggers_regeneration() {
        let mut harness = Harness::new(
            RulesetConfig::classic(),
            grid(
                "
                .#....
                #.....
                ......
                ......
                ......
                ......
                ",
            ),
        );

        let mut regenerated_at = None;
        for tick in 1..=10 {
            let events = harness.decision_tick();
            if events.iter().any(|event| {
                matches!(
                    event,
                    Event::GridRegenerated {
                        stuck: Actor::Pursuer,
                        ..
                    }
                )
            }) {
                regenerated_at = Some(tick);
                break;
            }
        }

        assert_eq!(regenerated_at, Some(10));
        assert_eq!(query::stalled_for(&harness.world, Actor::Pursuer), 0);
    }

    #[test]
    fn manual_pursuer_keeps_its_cell_but_gets_a_path() {
        let mut harness = Harness::new(RulesetConfig::classic(), GridLayout::open(8));
        let _ = harness.apply(Command::ToggleMode);
        let _ = harness.decision_tick();

        assert_eq!(query::pursuer(&harness.world), Position::new(0, 0));
        assert!(!query::pursuer_path(&harness.world).is_empty());
        assert_eq!(query::stalled_for(&harness.world, Actor::Pursuer), 0);
    }

    #[test]
    fn expired_time_limit_skips_the_rest_of_the_tick() {
        let mut ruleset = RulesetConfig::timed();
        ruleset.time_limit_secs = Some(1);
        let mut harness = Harness::new(ruleset, GridLayout::open(8));
        let _ = harness.apply(Command::Tick {
            dt: Duration::from_millis(900),
        });

        let events = harness.decision_tick();

        assert!(events.contains(&Event::TimeLimitExpired));
        assert_eq!(query::round_state(&harness.world), RoundState::Lost);
        assert_eq!(query::evader(&harness.world), Position::new(7, 7));
        assert_eq!(query::pursuer(&harness.world), Position::new(0, 0));
    }

    #[test]
    fn pursuer_captures_on_small_grid() {
        let mut harness = Harness::new(RulesetConfig::classic(), GridLayout::open(3));

        for _ in 0..200 {
            let _ = harness.decision_tick();
            if query::round_state(&harness.world).is_finished() {
                break;
            }
        }

        assert!(matches!(
            query::round_state(&harness.world),
            RoundState::Won { .. }
        ));
        assert_eq!(
            query::pursuer(&harness.world),
            query::evader(&harness.world)
        );
    }
}
