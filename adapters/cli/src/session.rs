//! Headless session loop that plays scripted rounds against the frame driver.

use std::{thread, time::Duration};

use anyhow::Result;
use pursuit_core::{
    Difficulty, Direction, Event, Intent, IntentFrame, Position, PursuerMode, RoundState,
};
use pursuit_rendering::Presenter;
use pursuit_system_round::RoundStateMachine;
use tracing::{debug, info, warn};

/// Knobs controlling how a session is played.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionOptions {
    pub(crate) difficulty: Difficulty,
    pub(crate) manual: bool,
    pub(crate) rounds: u32,
    pub(crate) frame: Duration,
    pub(crate) max_frames: u64,
    pub(crate) render_every: u64,
    pub(crate) realtime: bool,
}

/// Totals reported when a session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) rounds: u32,
    pub(crate) wins: u32,
    pub(crate) best_score: u32,
    pub(crate) frames: u64,
}

/// Plays rounds until the requested count finishes or the frame budget runs out.
pub(crate) struct Session {
    machine: RoundStateMachine,
    presenter: Box<dyn Presenter>,
    options: SessionOptions,
}

impl Session {
    pub(crate) fn new(
        machine: RoundStateMachine,
        presenter: Box<dyn Presenter>,
        options: SessionOptions,
    ) -> Self {
        Self {
            machine,
            presenter,
            options,
        }
    }

    pub(crate) fn run(mut self) -> Result<Summary> {
        let mut summary = Summary::default();
        let mut decision_seen = false;

        while summary.rounds < self.options.rounds {
            if summary.frames >= self.options.max_frames {
                warn!(
                    frames = summary.frames,
                    finished = summary.rounds,
                    "frame budget exhausted before all rounds finished"
                );
                break;
            }

            let intents = self.script(decision_seen);
            let events = self.machine.frame(self.options.frame, &intents).to_vec();
            summary.frames += 1;
            decision_seen = events.contains(&Event::DecisionDue);

            let mut state_changed = false;
            for event in &events {
                match event {
                    Event::EvaderCaptured {
                        score,
                        elapsed,
                        new_best,
                    } => {
                        summary.wins += 1;
                        info!(
                            score,
                            elapsed_secs = elapsed.as_secs(),
                            new_best,
                            "evader caught"
                        );
                    }
                    Event::TimeLimitExpired => info!("time limit expired"),
                    Event::RoundStateChanged { from, to } => {
                        state_changed = true;
                        if from.is_finished() && *to == RoundState::Menu {
                            summary.rounds += 1;
                        }
                    }
                    _ => {}
                }
            }

            self.presenter.notify(&events)?;
            let every = self.options.render_every;
            if state_changed || (every != 0 && summary.frames % every == 0) {
                self.presenter.present(&self.machine.snapshot())?;
            }
            if self.options.realtime {
                thread::sleep(self.options.frame);
            }
        }

        let _ = self
            .machine
            .frame(Duration::ZERO, &IntentFrame::from_intents([Intent::Quit]));
        summary.best_score = self.machine.snapshot().best_score;
        Ok(summary)
    }

    /// Intents the scripted player submits this frame.
    fn script(&self, decision_seen: bool) -> IntentFrame {
        let mut intents = IntentFrame::default();
        match self.machine.state() {
            RoundState::Menu => {
                intents.record(Intent::SelectDifficulty(self.options.difficulty));
                intents.record(Intent::StartRound);
            }
            RoundState::Running if self.options.manual => {
                let snapshot = self.machine.snapshot();
                if snapshot.mode == PursuerMode::Automatic {
                    intents.record(Intent::ToggleMode);
                } else if decision_seen {
                    let next = snapshot
                        .pursuer_path
                        .first()
                        .and_then(|cell| direction_toward(snapshot.pursuer, cell));
                    match next {
                        Some(direction) => intents.record(Intent::MovePursuer(direction)),
                        None => debug!("no displayed path to follow"),
                    }
                }
            }
            _ => {}
        }
        intents
    }
}

/// Direction of a single orthogonal step from `from` to `to`.
fn direction_toward(from: Position, to: Position) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|direction| from.step(*direction, u32::MAX) == Some(to))
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use pursuit_core::{EvaderWeights, RulesetConfig, Snapshot};

    fn options(manual: bool) -> SessionOptions {
        SessionOptions {
            difficulty: Difficulty::Medium,
            manual,
            rounds: 2,
            frame: Duration::from_millis(50),
            max_frames: 200_000,
            render_every: 0,
            realtime: false,
        }
    }

    fn small_ruleset() -> RulesetConfig {
        let mut ruleset = RulesetConfig::classic();
        ruleset.tuning.grid_size = 6;
        ruleset
    }

    #[derive(Clone, Default)]
    struct Recorder {
        frames: Rc<RefCell<Vec<RoundState>>>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, snapshot: &Snapshot) -> Result<()> {
            self.frames.borrow_mut().push(snapshot.round);
            Ok(())
        }
    }

    #[test]
    fn direction_toward_neighbours() {
        let from = Position::new(3, 3);

        assert_eq!(
            direction_toward(from, Position::new(2, 3)),
            Some(Direction::North)
        );
        assert_eq!(
            direction_toward(from, Position::new(4, 3)),
            Some(Direction::South)
        );
        assert_eq!(
            direction_toward(from, Position::new(3, 2)),
            Some(Direction::West)
        );
        assert_eq!(
            direction_toward(from, Position::new(3, 4)),
            Some(Direction::East)
        );
        assert_eq!(direction_toward(from, Position::new(4, 4)), None);
        assert_eq!(direction_toward(from, from), None);
    }

    #[test]
    fn automatic_session_plays_requested_rounds() {
        let machine = RoundStateMachine::seeded(small_ruleset(), 17);
        let summary = Session::new(machine, Box::new(Recorder::default()), options(false))
            .run()
            .expect("session runs");

        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.wins, 2);
        assert!(summary.best_score > 0);
    }

    #[test]
    fn scripted_manual_pursuer_catches_a_stationary_evader() {
        let mut ruleset = RulesetConfig::timed();
        ruleset.time_limit_secs = None;
        ruleset.tuning.grid_size = 6;
        let stay = EvaderWeights::new(0.0, 0.0, 1.0, 0.0);
        ruleset.evader_weights.easy = stay;
        ruleset.evader_weights.medium = stay;
        ruleset.evader_weights.hard = stay;
        let machine = RoundStateMachine::seeded(ruleset, 23);
        let summary = Session::new(machine, Box::new(Recorder::default()), options(true))
            .run()
            .expect("session runs");

        assert_eq!(summary.wins, 2);
    }

    #[test]
    fn frame_budget_stops_the_session() {
        let machine = RoundStateMachine::seeded(RulesetConfig::classic(), 5);
        let mut options = options(false);
        options.max_frames = 10;

        let summary = Session::new(machine, Box::new(Recorder::default()), options)
            .run()
            .expect("session runs");

        assert_eq!(summary.frames, 10);
        assert_eq!(summary.rounds, 0);
    }

    #[test]
    fn renders_on_cadence_and_state_changes() {
        let recorder = Recorder::default();
        let machine = RoundStateMachine::seeded(RulesetConfig::classic(), 5);
        let mut options = options(false);
        options.max_frames = 20;
        options.render_every = 5;

        let _ = Session::new(machine, Box::new(recorder.clone()), options)
            .run()
            .expect("session runs");

        let frames = recorder.frames.borrow();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|state| *state == RoundState::Running));
    }
}
