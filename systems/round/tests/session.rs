use std::time::Duration;

use pursuit_core::{
    CellKind, Direction, Event, Intent, IntentFrame, Position, PursuerMode, RoundState,
    RulesetConfig,
};
use pursuit_system_round::RoundStateMachine;

const FRAME: Duration = Duration::from_millis(50);

fn open_ruleset(mut ruleset: RulesetConfig) -> RulesetConfig {
    ruleset.tuning.wall_probability = 0.0;
    ruleset.tuning.power_up_count = 0;
    ruleset
}

fn start(machine: &mut RoundStateMachine) {
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::StartRound]));
    assert_eq!(machine.state(), RoundState::Running);
}

fn idle(machine: &mut RoundStateMachine) -> Vec<Event> {
    machine.frame(FRAME, &IntentFrame::default()).to_vec()
}

#[test]
fn automatic_pursuer_captures_on_open_grid() {
    for seed in 0..5 {
        let mut machine = RoundStateMachine::seeded(open_ruleset(RulesetConfig::classic()), seed);
        start(&mut machine);
        assert_eq!(machine.snapshot().grid.size(), 20);
        assert_eq!(machine.snapshot().grid.wall_count(), 0);

        let mut captured = false;
        for _ in 0..100_000 {
            let events = idle(&mut machine);
            if events
                .iter()
                .any(|event| matches!(event, Event::EvaderCaptured { .. }))
            {
                captured = true;
                break;
            }
        }

        assert!(captured, "seed {seed} never captured the evader");
        let snapshot = machine.snapshot();
        assert!(matches!(snapshot.round, RoundState::Won { .. }));
        assert_eq!(snapshot.pursuer, snapshot.evader);
        assert_eq!(Some(snapshot.best_score), snapshot.last_score);
    }
}

#[test]
fn won_round_returns_to_menu_after_display_delay() {
    let mut ruleset = open_ruleset(RulesetConfig::classic());
    ruleset.tuning.grid_size = 3;
    let mut machine = RoundStateMachine::seeded(ruleset, 7);
    start(&mut machine);

    let mut frames = 0;
    while !machine.state().is_finished() {
        let _ = idle(&mut machine);
        frames += 1;
        assert!(frames < 10_000, "no capture on a 3x3 grid");
    }
    let best = machine.snapshot().best_score;

    for _ in 0..59 {
        let _ = idle(&mut machine);
        assert!(machine.state().is_finished());
    }
    let events = idle(&mut machine);

    assert!(events.contains(&Event::OutcomeDisplayElapsed));
    assert_eq!(machine.state(), RoundState::Menu);
    assert_eq!(machine.snapshot().best_score, best);
}

#[test]
fn pause_freezes_elapsed_time() {
    let mut machine = RoundStateMachine::seeded(RulesetConfig::classic(), 3);
    start(&mut machine);
    for _ in 0..20 {
        let _ = idle(&mut machine);
    }
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::TogglePause]));
    let before = machine.snapshot();

    for _ in 0..200 {
        let events = idle(&mut machine);
        assert!(!events.contains(&Event::DecisionDue));
    }
    let during = machine.snapshot();
    assert_eq!(during.elapsed, before.elapsed);
    assert_eq!(during.pursuer, before.pursuer);
    assert_eq!(during.evader, before.evader);

    let _ = machine.frame(Duration::ZERO, &IntentFrame::from_intents([Intent::TogglePause]));
    assert_eq!(machine.state(), RoundState::Running);
    assert_eq!(machine.snapshot().elapsed, before.elapsed);
}

#[test]
fn timed_rules_lose_the_round_and_allow_retry() {
    let mut ruleset = RulesetConfig::timed();
    ruleset.time_limit_secs = Some(2);
    ruleset.evader_weights.easy = pursuit_core::EvaderWeights::new(0.0, 0.0, 1.0, 0.0);
    ruleset.evader_weights.medium = ruleset.evader_weights.easy;
    ruleset.evader_weights.hard = ruleset.evader_weights.easy;
    let mut machine = RoundStateMachine::seeded(open_ruleset(ruleset), 11);
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::ToggleMode]));
    start(&mut machine);
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::ToggleMode]));
    assert_eq!(machine.snapshot().mode, PursuerMode::Manual);

    let mut lost = false;
    for _ in 0..100 {
        let events = idle(&mut machine);
        if events.contains(&Event::TimeLimitExpired) {
            lost = true;
            break;
        }
    }
    assert!(lost);
    assert_eq!(machine.state(), RoundState::Lost);
    assert_eq!(machine.snapshot().remaining, Some(Duration::ZERO));

    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::RetryRound]));
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.round, RoundState::Running);
    assert_eq!(snapshot.mode, PursuerMode::Automatic);
    assert_eq!(snapshot.pursuer, snapshot.grid.start_corner());
}

#[test]
fn manual_move_into_wall_flashes() {
    let mut ruleset = RulesetConfig::classic();
    ruleset.tuning.wall_probability = 0.0;
    let mut machine = RoundStateMachine::seeded(ruleset, 5);
    start(&mut machine);
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::ToggleMode]));

    let _ = machine.frame(
        FRAME,
        &IntentFrame::from_intents([Intent::MovePursuer(Direction::North)]),
    );
    assert!(machine.snapshot().invalid_move);

    let _ = machine.frame(
        FRAME,
        &IntentFrame::from_intents([Intent::MovePursuer(Direction::South)]),
    );
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.pursuer, Position::new(1, 0));
}

#[test]
fn collected_power_up_reverts_to_open_and_is_not_recollected() {
    let mut ruleset = open_ruleset(RulesetConfig::classic());
    ruleset.tuning.grid_size = 3;
    ruleset.tuning.power_up_count = 7;
    let mut machine = RoundStateMachine::seeded(ruleset, 21);
    start(&mut machine);
    let grid = machine.snapshot().grid;
    assert_eq!(grid.cell(Position::new(0, 1)), Some(CellKind::PowerUp));
    assert_eq!(grid.cell(Position::new(1, 0)), Some(CellKind::PowerUp));

    let mut collected = None;
    for _ in 0..40 {
        let events = idle(&mut machine);
        collected = events.iter().find_map(|event| match event {
            Event::PowerUpCollected { cell } => Some(*cell),
            _ => None,
        });
        if collected.is_some() {
            break;
        }
    }
    let cell = collected.expect("first pursuer step lands on a power-up");
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.round, RoundState::Running);
    assert_eq!(snapshot.pursuer, cell);
    assert_eq!(snapshot.grid.cell(cell), Some(CellKind::Open));
    assert!(snapshot.power_up_remaining.is_some());

    let (away, back) = if cell == Position::new(0, 1) {
        (Direction::West, Direction::East)
    } else {
        (Direction::North, Direction::South)
    };
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::ToggleMode]));
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::MovePursuer(away)]));
    assert_eq!(machine.snapshot().pursuer, Position::new(0, 0));
    let _ = machine.frame(FRAME, &IntentFrame::from_intents([Intent::MovePursuer(back)]));
    assert_eq!(machine.snapshot().pursuer, cell);

    let mut decided = false;
    for _ in 0..20 {
        let events = idle(&mut machine);
        decided |= events.contains(&Event::DecisionDue);
        assert!(!events.contains(&Event::PowerUpCollected { cell }));
    }
    assert!(decided);
}
