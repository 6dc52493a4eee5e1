use pursuit_core::{Difficulty, Grid, Position, RulesetConfig};
use pursuit_system_evader::EvaderPolicy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn stay_frequency_tracks_stay_weight() {
    let policy = EvaderPolicy::from_ruleset(&RulesetConfig::timed());
    let grid = Grid::open(20);
    let mut rng = ChaCha8Rng::seed_from_u64(0x0005_7a75);
    let evader = Position::new(10, 10);
    let trials = 10_000;

    let stays = (0..trials)
        .filter(|_| {
            let next = policy.decide(
                evader,
                Position::new(0, 0),
                Difficulty::Medium,
                &grid,
                &mut rng,
            );
            next == evader
        })
        .count();

    let frequency = stays as f64 / f64::from(trials);
    assert!(
        (0.07..0.13).contains(&frequency),
        "stay frequency {frequency} outside expected band"
    );
}

#[test]
fn harder_avoid_policy_moves_away_more_often() {
    let policy = EvaderPolicy::from_ruleset(&RulesetConfig::timed());
    let grid = Grid::open(20);
    let evader = Position::new(10, 10);
    let pursuer = Position::new(8, 8);

    let retreat_rate = |difficulty: Difficulty| {
        let mut rng = ChaCha8Rng::seed_from_u64(0x00a7_0001);
        let retreats = (0..5_000)
            .filter(|_| {
                let next = policy.decide(evader, pursuer, difficulty, &grid, &mut rng);
                next.manhattan_distance(pursuer) > evader.manhattan_distance(pursuer)
            })
            .count();
        retreats as f64 / 5_000.0
    };

    let easy = retreat_rate(Difficulty::Easy);
    let hard = retreat_rate(Difficulty::Hard);
    assert!(hard > easy, "hard {hard} should retreat more than easy {easy}");
}

#[test]
fn decisions_stay_on_the_grid() {
    for ruleset in [RulesetConfig::classic(), RulesetConfig::timed()] {
        let policy = EvaderPolicy::from_ruleset(&ruleset);
        let grid = Grid::from_ascii(
            "
            .....
            .#.#.
            .....
            .#.#.
            .....
            ",
        )
        .expect("valid grid");
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut evader = grid.goal_corner();

        for _ in 0..500 {
            let next = policy.decide(
                evader,
                grid.start_corner(),
                Difficulty::Hard,
                &grid,
                &mut rng,
            );
            assert!(grid.is_passable(next));
            assert!(next.manhattan_distance(evader) <= 1);
            evader = next;
        }
    }
}
