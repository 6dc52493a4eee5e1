#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stochastic decision policy of the evader.

mod table;

use pursuit_core::{Difficulty, DifficultyWeights, EvaderPolicyKind, Grid, Position, RulesetConfig};
use pursuit_system_pathfinding::{best_first_path, farthest_passable};
use rand::{seq::SliceRandom, Rng};

pub use table::{EvaderAction, WeightedTable};

/// Chooses the evader's next cell on each decision tick.
///
/// The policy holds configuration only; [`EvaderPolicy::decide`] reads the
/// grid and positions without mutating anything but the random source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaderPolicy {
    kind: EvaderPolicyKind,
    weights: DifficultyWeights,
    close_range_distance: u32,
}

impl EvaderPolicy {
    /// Creates a policy from explicit parameters.
    #[must_use]
    pub const fn new(
        kind: EvaderPolicyKind,
        weights: DifficultyWeights,
        close_range_distance: u32,
    ) -> Self {
        Self {
            kind,
            weights,
            close_range_distance,
        }
    }

    /// Creates the policy described by the ruleset.
    #[must_use]
    pub const fn from_ruleset(ruleset: &RulesetConfig) -> Self {
        Self::new(
            ruleset.evader_policy,
            ruleset.evader_weights,
            ruleset.tuning.close_range_distance,
        )
    }

    /// Behaviour family of the policy.
    #[must_use]
    pub const fn kind(&self) -> EvaderPolicyKind {
        self.kind
    }

    /// Decides where the evader goes next.
    ///
    /// Returns `evader` unchanged when the evader stays, including whenever it
    /// has no passable neighbour.
    pub fn decide<R>(
        &self,
        evader: Position,
        pursuer: Position,
        difficulty: Difficulty,
        grid: &Grid,
        rng: &mut R,
    ) -> Position
    where
        R: Rng + ?Sized,
    {
        let neighbors: Vec<Position> = grid.passable_neighbors(evader).collect();
        if neighbors.is_empty() {
            return evader;
        }

        let weights = self.weights.for_difficulty(difficulty);
        if self.kind == EvaderPolicyKind::CloseRange
            && evader.manhattan_distance(pursuer) <= self.close_range_distance
        {
            if rng.gen::<f64>() >= weights.close_range {
                return random_neighbor(&neighbors, evader, rng);
            }
            if let Some(step) = flee(grid, evader, pursuer) {
                return step;
            }
        }

        let action = WeightedTable::for_weights(weights)
            .select(rng.gen::<f64>())
            .unwrap_or(EvaderAction::Stay);
        match action {
            EvaderAction::Random => random_neighbor(&neighbors, evader, rng),
            EvaderAction::Purposeful => match self.kind {
                EvaderPolicyKind::CloseRange => roam(grid, evader, rng),
                EvaderPolicyKind::Avoid => avoid(&neighbors, evader, pursuer),
            },
            EvaderAction::Stay => evader,
        }
    }
}

fn random_neighbor<R>(neighbors: &[Position], evader: Position, rng: &mut R) -> Position
where
    R: Rng + ?Sized,
{
    neighbors.choose(rng).copied().unwrap_or(evader)
}

/// First step of a best-first path toward the cell farthest from the pursuer.
fn flee(grid: &Grid, evader: Position, pursuer: Position) -> Option<Position> {
    let refuge = farthest_passable(grid, pursuer)?;
    best_first_path(grid, evader, refuge).first()
}

/// First step of a best-first path toward a uniformly random passable cell.
fn roam<R>(grid: &Grid, evader: Position, rng: &mut R) -> Position
where
    R: Rng + ?Sized,
{
    let cells: Vec<Position> = grid.passable_positions().collect();
    cells
        .choose(rng)
        .and_then(|destination| best_first_path(grid, evader, *destination).first())
        .unwrap_or(evader)
}

/// Neighbour maximising the distance from the pursuer, first in
/// up, down, left, right order on ties.
fn avoid(neighbors: &[Position], evader: Position, pursuer: Position) -> Position {
    neighbors
        .iter()
        .copied()
        .fold(None, |best: Option<(Position, u32)>, cell| {
            let distance = cell.manhattan_distance(pursuer);
            match best {
                Some((_, best_distance)) if best_distance >= distance => best,
                _ => Some((cell, distance)),
            }
        })
        .map_or(evader, |(cell, _)| cell)
}
