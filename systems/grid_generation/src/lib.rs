#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random obstacle layouts validated for corner-to-corner reachability.

use pursuit_core::{CellKind, GenerationError, Grid, GridLayout, Position, Tuning};
use pursuit_system_pathfinding::shortest_path;
use rand::{seq::index, Rng};
use tracing::{debug, warn};

/// Configuration parameters required to construct the grid generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    size: u32,
    wall_probability: f64,
    attempts: u32,
    power_ups: u32,
}

impl Config {
    /// Creates a configuration from explicit parameters.
    #[must_use]
    pub const fn new(size: u32, wall_probability: f64, attempts: u32, power_ups: u32) -> Self {
        Self {
            size,
            wall_probability,
            attempts,
            power_ups,
        }
    }

    /// Reads the generator parameters from the ruleset tuning.
    #[must_use]
    pub const fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(
            tuning.grid_size,
            tuning.wall_probability,
            tuning.generation_attempts,
            tuning.power_up_count,
        )
    }

    /// Number of cells along each side of generated grids.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }
}

/// Produces grids whose start and goal corners are connected whenever the
/// retry budget allows it.
#[derive(Clone, Copy, Debug)]
pub struct GridGenerator {
    config: Config,
}

impl GridGenerator {
    /// Creates a new generator using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the generator was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Generates a layout with power-ups.
    ///
    /// When every attempt fails validation the layout falls back to an
    /// all-open grid flagged as not validated reachable.
    pub fn generate<R>(&self, rng: &mut R) -> GridLayout
    where
        R: Rng + ?Sized,
    {
        let (mut grid, reachable) = match self.try_generate(rng) {
            Ok(grid) => (grid, true),
            Err(error) => {
                warn!(%error, "falling back to an open grid");
                (Grid::open(self.config.size), false)
            }
        };

        let placed = place_power_ups(&mut grid, self.config.power_ups, rng);
        debug!(
            walls = grid.wall_count(),
            power_ups = placed.len(),
            reachable,
            "grid generated"
        );
        GridLayout::new(grid, reachable)
    }

    /// Runs the bounded retry loop and returns the first validated grid.
    pub fn try_generate<R>(&self, rng: &mut R) -> Result<Grid, GenerationError>
    where
        R: Rng + ?Sized,
    {
        for attempt in 1..=self.config.attempts {
            let grid = self.random_walls(rng);
            if corners_connected(&grid) {
                debug!(attempt, "layout validated");
                return Ok(grid);
            }
        }

        Err(GenerationError::UnreachableGoal {
            attempts: self.config.attempts,
        })
    }

    fn random_walls<R>(&self, rng: &mut R) -> Grid
    where
        R: Rng + ?Sized,
    {
        let probability = self.config.wall_probability;
        Grid::from_fn(self.config.size, |_| {
            if rng.gen::<f64>() < probability {
                CellKind::Wall
            } else {
                CellKind::Open
            }
        })
    }
}

/// Reports whether a breadth-first search links the start and goal corners.
#[must_use]
pub fn corners_connected(grid: &Grid) -> bool {
    let start = grid.start_corner();
    let goal = grid.goal_corner();
    start == goal || !shortest_path(grid, start, goal).is_empty()
}

/// Marks up to `count` distinct open, non-corner cells as power-ups, chosen
/// uniformly without replacement. Returns the chosen cells in scan order.
pub fn place_power_ups<R>(grid: &mut Grid, count: u32, rng: &mut R) -> Vec<Position>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<Position> = grid
        .iter()
        .filter(|(position, kind)| *kind == CellKind::Open && !grid.is_corner(*position))
        .map(|(position, _)| position)
        .collect();
    let amount = usize::try_from(count)
        .unwrap_or(usize::MAX)
        .min(candidates.len());

    let mut chosen: Vec<Position> = index::sample(rng, candidates.len(), amount)
        .into_iter()
        .map(|index| candidates[index])
        .filter(|position| grid.place_power_up(*position))
        .collect();
    chosen.sort_unstable();
    chosen
}
