#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stateless grid search used by both actors.
//!
//! Every search runs over an immutable [`Grid`] and treats walls as
//! impassable while power-up cells remain walkable. Paths never include the
//! start cell, so the first element is always the next step to take.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
};

use pursuit_core::{Grid, Path, Position, RoutingError};

/// Breadth-first shortest path from `start` to `goal`.
///
/// Neighbours are expanded in up, down, left, right order, so the returned
/// route is the first shortest path discovered in that order. Returns an empty
/// path when `goal` is impassable, unreachable, or equal to `start`.
#[must_use]
pub fn shortest_path(grid: &Grid, start: Position, goal: Position) -> Path {
    if start == goal || !grid.contains(start) || !grid.is_passable(goal) {
        return Path::empty();
    }

    let mut came_from = SearchTree::new(grid);
    came_from.mark_root(start);
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            return came_from.unwind(start, goal);
        }

        for neighbor in grid.passable_neighbors(cell) {
            if came_from.visit(neighbor, cell) {
                queue.push_back(neighbor);
            }
        }
    }

    Path::empty()
}

/// Heuristic best-first (A*) path from `start` to `goal`.
///
/// Uses unit step costs with the Manhattan distance as the estimate. Frontier
/// entries with equal `g + h` are expanded in insertion order. Returns an empty
/// path when `goal` is impassable, unreachable, or equal to `start`.
#[must_use]
pub fn best_first_path(grid: &Grid, start: Position, goal: Position) -> Path {
    if start == goal || !grid.contains(start) || !grid.is_passable(goal) {
        return Path::empty();
    }

    let mut came_from = SearchTree::new(grid);
    came_from.mark_root(start);
    let mut cost = vec![u32::MAX; came_from.len()];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    if let Some(index) = came_from.index(start) {
        cost[index] = 0;
    }
    open.push(Reverse((start.manhattan_distance(goal), sequence, start)));

    while let Some(Reverse((_, _, cell))) = open.pop() {
        if cell == goal {
            return came_from.unwind(start, goal);
        }

        let Some(current_index) = came_from.index(cell) else {
            continue;
        };
        let next_cost = cost[current_index].saturating_add(1);

        for neighbor in grid.passable_neighbors(cell) {
            let Some(neighbor_index) = came_from.index(neighbor) else {
                continue;
            };
            if cost[neighbor_index] <= next_cost {
                continue;
            }

            cost[neighbor_index] = next_cost;
            came_from.set_parent(neighbor, cell);
            sequence += 1;
            let estimate = next_cost.saturating_add(neighbor.manhattan_distance(goal));
            open.push(Reverse((estimate, sequence, neighbor)));
        }
    }

    Path::empty()
}

/// Graduated routing used to move the automatic pursuer toward a target.
///
/// An impassable target is first replaced by the passable cell closest to it.
/// The route then comes from [`shortest_path`], then [`best_first_path`], and
/// finally a single greedy step to the passable neighbour closest to the
/// target. `start == target` yields an empty path, meaning there is nothing
/// left to do. [`RoutingError::NoRoute`] is returned only when the grid has no
/// passable cell at all or the start is fully enclosed.
pub fn route_toward(grid: &Grid, start: Position, target: Position) -> Result<Path, RoutingError> {
    let no_route = RoutingError::NoRoute {
        from: start,
        target,
    };
    let target = if grid.is_passable(target) {
        target
    } else {
        nearest_passable(grid, target).ok_or(no_route)?
    };

    if start == target {
        return Ok(Path::empty());
    }

    let path = shortest_path(grid, start, target);
    if !path.is_empty() {
        return Ok(path);
    }

    let path = best_first_path(grid, start, target);
    if !path.is_empty() {
        return Ok(path);
    }

    grid.passable_neighbors(start)
        .min_by_key(|neighbor| neighbor.manhattan_distance(target))
        .map(|neighbor| Path::new(vec![neighbor]))
        .ok_or(no_route)
}

/// Passable cell minimising the Manhattan distance to `target`.
///
/// Ties resolve to the earliest cell in scan order.
#[must_use]
pub fn nearest_passable(grid: &Grid, target: Position) -> Option<Position> {
    grid.passable_positions()
        .min_by_key(|cell| cell.manhattan_distance(target))
}

/// Passable cell maximising the Manhattan distance from `from`.
///
/// Ties resolve to the earliest cell in scan order.
#[must_use]
pub fn farthest_passable(grid: &Grid, from: Position) -> Option<Position> {
    grid.passable_positions()
        .fold(None, |best: Option<(Position, u32)>, cell| {
            let distance = cell.manhattan_distance(from);
            match best {
                Some((_, best_distance)) if best_distance >= distance => best,
                _ => Some((cell, distance)),
            }
        })
        .map(|(cell, _)| cell)
}

/// Dense parent table shared by both searches.
struct SearchTree {
    size: u32,
    parents: Vec<Option<Position>>,
}

impl SearchTree {
    fn new(grid: &Grid) -> Self {
        let size = grid.size();
        let cells = usize::try_from(u64::from(size) * u64::from(size)).unwrap_or(0);
        Self {
            size,
            parents: vec![None; cells],
        }
    }

    fn len(&self) -> usize {
        self.parents.len()
    }

    fn index(&self, cell: Position) -> Option<usize> {
        if cell.row() >= self.size || cell.column() >= self.size {
            return None;
        }
        let index = u64::from(cell.row()) * u64::from(self.size) + u64::from(cell.column());
        usize::try_from(index).ok()
    }

    fn mark_root(&mut self, root: Position) {
        self.set_parent(root, root);
    }

    fn set_parent(&mut self, cell: Position, parent: Position) {
        if let Some(slot) = self.index(cell).and_then(|index| self.parents.get_mut(index)) {
            *slot = Some(parent);
        }
    }

    /// Records `parent` for an unvisited cell. Returns `false` when the cell
    /// was already reached.
    fn visit(&mut self, cell: Position, parent: Position) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.parents.get_mut(index)) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(parent);
        true
    }

    fn parent(&self, cell: Position) -> Option<Position> {
        self.index(cell)
            .and_then(|index| self.parents.get(index).copied().flatten())
    }

    fn unwind(&self, start: Position, goal: Position) -> Path {
        let mut cells = Vec::new();
        let mut current = goal;
        while current != start {
            cells.push(current);
            match self.parent(current) {
                Some(parent) if parent != current => current = parent,
                _ => return Path::empty(),
            }
        }
        cells.reverse();
        Path::new(cells)
    }
}
