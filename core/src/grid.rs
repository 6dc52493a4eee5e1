//! Square cell grid shared by every system.

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Traversable empty cell.
    Open,
    /// Impassable obstacle.
    Wall,
    /// Traversable cell bearing a collectible power-up.
    PowerUp,
}

impl CellKind {
    /// Reports whether actors may enter the cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    /// Character used for the cell in text layouts.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Open => '.',
            Self::Wall => '#',
            Self::PowerUp => '*',
        }
    }
}

/// Square matrix of cells with two designated corner cells.
///
/// The start corner `(0, 0)` and the goal corner `(size - 1, size - 1)` are
/// never walls. Every constructor enforces this.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    size: u32,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Creates a grid in which every cell is open.
    #[must_use]
    pub fn open(size: u32) -> Self {
        Self::from_fn(size, |_| CellKind::Open)
    }

    /// Creates a grid by evaluating `cell_at` for every position in scan order.
    ///
    /// Both corners are forced open regardless of what `cell_at` returns.
    #[must_use]
    pub fn from_fn<F>(size: u32, mut cell_at: F) -> Self
    where
        F: FnMut(Position) -> CellKind,
    {
        let side = usize::try_from(size).unwrap_or(0);
        let mut cells = Vec::with_capacity(side.saturating_mul(side));
        for row in 0..size {
            for column in 0..size {
                let position = Position::new(row, column);
                let kind = if is_corner(size, position) {
                    CellKind::Open
                } else {
                    cell_at(position)
                };
                cells.push(kind);
            }
        }
        Self { size, cells }
    }

    /// Parses a grid from rows of `.` (open), `#` (wall) and `*` (power-up).
    ///
    /// Blank lines and surrounding whitespace are ignored.
    pub fn from_ascii(text: &str) -> Result<Self, GridParseError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let size = u32::try_from(rows.len()).map_err(|_| GridParseError::TooLarge)?;
        if size == 0 {
            return Err(GridParseError::Empty);
        }

        let mut cells = Vec::with_capacity(rows.len() * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let width = row.chars().count();
            if width != rows.len() {
                return Err(GridParseError::NotSquare {
                    row: row_index,
                    width,
                    expected: rows.len(),
                });
            }
            for glyph in row.chars() {
                let kind = match glyph {
                    '.' => CellKind::Open,
                    '#' => CellKind::Wall,
                    '*' => CellKind::PowerUp,
                    other => return Err(GridParseError::UnknownGlyph(other)),
                };
                cells.push(kind);
            }
        }

        let grid = Self { size, cells };
        if !grid.is_passable(grid.start_corner()) || !grid.is_passable(grid.goal_corner()) {
            return Err(GridParseError::WalledCorner);
        }
        Ok(grid)
    }

    /// Number of cells along each side.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Corner where the pursuer starts.
    #[must_use]
    pub const fn start_corner(&self) -> Position {
        Position::new(0, 0)
    }

    /// Corner where the evader starts.
    #[must_use]
    pub const fn goal_corner(&self) -> Position {
        let last = self.size.saturating_sub(1);
        Position::new(last, last)
    }

    /// Reports whether the position is one of the two designated corners.
    #[must_use]
    pub fn is_corner(&self, position: Position) -> bool {
        is_corner(self.size, position)
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.row() < self.size && position.column() < self.size
    }

    /// Contents of the cell at `position`, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<CellKind> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the position lies inside the grid and is not a wall.
    #[must_use]
    pub fn is_passable(&self, position: Position) -> bool {
        self.cell(position).is_some_and(CellKind::is_passable)
    }

    /// Iterates over every cell in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellKind)> + '_ {
        let size = self.size;
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            (Position::new(index / size, index % size), *kind)
        })
    }

    /// Iterates over every passable cell in scan order.
    pub fn passable_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.iter()
            .filter(|(_, kind)| kind.is_passable())
            .map(|(position, _)| position)
    }

    /// Passable 4-connected neighbours of `position` in up, down, left, right order.
    pub fn passable_neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        let size = self.size;
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| position.step(direction, size))
            .filter(|neighbor| self.is_passable(*neighbor))
    }

    /// Marks an open, non-corner cell as bearing a power-up.
    ///
    /// Returns `false` and leaves the grid untouched for any other cell.
    pub fn place_power_up(&mut self, position: Position) -> bool {
        if self.is_corner(position) {
            return false;
        }
        self.replace(position, CellKind::Open, CellKind::PowerUp)
    }

    /// Reverts a power-up cell to open.
    ///
    /// Returns `false` when the cell bore no power-up.
    pub fn consume_power_up(&mut self, position: Position) -> bool {
        self.replace(position, CellKind::PowerUp, CellKind::Open)
    }

    /// Number of wall cells.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|kind| **kind == CellKind::Wall)
            .count()
    }

    /// Renders the grid using the glyphs accepted by [`Grid::from_ascii`].
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let side = usize::try_from(self.size).unwrap_or(0);
        let mut out = String::with_capacity(self.cells.len() + side);
        for row in self.cells.chunks(side.max(1)) {
            out.extend(row.iter().map(|kind| kind.glyph()));
            out.push('\n');
        }
        out
    }

    fn replace(&mut self, position: Position, expected: CellKind, next: CellKind) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        match self.cells.get_mut(index) {
            Some(slot) if *slot == expected => {
                *slot = next;
                true
            }
            _ => false,
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.row()).ok()?;
        let column = usize::try_from(position.column()).ok()?;
        let width = usize::try_from(self.size).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn is_corner(size: u32, position: Position) -> bool {
    let last = size.saturating_sub(1);
    position == Position::new(0, 0) || position == Position::new(last, last)
}

/// Grid together with its power-up placement and validation status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridLayout {
    grid: Grid,
    power_ups: Vec<Position>,
    reachable: bool,
}

impl GridLayout {
    /// Wraps a grid, collecting its power-up cells in scan order.
    #[must_use]
    pub fn new(grid: Grid, reachable: bool) -> Self {
        let power_ups = grid
            .iter()
            .filter(|(_, kind)| *kind == CellKind::PowerUp)
            .map(|(position, _)| position)
            .collect();
        Self {
            grid,
            power_ups,
            reachable,
        }
    }

    /// Layout without walls or power-ups.
    #[must_use]
    pub fn open(size: u32) -> Self {
        Self::new(Grid::open(size), true)
    }

    /// Grid contents of the layout.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cells bearing a power-up.
    #[must_use]
    pub fn power_ups(&self) -> &[Position] {
        &self.power_ups
    }

    /// Whether the corners were validated as connected.
    #[must_use]
    pub const fn reachable(&self) -> bool {
        self.reachable
    }

    /// Splits the layout into its grid, power-up cells and validation flag.
    #[must_use]
    pub fn into_parts(self) -> (Grid, Vec<Position>, bool) {
        (self.grid, self.power_ups, self.reachable)
    }
}

/// Errors produced when parsing an ASCII grid.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridParseError {
    /// The input contained no rows.
    #[error("grid contains no rows")]
    Empty,
    /// The input contained more rows than a grid can index.
    #[error("grid is too large")]
    TooLarge,
    /// A row's width differs from the number of rows.
    #[error("row {row} has width {width}, expected {expected}")]
    NotSquare {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the offending row.
        width: usize,
        /// Width required for a square grid.
        expected: usize,
    },
    /// The input contained a character that does not describe a cell.
    #[error("unknown cell glyph {0:?}")]
    UnknownGlyph(char),
    /// One of the designated corners is a wall.
    #[error("start and goal corners must not be walls")]
    WalledCorner,
}
