/// The N×N cell-state grid.
///
/// Storage is a flat row-major `Vec<CellState>` indexed by `y * size + x`.
/// The grid keeps a running count of claimed cells (`Edge` + `Taken`) so the
/// fill fraction is O(1); every write goes through `put()` to keep it exact.
///
/// Coordinates follow the source game: `Up` is +y, `Right` is +x.
/// No neighbour logic beyond bounds-checked offsets lives here.

use thiserror::Error;

use super::cell::CellState;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the {size}x{size} grid")]
    OutOfBounds { x: i64, y: i64, size: usize },
}

/// A grid coordinate. Only constructed in-bounds by `Grid` helpers,
/// but plain construction is allowed for tests and callers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }

    pub fn manhattan(self, other: Coord) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Cardinal direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Right,
    Left,
    Up,
    Down,
}

impl Dir {
    /// +x, −x, +y, −y. Also the edge-return tie-break order.
    pub const ALL: [Dir; 4] = [Dir::Right, Dir::Left, Dir::Up, Dir::Down];

    /// Order in which the resolver probes the sides of each path cell.
    pub const SEED_ORDER: [Dir; 4] = [Dir::Down, Dir::Up, Dir::Left, Dir::Right];

    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Right => (1, 0),
            Dir::Left => (-1, 0),
            Dir::Up => (0, 1),
            Dir::Down => (0, -1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<CellState>,
    claimed: usize,
}

impl Grid {
    /// All cells `Free`, no border.
    pub fn filled(size: usize, state: CellState) -> Self {
        let claimed = if state.is_claimed() { size * size } else { 0 };
        Grid { size, cells: vec![state; size * size], claimed }
    }

    /// Interior `Free`, outer ring `Taken`.
    pub fn bordered(size: usize) -> Self {
        let mut grid = Grid::filled(size, CellState::Free);
        for i in 0..size {
            grid.put(Coord::new(i, 0), CellState::Taken);
            grid.put(Coord::new(i, size - 1), CellState::Taken);
            grid.put(Coord::new(0, i), CellState::Taken);
            grid.put(Coord::new(size - 1, i), CellState::Taken);
        }
        grid
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.size * self.size
    }

    /// Number of `Edge` + `Taken` cells.
    #[inline]
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// Claimed cells / N².
    pub fn fill_fraction(&self) -> f32 {
        if self.cells.is_empty() { return 0.0; }
        self.claimed as f32 / self.area() as f32
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.x < self.size && c.y < self.size
    }

    #[inline]
    pub fn is_border(&self, c: Coord) -> bool {
        c.x == 0 || c.y == 0 || c.x + 1 == self.size || c.y + 1 == self.size
    }

    #[inline]
    fn index(&self, c: Coord) -> usize {
        c.y * self.size + c.x
    }

    /// Bounds-checked read.
    pub fn get(&self, x: i64, y: i64) -> Result<CellState, GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds { x, y, size: self.size });
        }
        Ok(self.cells[self.index(Coord::new(x as usize, y as usize))])
    }

    /// Bounds-checked write.
    pub fn set(&mut self, x: i64, y: i64, state: CellState) -> Result<(), GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds { x, y, size: self.size });
        }
        self.put(Coord::new(x as usize, y as usize), state);
        Ok(())
    }

    /// Read by coordinate; `None` outside the grid.
    #[inline]
    pub fn cell(&self, c: Coord) -> Option<CellState> {
        if self.contains(c) { Some(self.cells[self.index(c)]) } else { None }
    }

    /// Read by coordinate; outside the grid reads as `CellState::None`.
    #[inline]
    pub fn state(&self, c: Coord) -> CellState {
        self.cell(c).unwrap_or(CellState::None)
    }

    /// Write by coordinate. Callers only pass coordinates produced by
    /// `offset()` / `step()`, so an out-of-range write is a logic error.
    pub fn put(&mut self, c: Coord, state: CellState) {
        debug_assert!(self.contains(c), "write outside grid: {:?}", c);
        if !self.contains(c) { return; }
        let i = self.index(c);
        let old = self.cells[i];
        if old.is_claimed() && !state.is_claimed() {
            self.claimed -= 1;
        } else if !old.is_claimed() && state.is_claimed() {
            self.claimed += 1;
        }
        self.cells[i] = state;
    }

    /// `c + (dx, dy)` if it stays inside the grid.
    #[inline]
    pub fn offset(&self, c: Coord, dx: i32, dy: i32) -> Option<Coord> {
        let nx = c.x as i64 + dx as i64;
        let ny = c.y as i64 + dy as i64;
        if self.in_bounds(nx, ny) {
            Some(Coord::new(nx as usize, ny as usize))
        } else {
            None
        }
    }

    #[inline]
    pub fn step(&self, c: Coord, dir: Dir) -> Option<Coord> {
        let (dx, dy) = dir.delta();
        self.offset(c, dx, dy)
    }

    /// In-bounds 4-neighbours of `c`, in `Dir::ALL` order.
    pub fn neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        Dir::ALL.into_iter().filter_map(move |d| self.step(c, d))
    }

    /// Row-major iteration over every cell.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, CellState)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &s)| {
            (Coord::new(i % self.size, i / self.size), s)
        })
    }

    /// Count cells in a given state.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == state).count()
    }
}

#[cfg(test)]
impl Grid {
    /// Build a grid from ASCII art: `#` Taken, `E` Edge, `m` Marked,
    /// `x` Enemy, anything else Free. The first row is the highest y.
    pub(crate) fn from_art(rows: &[&str]) -> Grid {
        let n = rows.len();
        let mut g = Grid::filled(n, CellState::Free);
        for (row, line) in rows.iter().enumerate() {
            let y = n - 1 - row;
            for (x, ch) in line.chars().enumerate() {
                let s = match ch {
                    '#' => CellState::Taken,
                    'E' => CellState::Edge,
                    'm' => CellState::Marked,
                    'x' => CellState::Enemy,
                    _ => CellState::Free,
                };
                g.put(Coord::new(x, y), s);
            }
        }
        g
    }
}
