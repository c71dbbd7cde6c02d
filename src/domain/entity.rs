/// Entities: Player (with its marked path), small Enemies, the Boss.
/// The player state machine is two states; everything else is position.

use super::grid::Coord;

/// Player state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    OnSafeGround,
    Marking,
}

/// Why the player lost a life.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitCause {
    /// Player stepped into an enemy or the boss.
    RanIntoEnemy,
    /// Player stepped back onto its own live path.
    CrossedPath,
    /// A small enemy reached the path (or the player on it).
    EnemyReachedPath,
    /// The boss reached the path (or the player on it).
    BossReachedPath,
}

/// The cells traced since leaving safe ground, in traversal order.
/// The last cell is always the player's position while marking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkedPath {
    cells: Vec<Coord>,
}

impl MarkedPath {
    pub fn new() -> Self {
        MarkedPath { cells: Vec::with_capacity(64) }
    }

    pub fn push(&mut self, c: Coord) {
        debug_assert!(!self.contains(c), "path revisits {:?}", c);
        self.cells.push(c);
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.cells.contains(&c)
    }

    pub fn head(&self) -> Option<Coord> {
        self.cells.last().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// Hand the cells over and leave the path empty.
    pub fn take(&mut self) -> Vec<Coord> {
        std::mem::take(&mut self.cells)
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Coord,
    pub state: PlayerState,
    pub path: MarkedPath,
    pub lives: u32,
}

impl Player {
    pub fn new(pos: Coord, lives: u32) -> Self {
        Player {
            pos,
            state: PlayerState::OnSafeGround,
            path: MarkedPath::new(),
            lives,
        }
    }

    /// True iff standing on safe ground (not marking).
    #[inline]
    pub fn is_safe(&self) -> bool {
        self.state == PlayerState::OnSafeGround
    }

    #[inline]
    pub fn is_marking(&self) -> bool {
        self.state == PlayerState::Marking
    }

    /// Fraction of the path budget still unused: 1.0 on safe ground,
    /// 0.0 when the path is at its maximum length.
    pub fn mark_strength(&self, max_mark_length: usize) -> f32 {
        if max_mark_length == 0 { return 0.0; }
        let used = self.path.len().min(max_mark_length);
        1.0 - used as f32 / max_mark_length as f32
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub id: usize,
    pub pos: Coord,
}

impl Enemy {
    pub fn new(id: usize, pos: Coord) -> Self {
        Enemy { id, pos }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boss {
    pub pos: Coord,
}

impl Boss {
    pub fn new(pos: Coord) -> Self {
        Boss { pos }
    }
}
