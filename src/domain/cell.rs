/// Cell states and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.
///
/// The declaration order is the threshold order used by the rules:
/// `None < Free < Enemy < Marked < Edge < Taken`.
/// "At least Edge" means safe, claimed ground.

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum CellState {
    None,
    Free,   // Unclaimed, enterable
    Enemy,  // Occupied by an enemy or the boss
    Marked, // Part of the player's live path
    Edge,   // Boundary of the most recent claim
    Taken,  // Claimed territory
}

impl CellState {
    /// Safe ground: the player is not exposed while standing here.
    #[inline]
    pub fn is_safe(self) -> bool {
        self >= CellState::Edge
    }

    /// Counts toward the fill fraction.
    #[inline]
    pub fn is_claimed(self) -> bool {
        self.is_safe()
    }

    /// Can a flood fill pass through this cell?
    /// Enemies inside an enclosed pocket do not stop the fill.
    #[inline]
    pub fn is_fillable(self) -> bool {
        matches!(self, CellState::Free | CellState::Enemy)
    }

    /// Ramp level used by renderers (0..=100, `None` is -1).
    pub fn shade(self) -> i32 {
        match self {
            CellState::None => -1,
            CellState::Free => 12,
            CellState::Enemy => 37,
            CellState::Marked => 62,
            CellState::Edge => 87,
            CellState::Taken => 100,
        }
    }
}

impl Default for CellState {
    fn default() -> Self {
        CellState::Free
    }
}
