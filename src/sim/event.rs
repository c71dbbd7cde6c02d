/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound.

use crate::domain::entity::HitCause;
use crate::domain::grid::Coord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// The player left safe ground; `at` is the first marked cell.
    MarkStarted { at: Coord },
    FillSucceeded { region_size: usize, path_len: usize },
    /// The path was discarded: no qualifying region, or it grew too long.
    FillFailed { path_len: usize },
    EnemyAbsorbed { id: usize, at: Coord },
    PlayerHit { cause: HitCause, lives_left: u32 },
    GameOver,
    /// Fill fraction reached the completion goal (fires once).
    GoalReached,
}
