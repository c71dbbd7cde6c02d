/// Walkability rules: truth-table driven.
///
/// Pure functions over the grid; no side effects.
/// These encode "what is legal" without performing the move.
///
/// ## Player Entry Table
/// ┌─────────────────────────┬──────────────────────┬────────────────────────┐
/// │ Target state            │ Result               │ Notes                  │
/// ├─────────────────────────┼──────────────────────┼────────────────────────┤
/// │ outside grid / None     │ Blocked              │ clamp at edges         │
/// │ Marked                  │ Hit (CrossedPath)    │ own live path          │
/// │ Enemy                   │ Hit (RanIntoEnemy)   │ collision, not a move  │
/// │ Free, marking           │ Mark                 │ extend path            │
/// │ Free, on safe ground    │ Mark if draw allowed │ starts a new path      │
/// │ Edge                    │ Walk / Reconnect     │ always safe ground     │
/// │ Taken, Strict           │ Walk / Reconnect     │                        │
/// │ Taken, ClaimFrontier    │ only next to open    │ interior is off-limits │
/// └─────────────────────────┴──────────────────────┴────────────────────────┘
///
/// "Reconnect" is a safe cell entered while marking; it triggers resolution.
///
/// ## Enemy Entry Table
/// ┌──────────────┬───────────┐
/// │ Target state │ Result    │
/// ├──────────────┼───────────┤
/// │ Free         │ Move      │
/// │ Marked       │ HitPath   │
/// │ anything else│ Blocked   │
/// └──────────────┴───────────┘

use serde::Deserialize;

use super::cell::CellState;
use super::entity::HitCause;
use super::grid::{Coord, Grid};

/// Which claimed cells the player may stand on.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SafeGroundPolicy {
    /// Every cell at least as safe as `Edge` is enterable.
    #[default]
    Strict,
    /// `Edge` cells, and `Taken` cells touching at least one unclaimed cell.
    ClaimFrontier,
}

/// Player-side inputs to the entry predicate.
#[derive(Clone, Copy, Debug)]
pub struct MoveContext {
    pub marking: bool,
    /// May a new path be started from safe ground this tick?
    pub draw_allowed: bool,
    pub policy: SafeGroundPolicy,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerMove {
    Blocked,
    /// Step along safe ground.
    Walk,
    /// Enter a free cell and mark it.
    Mark,
    /// Enter safe ground while a path is live.
    Reconnect,
    /// The move is a collision.
    Hit(HitCause),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyMove {
    Blocked,
    Move,
    HitPath,
}

/// A `Taken` cell that borders at least one unclaimed cell
/// (`Free`, `Enemy` or `Marked`).
pub fn is_claim_frontier(grid: &Grid, c: Coord) -> bool {
    grid.state(c) == CellState::Taken
        && grid.neighbors(c).any(|n| {
            matches!(grid.state(n), CellState::Free | CellState::Enemy | CellState::Marked)
        })
}

/// Is `c` safe ground the player may stand on under `policy`?
pub fn is_standable(grid: &Grid, c: Coord, policy: SafeGroundPolicy) -> bool {
    match grid.state(c) {
        CellState::Edge => true,
        CellState::Taken => match policy {
            SafeGroundPolicy::Strict => true,
            SafeGroundPolicy::ClaimFrontier => is_claim_frontier(grid, c),
        },
        _ => false,
    }
}

/// Pure walkability: may the player occupy `target`?
/// Enemy and Marked cells are never walkable; the collision they cause
/// is reported by `classify_player_move`.
pub fn can_enter(grid: &Grid, target: Coord, ctx: MoveContext) -> bool {
    match grid.state(target) {
        CellState::Free => ctx.marking || ctx.draw_allowed,
        CellState::Edge | CellState::Taken => is_standable(grid, target, ctx.policy),
        CellState::None | CellState::Enemy | CellState::Marked => false,
    }
}

/// What happens if the player steps into `target`. See the table above.
pub fn classify_player_move(grid: &Grid, target: Coord, ctx: MoveContext) -> PlayerMove {
    match grid.state(target) {
        CellState::None => PlayerMove::Blocked,
        CellState::Marked => PlayerMove::Hit(HitCause::CrossedPath),
        CellState::Enemy => PlayerMove::Hit(HitCause::RanIntoEnemy),
        CellState::Free if can_enter(grid, target, ctx) => PlayerMove::Mark,
        CellState::Free => PlayerMove::Blocked,
        _ if !can_enter(grid, target, ctx) => PlayerMove::Blocked,
        _ if ctx.marking => PlayerMove::Reconnect,
        _ => PlayerMove::Walk,
    }
}

/// What happens if an enemy (or the boss) steps into `target`.
pub fn classify_enemy_move(grid: &Grid, target: Coord) -> EnemyMove {
    match grid.state(target) {
        CellState::Free => EnemyMove::Move,
        CellState::Marked => EnemyMove::HitPath,
        _ => EnemyMove::Blocked,
    }
}
