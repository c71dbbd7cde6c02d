/// The step function: advances a round by one frame.
///
/// Processing order per frame:
///   1. Input scheduling (latest non-zero vector wins)
///   2. Clock: which of player / enemy / sync ticks are due
///   3. Player tick: walk, mark, reconnect (region resolution) or hit
///   4. Enemy tick: boss first, then small enemies in id order
///   5. Goal check (one-shot event)
///   6. Sync tick: report and clear the grid-dirty flag
///
/// Grid + entity positions are only mutated here. Once the phase is
/// `GameOver` every call is a no-op that still reports the final state.

use std::time::Duration;

use log::{debug, info};

use crate::domain::ai;
use crate::domain::cell::CellState;
use crate::domain::edge;
use crate::domain::entity::{HitCause, PlayerState};
use crate::domain::grid::{Coord, Dir};
use crate::domain::region::{self, Resolution};
use crate::domain::walk::{self, EnemyMove, MoveContext, PlayerMove};
use super::event::GameEvent;
use super::world::{GameState, Phase};

/// Raw per-frame input from the front end.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub x: f32,
    pub y: f32,
    /// Draw button (only consulted when `draw_requires_action` is set).
    pub action_held: bool,
}

impl FrameInput {
    pub fn new(x: f32, y: f32) -> Self {
        FrameInput { x, y, action_held: false }
    }
}

/// What the front end needs after a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Grid changed and a sync tick fell on this frame: re-render it.
    pub grid_dirty: bool,
    pub player_moved: bool,
    pub fill_fraction: f32,
    pub progress: f32,
    pub mark_strength: f32,
    pub lives: u32,
    pub game_over: bool,
    pub events: Vec<GameEvent>,
}

/// Which mover an enemy-tick step belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mover {
    Boss,
    Enemy(usize),
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn advance(state: &mut GameState, elapsed: Duration, input: FrameInput) -> FrameReport {
    let mut events: Vec<GameEvent> = Vec::new();
    if state.phase == Phase::GameOver {
        return report(state, false, false, events);
    }

    schedule_input(state, input.x, input.y);
    let due = state.clock.advance(elapsed);

    let mut player_moved = false;
    if due.player {
        player_moved = resolve_player_tick(state, input.action_held, &mut events);
    }
    if due.enemy && state.phase == Phase::Playing {
        resolve_enemy_tick(state, &mut events);
    }
    resolve_goal(state, &mut events);

    let grid_dirty = due.sync && state.grid_dirty;
    if grid_dirty {
        state.grid_dirty = false;
    }

    report(state, grid_dirty, player_moved, events)
}

fn report(state: &GameState, grid_dirty: bool, player_moved: bool, events: Vec<GameEvent>) -> FrameReport {
    FrameReport {
        grid_dirty,
        player_moved,
        fill_fraction: state.fill_fraction(),
        progress: state.progress(),
        mark_strength: state.mark_strength(),
        lives: state.player.lives,
        game_over: state.is_game_over(),
        events,
    }
}

// ══════════════════════════════════════════════════════════════
// Input
// ══════════════════════════════════════════════════════════════

/// Keep only the dominant axis; equal magnitudes keep x.
pub fn filter_input(x: f32, y: f32, one_dimensional: bool) -> (f32, f32) {
    if !one_dimensional {
        return (x, y);
    }
    let (ax, ay) = (x.abs(), y.abs());
    if ax > ay {
        (x, 0.0)
    } else if ay > ax {
        (0.0, y)
    } else if ax > 0.0 {
        (x, 0.0)
    } else {
        (0.0, 0.0)
    }
}

fn schedule_input(state: &mut GameState, x: f32, y: f32) {
    let (x, y) = filter_input(x, y, state.rules.one_dimensional_movement);
    if x != 0.0 || y != 0.0 {
        state.scheduled = (x, y);
    }
}

#[inline]
fn sign(v: f32) -> i32 {
    if v > 0.0 { 1 } else if v < 0.0 { -1 } else { 0 }
}

// ══════════════════════════════════════════════════════════════
// Player tick
// ══════════════════════════════════════════════════════════════

fn resolve_player_tick(state: &mut GameState, action_held: bool, events: &mut Vec<GameEvent>) -> bool {
    let (x, y) = state.scheduled;
    state.scheduled = (0.0, 0.0);
    let (dx, dy) = (sign(x), sign(y));
    if dx == 0 && dy == 0 {
        return false;
    }
    move_player(state, dx, dy, action_held, events)
}

/// Try to move the player by `(dx, dy)`. Returns true if the position changed.
pub fn move_player(
    state: &mut GameState,
    dx: i32,
    dy: i32,
    action_held: bool,
    events: &mut Vec<GameEvent>,
) -> bool {
    let from = state.player.pos;
    // Off-grid targets clamp to a no-op
    let target = match state.grid.offset(from, dx, dy) {
        Some(c) => c,
        None => return false,
    };

    let ctx = MoveContext {
        marking: state.player.is_marking(),
        draw_allowed: !state.rules.draw_requires_action || action_held,
        policy: state.rules.safe_ground,
    };

    match walk::classify_player_move(&state.grid, target, ctx) {
        PlayerMove::Blocked => {}
        PlayerMove::Walk => state.player.pos = target,
        PlayerMove::Mark => mark_cell(state, target, events),
        PlayerMove::Reconnect => {
            state.player.pos = target;
            reconnect(state, events);
        }
        PlayerMove::Hit(cause) => player_hit(state, cause, events),
    }

    state.player.pos != from
}

fn mark_cell(state: &mut GameState, target: Coord, events: &mut Vec<GameEvent>) {
    state.grid.put(target, CellState::Marked);
    state.player.path.push(target);
    state.player.pos = target;
    state.grid_dirty = true;

    if !state.player.is_marking() {
        state.player.state = PlayerState::Marking;
        events.push(GameEvent::MarkStarted { at: target });
    }

    let max = state.rules.max_mark_length;
    if max > 0 && state.player.path.len() >= max {
        let path_len = region::discard_path(&mut state.grid, &mut state.player.path);
        state.player.state = PlayerState::OnSafeGround;
        debug!("path hit the length limit ({}), discarded", path_len);
        events.push(GameEvent::FillFailed { path_len });
        return_to_safe_ground(state);
    }
}

fn reconnect(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let rules = state.rules.resolver_rules();
    let resolution = region::resolve(
        &mut state.grid,
        &mut state.player.path,
        &mut state.enemies,
        Some(state.boss.pos),
        &rules,
    );
    state.player.state = PlayerState::OnSafeGround;
    state.grid_dirty = true;

    match resolution {
        Resolution::NoPath => {}
        Resolution::Filled { region_size, path_len, absorbed } => {
            events.push(GameEvent::FillSucceeded { region_size, path_len });
            for e in absorbed {
                events.push(GameEvent::EnemyAbsorbed { id: e.id, at: e.pos });
            }
        }
        Resolution::Discarded { path_len } => {
            events.push(GameEvent::FillFailed { path_len });
        }
    }
}

/// Revert the path, take a life, and put the player back on safe ground.
fn player_hit(state: &mut GameState, cause: HitCause, events: &mut Vec<GameEvent>) {
    region::discard_path(&mut state.grid, &mut state.player.path);
    state.player.state = PlayerState::OnSafeGround;
    state.player.lives = state.player.lives.saturating_sub(1);
    state.grid_dirty = true;

    info!("player hit ({:?}), {} lives left", cause, state.player.lives);
    events.push(GameEvent::PlayerHit { cause, lives_left: state.player.lives });

    return_to_safe_ground(state);

    if state.player.lives == 0 {
        state.phase = Phase::GameOver;
        info!("game over at {:.1}% filled", state.fill_fraction() * 100.0);
        events.push(GameEvent::GameOver);
    }
}

fn return_to_safe_ground(state: &mut GameState) {
    if let Some(c) = edge::nearest_safe(&state.grid, state.player.pos, state.rules.safe_ground) {
        state.player.pos = c;
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy tick
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_tick(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let tuning = state.tuning;

    if let Some(dir) = ai::boss_intent(&mut state.rng, &tuning) {
        move_enemy(state, Mover::Boss, dir, events);
    }

    let fill = state.fill_fraction();
    for i in 0..state.enemies.len() {
        if state.phase != Phase::Playing { break; }
        let pos = state.enemies[i].pos;
        let player = state.player.pos;
        if let Some(dir) = ai::enemy_intent(&mut state.rng, pos, player, fill, &tuning) {
            move_enemy(state, Mover::Enemy(i), dir, events);
        }
    }
}

/// Apply one enemy-tick step. A blocked target leaves the mover in place;
/// reaching the live path is a player hit and the mover stays put.
pub fn move_enemy(state: &mut GameState, mover: Mover, dir: Dir, events: &mut Vec<GameEvent>) {
    let from = match mover {
        Mover::Boss => state.boss.pos,
        Mover::Enemy(i) => match state.enemies.get(i) {
            Some(e) => e.pos,
            None => return,
        },
    };
    let target = match state.grid.step(from, dir) {
        Some(c) => c,
        None => return,
    };

    match walk::classify_enemy_move(&state.grid, target) {
        EnemyMove::Blocked => {}
        EnemyMove::Move => {
            state.grid.put(from, CellState::Free);
            state.grid.put(target, CellState::Enemy);
            match mover {
                Mover::Boss => state.boss.pos = target,
                Mover::Enemy(i) => state.enemies[i].pos = target,
            }
            state.grid_dirty = true;
        }
        EnemyMove::HitPath => {
            let cause = match mover {
                Mover::Boss => HitCause::BossReachedPath,
                Mover::Enemy(_) => HitCause::EnemyReachedPath,
            };
            player_hit(state, cause, events);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Goal
// ══════════════════════════════════════════════════════════════

fn resolve_goal(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.goal_reached { return; }
    if state.fill_fraction() >= state.completion_goal {
        state.goal_reached = true;
        info!("completion goal reached: {:.1}%", state.fill_fraction() * 100.0);
        events.push(GameEvent::GoalReached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::ai::EnemyTuning;
    use crate::domain::grid::Grid;
    use crate::domain::region::RegionWindow;
    use crate::domain::walk::SafeGroundPolicy;
    use crate::sim::world::InitParams;
    use proptest::prelude::*;

    const TICK: Duration = Duration::from_millis(64);

    /// Enemies that never move; no small enemies unless asked.
    fn still_config() -> GameConfig {
        let mut cfg = GameConfig::default();
        cfg.enemies = EnemyTuning {
            boss_move_chance: 0.0,
            chase_base: 0.0,
            chase_per_fill: 0.0,
            hold_chance: 1.0,
        };
        cfg.rules.region_window = RegionWindow::UNBOUNDED;
        cfg
    }

    fn state_with(size: usize, player: Coord, boss: Coord, cfg: &GameConfig) -> GameState {
        let params = InitParams {
            grid_size: size,
            enemy_count: 0,
            lives: 3,
            player_start: player,
            boss_start: boss,
        };
        GameState::initialize(&params, cfg, 5).unwrap()
    }

    fn walk_to(state: &mut GameState, dir: Dir, n: usize) -> Vec<GameEvent> {
        let (dx, dy) = dir.delta();
        let mut events = Vec::new();
        for _ in 0..n {
            move_player(state, dx, dy, false, &mut events);
        }
        events
    }

    /// Put an enemy onto the grid by hand.
    fn add_enemy(state: &mut GameState, c: Coord) -> usize {
        let id = state.enemies.len();
        state.grid.put(c, CellState::Enemy);
        state.enemies.push(crate::domain::entity::Enemy::new(id, c));
        id
    }

    #[test]
    fn input_filter_keeps_dominant_axis() {
        assert_eq!(filter_input(0.8, 0.3, true), (0.8, 0.0));
        assert_eq!(filter_input(0.2, -0.9, true), (0.0, -0.9));
        assert_eq!(filter_input(0.5, 0.5, true), (0.5, 0.0));
        assert_eq!(filter_input(0.0, 0.0, true), (0.0, 0.0));
        assert_eq!(filter_input(0.5, 0.5, false), (0.5, 0.5));
    }

    #[test]
    fn latest_non_zero_input_wins() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 5), &cfg);
        let ms = Duration::from_millis;

        let r = advance(&mut s, ms(10), FrameInput::new(1.0, 0.0));
        assert!(!r.player_moved);
        advance(&mut s, ms(10), FrameInput::new(0.0, 1.0));
        // Zero input does not clear the schedule; the tick fires here
        let r = advance(&mut s, ms(50), FrameInput::default());
        assert!(r.player_moved);
        assert_eq!(s.player.pos, Coord::new(3, 1));
        assert!(s.player.is_marking());
        assert_eq!(r.events, vec![GameEvent::MarkStarted { at: Coord::new(3, 1) }]);

        // Consumed: the next tick does nothing
        let r = advance(&mut s, TICK, FrameInput::default());
        assert!(!r.player_moved);
        assert_eq!(s.player.pos, Coord::new(3, 1));
    }

    #[test]
    fn off_grid_moves_clamp() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(0, 0), Coord::new(5, 5), &cfg);
        let mut events = Vec::new();
        assert!(!move_player(&mut s, -1, 0, false, &mut events));
        assert!(!move_player(&mut s, 0, -1, false, &mut events));
        assert_eq!(s.player.pos, Coord::new(0, 0));
        assert!(events.is_empty());
        // Along the border is a plain walk
        assert!(move_player(&mut s, 1, 0, false, &mut events));
        assert!(s.player.is_safe());
    }

    #[test]
    fn enclosing_a_pocket_claims_it() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 5), &cfg);

        let events = walk_to(&mut s, Dir::Up, 9);
        assert_eq!(s.player.pos, Coord::new(3, 9));
        assert!(s.player.is_safe());
        assert!(s.player.path.is_empty());
        assert!(events.contains(&GameEvent::FillSucceeded { region_size: 16, path_len: 8 }));

        for y in 1..=8 {
            assert_eq!(s.grid.state(Coord::new(1, y)), CellState::Taken);
            assert_eq!(s.grid.state(Coord::new(2, y)), CellState::Taken);
            assert_eq!(s.grid.state(Coord::new(3, y)), CellState::Edge);
            assert_eq!(s.grid.state(Coord::new(4, y)), CellState::Free);
        }
        assert_eq!(s.grid.state(Coord::new(7, 5)), CellState::Enemy);
        assert_eq!(s.grid.claimed(), 36 + 16 + 8);
    }

    #[test]
    fn boss_side_is_never_claimed() {
        let cfg = still_config();
        // Boss in the left pocket: the right side gets claimed instead
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(1, 4), &cfg);
        let events = walk_to(&mut s, Dir::Up, 9);
        assert!(events.contains(&GameEvent::FillSucceeded { region_size: 40, path_len: 8 }));
        assert_eq!(s.grid.state(Coord::new(1, 4)), CellState::Enemy);
        assert_eq!(s.grid.state(Coord::new(2, 4)), CellState::Free);
        assert_eq!(s.grid.state(Coord::new(6, 6)), CellState::Taken);
    }

    #[test]
    fn fill_fails_when_every_side_is_poisoned() {
        let mut cfg = still_config();
        cfg.rules.scoring = crate::domain::region::ScoringPolicy::AnyEnemy;
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(1, 4), &cfg);
        add_enemy(&mut s, Coord::new(6, 6));

        let events = walk_to(&mut s, Dir::Up, 9);
        assert!(events.contains(&GameEvent::FillFailed { path_len: 8 }));
        for y in 1..=8 {
            assert_eq!(s.grid.state(Coord::new(3, y)), CellState::Free);
        }
        assert_eq!(s.player.pos, Coord::new(3, 9));
        assert!(s.player.is_safe());
        assert_eq!(s.player.lives, 3);
    }

    #[test]
    fn enclosed_enemies_are_absorbed() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 5), &cfg);
        let id = add_enemy(&mut s, Coord::new(1, 6));

        let events = walk_to(&mut s, Dir::Up, 9);
        assert!(events.contains(&GameEvent::EnemyAbsorbed { id, at: Coord::new(1, 6) }));
        assert!(s.enemies.is_empty());
        assert_eq!(s.grid.state(Coord::new(1, 6)), CellState::Taken);
    }

    #[test]
    fn enemy_reaching_path_reverts_it() {
        let cfg = still_config();
        let mut s = state_with(64, Coord::new(5, 0), Coord::new(40, 40), &cfg);
        let path = [Coord::new(5, 5), Coord::new(5, 6), Coord::new(5, 7)];
        for &c in &path {
            s.grid.put(c, CellState::Marked);
            s.player.path.push(c);
        }
        s.player.pos = Coord::new(5, 7);
        s.player.state = PlayerState::Marking;
        let i = add_enemy(&mut s, Coord::new(6, 7));

        let mut events = Vec::new();
        move_enemy(&mut s, Mover::Enemy(i), Dir::Left, &mut events);

        assert_eq!(s.player.lives, 2);
        for &c in &path {
            assert_eq!(s.grid.state(c), CellState::Free);
        }
        assert!(s.player.path.is_empty());
        assert!(s.player.is_safe());
        // From (5, 7) the closest border along an axis is x = 0
        assert_eq!(s.player.pos, Coord::new(0, 7));
        // The enemy did not move onto the path
        assert_eq!(s.enemies[i].pos, Coord::new(6, 7));
        assert_eq!(
            events,
            vec![GameEvent::PlayerHit { cause: HitCause::EnemyReachedPath, lives_left: 2 }],
        );
    }

    #[test]
    fn enemy_step_vacates_and_occupies() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 7), &cfg);
        let i = add_enemy(&mut s, Coord::new(4, 4));
        s.grid_dirty = false;

        let mut events = Vec::new();
        move_enemy(&mut s, Mover::Enemy(i), Dir::Up, &mut events);

        assert_eq!(s.grid.state(Coord::new(4, 4)), CellState::Free);
        assert_eq!(s.grid.state(Coord::new(4, 5)), CellState::Enemy);
        assert_eq!(s.enemies[i].pos, Coord::new(4, 5));
        assert!(s.grid_dirty);
        assert!(events.is_empty());
        assert_eq!(s.player.lives, 3);
    }

    #[test]
    fn boss_step_vacates_and_occupies() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(5, 5), &cfg);
        s.grid_dirty = false;

        let mut events = Vec::new();
        move_enemy(&mut s, Mover::Boss, Dir::Right, &mut events);

        assert_eq!(s.grid.state(Coord::new(5, 5)), CellState::Free);
        assert_eq!(s.grid.state(Coord::new(6, 5)), CellState::Enemy);
        assert_eq!(s.boss.pos, Coord::new(6, 5));
        assert!(s.grid_dirty);
        assert!(events.is_empty());
    }

    #[test]
    fn blocked_enemy_step_changes_nothing() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(5, 5), &cfg);
        let i = add_enemy(&mut s, Coord::new(1, 1));
        add_enemy(&mut s, Coord::new(4, 5));
        s.grid_dirty = false;
        let before = s.grid.clone();

        let mut events = Vec::new();
        // Enemy into the border, boss into another enemy
        move_enemy(&mut s, Mover::Enemy(i), Dir::Left, &mut events);
        move_enemy(&mut s, Mover::Boss, Dir::Left, &mut events);

        assert_eq!(s.grid, before);
        assert_eq!(s.enemies[i].pos, Coord::new(1, 1));
        assert_eq!(s.boss.pos, Coord::new(5, 5));
        assert!(!s.grid_dirty);
        assert!(events.is_empty());
    }

    #[test]
    fn boss_reaching_path_is_a_boss_hit() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(4, 4), &cfg);
        walk_to(&mut s, Dir::Up, 4);
        assert_eq!(s.grid.state(Coord::new(3, 4)), CellState::Marked);

        let mut events = Vec::new();
        move_enemy(&mut s, Mover::Boss, Dir::Left, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::PlayerHit { cause: HitCause::BossReachedPath, lives_left: 2 }],
        );
        assert_eq!(s.boss.pos, Coord::new(4, 4));
        assert_eq!(s.grid.count(CellState::Marked), 0);
    }

    #[test]
    fn crossing_own_path_is_a_hit() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 7), &cfg);
        walk_to(&mut s, Dir::Up, 3);
        walk_to(&mut s, Dir::Right, 1);
        walk_to(&mut s, Dir::Down, 1);
        let events = walk_to(&mut s, Dir::Left, 1);
        assert_eq!(
            events,
            vec![GameEvent::PlayerHit { cause: HitCause::CrossedPath, lives_left: 2 }],
        );
        assert_eq!(s.grid.count(CellState::Marked), 0);
        assert!(s.player.is_safe());
    }

    #[test]
    fn running_into_an_enemy_is_a_hit() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 7), &cfg);
        add_enemy(&mut s, Coord::new(3, 3));
        walk_to(&mut s, Dir::Up, 2);
        let events = walk_to(&mut s, Dir::Up, 1);
        assert_eq!(
            events,
            vec![GameEvent::PlayerHit { cause: HitCause::RanIntoEnemy, lives_left: 2 }],
        );
        assert_eq!(s.grid.state(Coord::new(3, 3)), CellState::Enemy);
        assert_eq!(s.player.pos, Coord::new(3, 0));
    }

    #[test]
    fn path_at_max_length_is_discarded() {
        let cfg = still_config();
        let mut s = state_with(64, Coord::new(0, 1), Coord::new(32, 40), &cfg);

        let events = walk_to(&mut s, Dir::Right, 62);
        assert_eq!(s.player.path.len(), 62);
        assert!(events.iter().all(|e| !matches!(e, GameEvent::FillFailed { .. })));

        walk_to(&mut s, Dir::Up, 1);
        assert_eq!(s.player.path.len(), 63);
        let events = walk_to(&mut s, Dir::Up, 1);

        assert_eq!(events, vec![GameEvent::FillFailed { path_len: 64 }]);
        assert_eq!(s.grid.count(CellState::Marked), 0);
        assert!(s.player.is_safe());
        assert_eq!(s.player.lives, 3);
        // From (62, 3) the right border is one step away
        assert_eq!(s.player.pos, Coord::new(63, 3));
    }

    #[test]
    fn draw_button_gates_new_paths() {
        let mut cfg = still_config();
        cfg.rules.draw_requires_action = true;
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 7), &cfg);
        let mut events = Vec::new();

        assert!(!move_player(&mut s, 0, 1, false, &mut events));
        assert!(move_player(&mut s, 0, 1, true, &mut events));
        // Once marking, the button no longer matters
        assert!(move_player(&mut s, 0, 1, false, &mut events));
        assert_eq!(s.player.path.len(), 2);
    }

    #[test]
    fn claim_frontier_keeps_player_off_interior() {
        let mut cfg = still_config();
        cfg.rules.safe_ground = SafeGroundPolicy::ClaimFrontier;
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 5), &cfg);
        walk_to(&mut s, Dir::Up, 9);
        // (1, 1) is claimed but enclosed by claimed cells on all sides
        assert!(!walk::is_standable(&s.grid, Coord::new(1, 1), SafeGroundPolicy::ClaimFrontier));
        s.player.pos = Coord::new(3, 1);
        let mut events = Vec::new();
        assert!(!move_player(&mut s, -1, 0, false, &mut events));
    }

    #[test]
    fn last_life_ends_the_round() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 7), &cfg);
        s.player.lives = 1;
        add_enemy(&mut s, Coord::new(3, 2));
        walk_to(&mut s, Dir::Up, 1);
        let events = walk_to(&mut s, Dir::Up, 1);
        assert_eq!(events.last(), Some(&GameEvent::GameOver));
        assert!(s.is_game_over());

        let before = s.grid.clone();
        let r = advance(&mut s, Duration::from_secs(1), FrameInput::new(1.0, 0.0));
        assert!(r.game_over);
        assert!(r.events.is_empty());
        assert_eq!(r.lives, 0);
        assert_eq!(s.grid, before);
    }

    #[test]
    fn goal_event_fires_once() {
        let mut cfg = still_config();
        cfg.grid.completion_goal = 0.5;
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(1, 4), &cfg);
        for _ in 0..9 {
            advance(&mut s, TICK, FrameInput::new(0.0, 1.0));
        }
        // 36 border + 40 claimed + 8 edge
        assert!(s.fill_fraction() >= 0.5);
        assert!(s.goal_reached);
        let r = advance(&mut s, TICK, FrameInput::default());
        assert!(!r.events.contains(&GameEvent::GoalReached));
        assert_eq!(r.progress, 1.0);
    }

    #[test]
    fn sync_tick_reports_dirty_grid_once() {
        let cfg = still_config();
        let mut s = state_with(10, Coord::new(3, 0), Coord::new(7, 7), &cfg);
        // Fresh state is dirty; the sync tick (32ms) reports it
        let r = advance(&mut s, Duration::from_millis(32), FrameInput::default());
        assert!(r.grid_dirty);
        let r = advance(&mut s, Duration::from_millis(32), FrameInput::default());
        assert!(!r.grid_dirty);
    }

    #[test]
    fn same_seed_same_round() {
        let run = || {
            let cfg = GameConfig::default();
            let mut s = GameState::from_config(&cfg, 1234).unwrap();
            let dirs = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
            let mut all = Vec::new();
            for i in 0..400 {
                let (x, y) = dirs[(i / 7) % 4];
                let r = advance(&mut s, Duration::from_millis(16), FrameInput::new(x, y));
                all.extend(r.events);
            }
            (s.grid, s.player.pos, all)
        };
        assert_eq!(run(), run());
    }

    fn check_invariants(s: &GameState) {
        let g: &Grid = &s.grid;
        let n = g.size();
        for i in 0..n {
            for c in [Coord::new(i, 0), Coord::new(i, n - 1), Coord::new(0, i), Coord::new(n - 1, i)] {
                assert!(g.state(c).is_claimed(), "border {:?} is {:?}", c, g.state(c));
            }
        }
        assert_eq!(g.count(CellState::Marked), s.player.path.len());
        for &c in s.player.path.cells() {
            assert_eq!(g.state(c), CellState::Marked);
        }
        if s.player.is_safe() {
            assert!(s.player.path.is_empty());
            assert!(g.state(s.player.pos).is_safe());
        } else {
            assert_eq!(s.player.path.head(), Some(s.player.pos));
        }
        assert_eq!(g.count(CellState::Enemy), s.enemies.len() + 1);
        assert_eq!(g.state(s.boss.pos), CellState::Enemy);
        for e in &s.enemies {
            assert_eq!(g.state(e.pos), CellState::Enemy);
        }
    }

    proptest! {
        #[test]
        fn random_play_keeps_grid_consistent(
            seed in any::<u64>(),
            moves in proptest::collection::vec((0usize..5, 1u64..80), 1..300),
        ) {
            let mut cfg = GameConfig::default();
            cfg.grid.size = 16;
            cfg.grid.lives = 1000;
            cfg.rules.region_window = RegionWindow { min_exclusive: 0, max_exclusive: 200 };
            let mut s = GameState::from_config(&cfg, seed).unwrap();
            let dirs = [(0.0, 0.0), (1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];
            for (d, ms) in moves {
                let (x, y) = dirs[d];
                advance(&mut s, Duration::from_millis(ms), FrameInput::new(x, y));
                check_invariants(&s);
            }
        }
    }
}
