/// GameState: the complete snapshot of a running round.
///
/// ## Grid Ownership
///
/// The grid is the single source of truth for territory and occupancy:
///   - every enemy and the boss stand on an `Enemy` cell
///   - every cell of the live path is `Marked`
///   - the outer ring starts `Taken` and never becomes `Free`
///
/// Entity positions (`player.pos`, `enemies[i].pos`, `boss.pos`) mirror the
/// grid. All mutation goes through `sim::step`, which keeps both in sync.
///
/// ## Randomness
///
/// One `ChaCha8Rng`, seeded at initialization, drives enemy placement and
/// every movement roll. Same seed + same frame inputs = same round.

use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::config::{GameConfig, RulesConfig};
use crate::domain::ai::EnemyTuning;
use crate::domain::cell::CellState;
use crate::domain::entity::{Boss, Enemy, Player};
use crate::domain::grid::{Coord, Grid};
use crate::domain::edge;
use super::clock::SimulationClock;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InitError {
    #[error("grid size {0} is too small (minimum 3)")]
    GridTooSmall(usize),
    #[error("player start {0:?} is not safe ground")]
    PlayerStartNotSafe(Coord),
    #[error("boss start {0:?} is not a free interior cell")]
    BossStartNotFree(Coord),
    #[error("cannot place {requested} enemies in {available} free cells")]
    TooManyEnemies { requested: usize, available: usize },
}

/// Everything `initialize` needs besides the config.
#[derive(Clone, Debug)]
pub struct InitParams {
    pub grid_size: usize,
    pub enemy_count: usize,
    pub lives: u32,
    pub player_start: Coord,
    pub boss_start: Coord,
}

impl InitParams {
    /// Player in the bottom-left corner, boss in the middle.
    pub fn from_config(config: &GameConfig) -> Self {
        let size = config.grid.size;
        InitParams {
            grid_size: size,
            enemy_count: config.grid.enemy_count,
            lives: config.grid.lives,
            player_start: Coord::new(0, 0),
            boss_start: Coord::new(size / 2, size / 2),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub grid: Grid,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Boss,
    pub phase: Phase,
    pub clock: SimulationClock,
    pub rules: RulesConfig,
    pub tuning: EnemyTuning,
    pub completion_goal: f32,

    /// Latest non-zero input, consumed by the next player tick.
    pub scheduled: (f32, f32),
    /// Grid changed since the last render sync.
    pub grid_dirty: bool,
    pub goal_reached: bool,

    pub(crate) rng: ChaCha8Rng,
}

impl GameState {
    /// Build the bordered grid and place the boss, the enemies and the player.
    pub fn initialize(params: &InitParams, config: &GameConfig, seed: u64) -> Result<Self, InitError> {
        let size = params.grid_size;
        if size < 3 {
            return Err(InitError::GridTooSmall(size));
        }

        let mut grid = Grid::bordered(size);

        if !grid.contains(params.player_start) || !grid.state(params.player_start).is_safe() {
            return Err(InitError::PlayerStartNotSafe(params.player_start));
        }
        if grid.state(params.boss_start) != CellState::Free {
            return Err(InitError::BossStartNotFree(params.boss_start));
        }
        grid.put(params.boss_start, CellState::Enemy);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let free: Vec<Coord> = grid.iter()
            .filter(|&(_, s)| s == CellState::Free)
            .map(|(c, _)| c)
            .collect();
        if params.enemy_count > free.len() {
            return Err(InitError::TooManyEnemies {
                requested: params.enemy_count,
                available: free.len(),
            });
        }
        let enemies: Vec<Enemy> = free
            .choose_multiple(&mut rng, params.enemy_count)
            .enumerate()
            .map(|(id, &c)| Enemy::new(id, c))
            .collect();
        for e in &enemies {
            grid.put(e.pos, CellState::Enemy);
        }

        // Corners are not frontier cells; settle on standable ground
        let player_start = edge::nearest_safe(&grid, params.player_start, config.rules.safe_ground)
            .ok_or(InitError::PlayerStartNotSafe(params.player_start))?;

        info!(
            "round start: {}x{} grid, {} enemies, {} lives, seed {}",
            size, size, enemies.len(), params.lives, seed,
        );

        Ok(GameState {
            grid,
            player: Player::new(player_start, params.lives),
            enemies,
            boss: Boss::new(params.boss_start),
            phase: Phase::Playing,
            clock: SimulationClock::from_timing(&config.timing),
            rules: config.rules.clone(),
            tuning: config.enemies,
            completion_goal: config.grid.completion_goal,
            scheduled: (0.0, 0.0),
            grid_dirty: true,
            goal_reached: false,
            rng,
        })
    }

    /// Default layout for `config`.
    pub fn from_config(config: &GameConfig, seed: u64) -> Result<Self, InitError> {
        GameState::initialize(&InitParams::from_config(config), config, seed)
    }

    /// Read-only view of the grid for the renderer.
    pub fn snapshot_grid(&self) -> &Grid {
        &self.grid
    }

    pub fn fill_fraction(&self) -> f32 {
        self.grid.fill_fraction()
    }

    /// Fill fraction relative to the completion goal, clamped to 0..=1.
    pub fn progress(&self) -> f32 {
        if self.completion_goal <= 0.0 { return 1.0; }
        (self.fill_fraction() / self.completion_goal).clamp(0.0, 1.0)
    }

    pub fn mark_strength(&self) -> f32 {
        if self.rules.max_mark_length == 0 { return 1.0; }
        self.player.mark_strength(self.rules.max_mark_length)
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}
