/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use log::warn;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::domain::ai::EnemyTuning;
use crate::domain::region::{RegionWindow, ResolverRules, ScoringPolicy};
use crate::domain::walk::SafeGroundPolicy;

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub enemies: EnemyTuning,
    /// Fixed RNG seed; `None` lets the front end pick one.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridConfig {
    pub size: usize,
    pub enemy_count: usize,
    pub lives: u32,
    pub completion_goal: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub player_tick_ms: u64,
    pub sync_tick_ms: u64,
    pub enemy_tick_ms: u64,
    pub frame_sleep_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub max_mark_length: usize,
    pub region_window: RegionWindow,
    pub safe_ground: SafeGroundPolicy,
    pub scoring: ScoringPolicy,
    pub one_dimensional_movement: bool,
    pub draw_requires_action: bool,
}

impl TimingConfig {
    pub fn player_tick(&self) -> Duration { Duration::from_millis(self.player_tick_ms) }
    pub fn sync_tick(&self) -> Duration { Duration::from_millis(self.sync_tick_ms) }
    pub fn enemy_tick(&self) -> Duration { Duration::from_millis(self.enemy_tick_ms) }
    pub fn frame_sleep(&self) -> Duration { Duration::from_millis(self.frame_sleep_ms) }
}

impl RulesConfig {
    pub fn resolver_rules(&self) -> ResolverRules {
        ResolverRules { window: self.region_window, scoring: self.scoring }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    enemies: TomlEnemies,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_size")]
    size: usize,
    #[serde(default = "default_enemy_count")]
    enemy_count: usize,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_completion_goal")]
    completion_goal: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_player_tick")]
    player_tick_ms: u64,
    #[serde(default = "default_sync_tick")]
    sync_tick_ms: u64,
    #[serde(default = "default_enemy_tick")]
    enemy_tick_ms: u64,
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_max_mark")]
    max_mark_length: usize,
    #[serde(default = "default_min_region")]
    min_region_size: usize,
    #[serde(default = "default_max_region")]
    max_region_size: usize,
    #[serde(default)]
    safe_ground: SafeGroundPolicy,
    #[serde(default)]
    scoring: ScoringPolicy,
    #[serde(default = "default_true")]
    one_dimensional_movement: bool,
    #[serde(default)]
    draw_requires_action: bool,
}

#[derive(Deserialize, Debug)]
struct TomlEnemies {
    #[serde(default = "default_boss_move")]
    boss_move_chance: f64,
    #[serde(default = "default_chase_base")]
    chase_base: f64,
    #[serde(default = "default_chase_per_fill")]
    chase_per_fill: f64,
    #[serde(default = "default_hold")]
    enemy_hold_chance: f64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_size() -> usize { 64 }
fn default_enemy_count() -> usize { 3 }
fn default_lives() -> u32 { 3 }
fn default_completion_goal() -> f32 { 0.8 }
fn default_player_tick() -> u64 { 64 }
fn default_sync_tick() -> u64 { 32 }
fn default_enemy_tick() -> u64 { 160 }
fn default_frame_sleep() -> u64 { 5 }
fn default_max_mark() -> usize { 64 }
fn default_min_region() -> usize { 16 }   // exclusive
fn default_max_region() -> usize { 1024 } // exclusive, keeps out the "everything else" side
fn default_true() -> bool { true }
fn default_boss_move() -> f64 { 0.9 }
fn default_chase_base() -> f64 { 0.1 }
fn default_chase_per_fill() -> f64 { 0.8 }
fn default_hold() -> f64 { 0.2 }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid {
            size: default_size(),
            enemy_count: default_enemy_count(),
            lives: default_lives(),
            completion_goal: default_completion_goal(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            player_tick_ms: default_player_tick(),
            sync_tick_ms: default_sync_tick(),
            enemy_tick_ms: default_enemy_tick(),
            frame_sleep_ms: default_frame_sleep(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            max_mark_length: default_max_mark(),
            min_region_size: default_min_region(),
            max_region_size: default_max_region(),
            safe_ground: SafeGroundPolicy::default(),
            scoring: ScoringPolicy::default(),
            one_dimensional_movement: default_true(),
            draw_requires_action: false,
        }
    }
}

impl Default for TomlEnemies {
    fn default() -> Self {
        TomlEnemies {
            boss_move_chance: default_boss_move(),
            chase_base: default_chase_base(),
            chase_per_fill: default_chase_per_fill(),
            enemy_hold_chance: default_hold(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            grid: GridConfig {
                size: t.grid.size,
                enemy_count: t.grid.enemy_count,
                lives: t.grid.lives,
                completion_goal: t.grid.completion_goal,
            },
            timing: TimingConfig {
                player_tick_ms: t.timing.player_tick_ms,
                sync_tick_ms: t.timing.sync_tick_ms,
                enemy_tick_ms: t.timing.enemy_tick_ms,
                frame_sleep_ms: t.timing.frame_sleep_ms,
            },
            rules: RulesConfig {
                max_mark_length: t.rules.max_mark_length,
                region_window: RegionWindow {
                    min_exclusive: t.rules.min_region_size,
                    max_exclusive: t.rules.max_region_size,
                },
                safe_ground: t.rules.safe_ground,
                scoring: t.rules.scoring,
                one_dimensional_movement: t.rules.one_dimensional_movement,
                draw_requires_action: t.rules.draw_requires_action,
            },
            enemies: EnemyTuning {
                boss_move_chance: t.enemies.boss_move_chance,
                chase_base: t.enemies.chase_base,
                chase_per_fill: t.enemies.chase_per_fill,
                hold_chance: t.enemies.enemy_hold_chance,
            },
            seed: t.general.seed,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs()).into()
    }

    /// Parse a config document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(cfg.into())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!("config.toml parse error: {e}; using default settings");
                    return TomlConfig::default();
                }
            },
            Err(e) => warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}
