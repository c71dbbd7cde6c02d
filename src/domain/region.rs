/// Region resolution: what gets claimed when a path reconnects.
///
/// ## Pipeline
///
///   1. **Seed**: for every path cell, probe its four sides in
///      `Dir::SEED_ORDER`. A side that is off the path, fillable, and not
///      already inside an earlier candidate seeds a new flood fill.
///   2. **Flood**: 4-connected fill over `Free` + `Enemy` cells, clipped at
///      the grid edge. Each fill is one connected component.
///   3. **Score**: 0 if the region holds the boss (or, under
///      `ScoringPolicy::AnyEnemy`, any enemy cell); otherwise its size.
///   4. **Select**: smallest positive score whose size fits the window.
///      Ties go to the region discovered first.
///   5. **Resolve**: path cells become `Edge` on success, `Free` on failure;
///      selected cells become `Taken`; enemies inside are absorbed.
///
/// Every fillable cell is visited at most once per resolution because
/// covered cells never seed again, so a resolution is O(N²).

use log::debug;
use serde::Deserialize;

use super::cell::CellState;
use super::entity::{Enemy, MarkedPath};
use super::grid::{Coord, Dir, Grid};

/// What makes a candidate region unclaimable.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Only the boss's cell poisons a region.
    #[default]
    BossOnly,
    /// Any `Enemy` cell poisons a region.
    AnyEnemy,
}

/// Exclusive size bounds for a claimable region.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegionWindow {
    pub min_exclusive: usize,
    pub max_exclusive: usize,
}

impl RegionWindow {
    pub const UNBOUNDED: RegionWindow = RegionWindow { min_exclusive: 0, max_exclusive: usize::MAX };

    #[inline]
    pub fn admits(&self, size: usize) -> bool {
        size > self.min_exclusive && size < self.max_exclusive
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ResolverRules {
    pub window: RegionWindow,
    pub scoring: ScoringPolicy,
}

impl Default for ResolverRules {
    fn default() -> Self {
        ResolverRules { window: RegionWindow::UNBOUNDED, scoring: ScoringPolicy::BossOnly }
    }
}

/// One connected component found from a path side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub cells: Vec<Coord>,
    pub score: usize,
}

impl Region {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.cells.contains(&c)
    }
}

/// All candidates in discovery order plus the chosen one.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FillPlan {
    pub regions: Vec<Region>,
    pub selected: Option<usize>,
}

impl FillPlan {
    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.map(|i| &self.regions[i])
    }
}

/// Outcome of resolving a reconnection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to resolve: the path was empty.
    NoPath,
    Filled { region_size: usize, path_len: usize, absorbed: Vec<Enemy> },
    Discarded { path_len: usize },
}

/// Dense per-cell membership flags.
struct CellMask {
    size: usize,
    bits: Vec<bool>,
}

impl CellMask {
    fn new(size: usize) -> Self {
        CellMask { size, bits: vec![false; size * size] }
    }

    #[inline]
    fn insert(&mut self, c: Coord) {
        self.bits[c.y * self.size + c.x] = true;
    }

    #[inline]
    fn contains(&self, c: Coord) -> bool {
        self.bits[c.y * self.size + c.x]
    }
}

// ══════════════════════════════════════════════════════════════
// Candidate search (pure)
// ══════════════════════════════════════════════════════════════

/// Seed, flood, score and select. Pure function of its inputs.
pub fn determine_fill_areas(
    grid: &Grid,
    path: &[Coord],
    boss: Option<Coord>,
    rules: &ResolverRules,
) -> FillPlan {
    if path.is_empty() {
        return FillPlan::default();
    }

    let mut covered = CellMask::new(grid.size());
    let mut regions: Vec<Region> = Vec::new();

    for &cell in path {
        for dir in Dir::SEED_ORDER {
            let seed = match grid.step(cell, dir) {
                Some(c) => c,
                None => continue,
            };
            if covered.contains(seed) { continue; }
            if !grid.state(seed).is_fillable() { continue; }

            let cells = flood_fill(grid, seed, &mut covered);
            let score = score_region(grid, &cells, boss, rules.scoring);
            regions.push(Region { cells, score });
        }
    }

    let selected = select_region(&regions, rules.window);
    FillPlan { regions, selected }
}

/// 4-connected fill over fillable cells from `seed`. Marks every visited
/// cell in `covered` so later seeds inside this component are skipped.
fn flood_fill(grid: &Grid, seed: Coord, covered: &mut CellMask) -> Vec<Coord> {
    let mut cells = Vec::new();
    let mut stack = vec![seed];
    covered.insert(seed);

    while let Some(c) = stack.pop() {
        cells.push(c);
        for dir in Dir::SEED_ORDER {
            if let Some(n) = grid.step(c, dir) {
                if !covered.contains(n) && grid.state(n).is_fillable() {
                    covered.insert(n);
                    stack.push(n);
                }
            }
        }
    }

    cells
}

/// 0 = unclaimable, otherwise the cell count.
pub fn score_region(
    grid: &Grid,
    cells: &[Coord],
    boss: Option<Coord>,
    scoring: ScoringPolicy,
) -> usize {
    let poisoned = match scoring {
        ScoringPolicy::BossOnly => boss.map_or(false, |b| cells.contains(&b)),
        ScoringPolicy::AnyEnemy => cells.iter().any(|&c| grid.state(c) == CellState::Enemy),
    };
    if poisoned { 0 } else { cells.len() }
}

/// Index of the smallest positive score inside `window`; first found wins ties.
pub fn select_region(regions: &[Region], window: RegionWindow) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, r) in regions.iter().enumerate() {
        if r.score == 0 || !window.admits(r.len()) { continue; }
        match best {
            Some((_, score)) if r.score >= score => {}
            _ => best = Some((i, r.score)),
        }
    }
    best.map(|(i, _)| i)
}

// ══════════════════════════════════════════════════════════════
// Resolution (mutating)
// ══════════════════════════════════════════════════════════════

/// Resolve a reconnection: claim the selected region or discard the path.
/// The path is always empty afterwards.
pub fn resolve(
    grid: &mut Grid,
    path: &mut MarkedPath,
    enemies: &mut Vec<Enemy>,
    boss: Option<Coord>,
    rules: &ResolverRules,
) -> Resolution {
    if path.is_empty() {
        return Resolution::NoPath;
    }

    let plan = determine_fill_areas(grid, path.cells(), boss, rules);
    let cells = path.take();
    let path_len = cells.len();

    let region = match plan.selected_region() {
        Some(r) => r,
        None => {
            debug!("fill failed: {} candidates, path of {}", plan.regions.len(), path_len);
            for c in cells {
                grid.put(c, CellState::Free);
            }
            return Resolution::Discarded { path_len };
        }
    };

    promote_edges(grid);
    for &c in &cells {
        grid.put(c, CellState::Edge);
    }

    let mut inside = CellMask::new(grid.size());
    for &c in &region.cells {
        inside.insert(c);
        grid.put(c, CellState::Taken);
    }

    let mut absorbed = Vec::new();
    enemies.retain(|e| {
        if inside.contains(e.pos) {
            absorbed.push(e.clone());
            false
        } else {
            true
        }
    });

    debug!(
        "filled {} cells ({} candidates), path of {}, {} enemies absorbed",
        region.len(), plan.regions.len(), path_len, absorbed.len(),
    );

    Resolution::Filled { region_size: region.len(), path_len, absorbed }
}

/// Revert a live path to `Free` without resolving it.
pub fn discard_path(grid: &mut Grid, path: &mut MarkedPath) -> usize {
    let cells = path.take();
    for &c in &cells {
        grid.put(c, CellState::Free);
    }
    cells.len()
}

/// The previous claim's boundary stops being "new".
fn promote_edges(grid: &mut Grid) {
    let edges: Vec<Coord> = grid.iter()
        .filter(|&(_, s)| s == CellState::Edge)
        .map(|(c, _)| c)
        .collect();
    for c in edges {
        grid.put(c, CellState::Taken);
    }
}
