/// Edge return: where the player lands after a hit or a discarded path.
///
/// Four straight scans from the current cell (+x, −x, +y, −y). Each scan
/// stops at the first safe, standable cell or once it can no longer beat
/// the best distance found so far. The closest hit wins; equal distances
/// keep the earlier scan direction.
///
/// This is not a true shortest path, only an axis-aligned approximation.
/// Claimed territory around the player is usually axis-convex, so it
/// lands where a player expects.

use super::grid::{Coord, Dir, Grid};
use super::walk::{self, SafeGroundPolicy};

/// Nearest safe cell by axis scan, or `None` if no scan finds one.
pub fn scan_nearest_safe(grid: &Grid, from: Coord, policy: SafeGroundPolicy) -> Option<Coord> {
    if walk::is_standable(grid, from, policy) {
        return Some(from);
    }

    let mut best: Option<(usize, Coord)> = None;

    for dir in Dir::ALL {
        let (dx, dy) = dir.delta();
        let mut dist = 1usize;
        loop {
            if let Some((best_dist, _)) = best {
                if dist >= best_dist { break; }
            }
            let d = dist as i32;
            let c = match grid.offset(from, dx * d, dy * d) {
                Some(c) => c,
                None => break,
            };
            if walk::is_standable(grid, c, policy) {
                best = Some((dist, c));
                break;
            }
            dist += 1;
        }
    }

    best.map(|(_, c)| c)
}

/// Axis scan first; if every scan comes up empty, the closest standable
/// cell anywhere (row-major order on ties).
pub fn nearest_safe(grid: &Grid, from: Coord, policy: SafeGroundPolicy) -> Option<Coord> {
    if let Some(c) = scan_nearest_safe(grid, from, policy) {
        return Some(c);
    }
    grid.iter()
        .filter(|&(c, _)| walk::is_standable(grid, c, policy))
        .min_by_key(|&(c, _)| c.manhattan(from))
        .map(|(c, _)| c)
}
