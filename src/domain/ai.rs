/// Enemy and boss movement intents.
///
/// Intents only: these functions pick a direction (or hold) and never
/// touch the grid. The step layer checks the target with
/// `walk::classify_enemy_move` and applies or rejects the move.
///
/// Two small-enemy modes, chosen per tick:
///   1. **Chase**: one step toward the player along the larger axis
///      distance (coin flip on equal distances). The chance of chasing
///      grows with the fill fraction.
///   2. **Wander**: hold position, or pick a random cardinal direction.
///
/// The boss ignores the player: most ticks it picks a random direction.

use rand::Rng;

use super::grid::{Coord, Dir};

/// Probabilities driving the movement policy. All values are clamped to
/// `[0, 1]` when used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyTuning {
    pub boss_move_chance: f64,
    pub chase_base: f64,
    pub chase_per_fill: f64,
    pub hold_chance: f64,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        EnemyTuning {
            boss_move_chance: 0.9,
            chase_base: 0.1,
            chase_per_fill: 0.8,
            hold_chance: 0.2,
        }
    }
}

#[inline]
fn prob(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// Chance that a small enemy chases this tick.
pub fn chase_chance(fill_fraction: f32, tuning: &EnemyTuning) -> f64 {
    prob(tuning.chase_base + tuning.chase_per_fill * fill_fraction as f64)
}

fn random_dir<R: Rng + ?Sized>(rng: &mut R) -> Dir {
    Dir::ALL[rng.gen_range(0..Dir::ALL.len())]
}

/// One step from `from` toward `to`: larger axis first, coin flip on ties.
/// `None` when already there.
pub fn step_toward<R: Rng + ?Sized>(rng: &mut R, from: Coord, to: Coord) -> Option<Dir> {
    let dx = to.x as i64 - from.x as i64;
    let dy = to.y as i64 - from.y as i64;
    if dx == 0 && dy == 0 { return None; }

    let x_dir = if dx > 0 { Dir::Right } else { Dir::Left };
    let y_dir = if dy > 0 { Dir::Up } else { Dir::Down };

    if dx.abs() > dy.abs() {
        Some(x_dir)
    } else if dy.abs() > dx.abs() {
        Some(y_dir)
    } else if rng.gen_bool(0.5) {
        Some(x_dir)
    } else {
        Some(y_dir)
    }
}

/// Small enemy: chase, hold, or wander.
pub fn enemy_intent<R: Rng + ?Sized>(
    rng: &mut R,
    pos: Coord,
    player: Coord,
    fill_fraction: f32,
    tuning: &EnemyTuning,
) -> Option<Dir> {
    if rng.gen_bool(chase_chance(fill_fraction, tuning)) {
        return step_toward(rng, pos, player);
    }
    if rng.gen_bool(prob(tuning.hold_chance)) {
        return None;
    }
    Some(random_dir(rng))
}

/// Boss: random cardinal direction with high probability, else hold.
pub fn boss_intent<R: Rng + ?Sized>(rng: &mut R, tuning: &EnemyTuning) -> Option<Dir> {
    if rng.gen_bool(prob(tuning.boss_move_chance)) {
        Some(random_dir(rng))
    } else {
        None
    }
}
