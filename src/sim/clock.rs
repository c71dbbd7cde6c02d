/// Tick scheduling: three independent fixed-period accumulators.
///
/// Each frame adds the elapsed time to every accumulator. An accumulator
/// that reaches its period fires exactly once and restarts from zero, so a
/// long frame never produces a burst of catch-up steps.
///
///   - player: input resolution (fastest)
///   - sync: grid render sync
///   - enemy: enemy and boss movement (slowest)

use std::time::Duration;

use crate::config::TimingConfig;

#[derive(Clone, Debug)]
pub struct Accumulator {
    period: Duration,
    elapsed: Duration,
}

impl Accumulator {
    pub fn new(period: Duration) -> Self {
        Accumulator { period, elapsed: Duration::ZERO }
    }

    /// Add `dt`; returns true (and resets) when the period is reached.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.period {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }
}

/// Which steps are due this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DueTicks {
    pub player: bool,
    pub enemy: bool,
    pub sync: bool,
}

#[derive(Clone, Debug)]
pub struct SimulationClock {
    pub player: Accumulator,
    pub enemy: Accumulator,
    pub sync: Accumulator,
}

impl SimulationClock {
    pub fn new(player: Duration, enemy: Duration, sync: Duration) -> Self {
        SimulationClock {
            player: Accumulator::new(player),
            enemy: Accumulator::new(enemy),
            sync: Accumulator::new(sync),
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        SimulationClock::new(timing.player_tick(), timing.enemy_tick(), timing.sync_tick())
    }

    pub fn advance(&mut self, dt: Duration) -> DueTicks {
        DueTicks {
            player: self.player.advance(dt),
            enemy: self.enemy.advance(dt),
            sync: self.sync.advance(dt),
        }
    }
}
