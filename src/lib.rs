/// Grid Claim core: cell grid, region resolution, agents and tick scheduling.
///
/// The terminal front end (`src/main.rs` + `ui/`) only talks to this crate
/// through `sim::world::GameState`, `sim::step::advance` and the
/// read-only grid snapshot.

pub mod config;
pub mod domain;
pub mod sim;
