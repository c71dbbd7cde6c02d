/// Entry point and game loop.

mod ui;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use gridclaim::config::GameConfig;
use gridclaim::sim::step;
use gridclaim::sim::world::GameState;
use ui::input::{InputState, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;

fn main() {
    let config = GameConfig::load();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(fill) => {
            println!();
            println!("Thanks for playing Grid Claim!");
            println!("Claimed: {:.1}%", fill * 100.0);
        }
        Err(e) => eprintln!("Game error: {e}"),
    }
}

/// Seed from config, or from the clock when none is set.
fn round_seed(config: &GameConfig, round: u64) -> u64 {
    match config.seed {
        Some(seed) => seed.wrapping_add(round),
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(round),
    }
}

/// Runs until quit; returns the fill fraction of the last round.
fn game_loop(renderer: &mut Renderer, config: &GameConfig) -> Result<f32, Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut round = 0u64;
    let mut state = GameState::from_config(config, round_seed(config, round))?;
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }

        if kb.any_pressed(KEYS_RESTART) && state.is_game_over() {
            round += 1;
            state = GameState::from_config(config, round_seed(config, round))?;
            renderer.invalidate();
            last_frame = Instant::now();
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_frame);
        last_frame = now;

        let report = step::advance(&mut state, elapsed, kb.frame_input());

        // The HUD and player move every frame; the grid diff keeps this cheap
        if report.grid_dirty || report.player_moved || !report.events.is_empty() {
            renderer.render(&state)?;
        }

        std::thread::sleep(config.timing.frame_sleep());
    }

    Ok(state.fill_fraction())
}
