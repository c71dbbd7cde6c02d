/// Keyboard input tracker.
///
/// Turns crossterm key events into the raw per-frame input the simulation
/// expects: a movement vector in `-1.0..=1.0` per axis (up = +y) plus the
/// draw button. Held keys persist across frames so movement continues
/// while a key is down.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use gridclaim::sim::step::FrameInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_DRAW: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('z'), KeyCode::Char('Z')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,
    /// Honor Release events (only when keyboard enhancement is confirmed).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, release comes from the timeout
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, now) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, now);
            }
        }
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        let now = Instant::now();
        codes.iter().any(|c| self.is_held_at(*c, now))
    }

    /// Edge trigger: freshly pressed during the last drain.
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Raw simulation input for this frame. Opposite keys cancel out.
    pub fn frame_input(&self) -> FrameInput {
        let axis = |neg: &[KeyCode], pos: &[KeyCode]| -> f32 {
            let mut v = 0.0;
            if self.any_held(pos) { v += 1.0; }
            if self.any_held(neg) { v -= 1.0; }
            v
        };
        FrameInput {
            x: axis(KEYS_LEFT, KEYS_RIGHT),
            y: axis(KEYS_DOWN, KEYS_UP),
            action_held: self.any_held(KEYS_DRAW),
        }
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn held_keys_become_a_vector() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(press(KeyCode::Up), now);
        kb.apply(press(KeyCode::Char('d')), now);
        let input = kb.frame_input();
        assert_eq!((input.x, input.y), (1.0, 1.0));
        assert!(!input.action_held);

        kb.apply(press(KeyCode::Char(' ')), now);
        assert!(kb.frame_input().action_held);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(press(KeyCode::Left), now);
        kb.apply(press(KeyCode::Right), now);
        assert_eq!(kb.frame_input().x, 0.0);
    }

    #[test]
    fn repeat_is_not_a_fresh_press() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(press(KeyCode::Char('r')), now);
        assert!(kb.any_pressed(KEYS_RESTART));
        kb.fresh_presses.clear();
        kb.apply(press(KeyCode::Char('r')), now);
        assert!(!kb.any_pressed(KEYS_RESTART));
    }

    #[test]
    fn ctrl_c_is_detected() {
        let mut kb = InputState::new();
        kb.apply(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.ctrl_c_pressed());
    }

    #[test]
    fn release_is_honored_only_with_enhancement() {
        let mut kb = InputState::new();
        let now = Instant::now();
        let mut release = press(KeyCode::Up);
        release.kind = KeyEventKind::Release;

        kb.apply(press(KeyCode::Up), now);
        kb.apply(release, now);
        assert!(kb.any_held(KEYS_UP));

        kb.honor_release = true;
        kb.apply(release, now);
        assert!(!kb.any_held(KEYS_UP));
    }
}
