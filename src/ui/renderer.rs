/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The grid is drawn with upper-half blocks: one terminal cell shows two
/// grid rows (fg = upper row, bg = lower row), so a 64x64 grid needs
/// 64 columns and 32 rows. Grid y grows upward; screen rows grow downward.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use gridclaim::domain::grid::Coord;
use gridclaim::sim::world::GameState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, also used
    /// for `Clear` so inter-row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Palette ──

const UPPER_HALF: char = '▀';

const PLAYER_SAFE: Color = Color::Rgb { r: 80, g: 255, b: 120 };
const PLAYER_MARKING: Color = Color::Rgb { r: 255, g: 230, b: 60 };
const BOSS: Color = Color::Rgb { r: 255, g: 60, b: 60 };

/// Colour ramp keyed by `CellState::shade` (0..=100).
const RAMP: [(i32, (u8, u8, u8)); 5] = [
    (12, (30, 34, 58)),    // free
    (37, (230, 110, 40)),  // enemy
    (62, (250, 240, 120)), // marked
    (87, (120, 200, 255)), // edge
    (100, (60, 110, 190)), // taken
];

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Map a shade value onto the ramp, interpolating between stops.
fn shade_color(shade: i32) -> Color {
    if shade < 0 {
        return Cell::BASE_BG;
    }
    let (first_at, (r, g, b)) = RAMP[0];
    if shade <= first_at {
        return Color::Rgb { r, g, b };
    }
    for pair in RAMP.windows(2) {
        let (lo, a) = pair[0];
        let (hi, b) = pair[1];
        if shade <= hi {
            let t = (shade - lo) as f32 / (hi - lo) as f32;
            return Color::Rgb { r: lerp(a.0, b.0, t), g: lerp(a.1, b.1, t), b: lerp(a.2, b.2, t) };
        }
    }
    let (_, (r, g, b)) = RAMP[RAMP.len() - 1];
    Color::Rgb { r, g, b }
}

fn grid_color(state: &GameState, c: Coord) -> Color {
    if c == state.player.pos {
        return if state.player.is_marking() { PLAYER_MARKING } else { PLAYER_SAFE };
    }
    if c == state.boss.pos {
        return BOSS;
    }
    shade_color(state.snapshot_grid().state(c).shade())
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const BAR_W: usize = 20;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Terminal reports key Release events.
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    /// Force the next `render` to repaint every cell.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, state: &GameState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, state);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Composition (pure: state → frame buffer) ──

fn compose(fb: &mut FrameBuffer, state: &GameState) {
    compose_hud(fb, state);
    let map_rows = compose_grid(fb, state);
    compose_help(fb, MAP_ROW + map_rows + 1);
    if state.is_game_over() {
        compose_game_over(fb, state);
    }
}

fn bar(fraction: f32) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_W as f32).round() as usize).min(BAR_W);
    let mut s = String::with_capacity(BAR_W * 3);
    s.extend(std::iter::repeat('█').take(filled));
    s.extend(std::iter::repeat('░').take(BAR_W - filled));
    s
}

fn compose_hud(fb: &mut FrameBuffer, state: &GameState) {
    let lives: String = std::iter::repeat('♥').take(state.player.lives as usize).collect();
    fb.put_str(0, HUD_ROW, &lives, BOSS, Color::Reset);

    let fill = format!("FILL {:5.1}%", state.fill_fraction() * 100.0);
    fb.put_str(8, HUD_ROW, &fill, Color::White, Color::Reset);

    let goal_fg = if state.goal_reached { PLAYER_SAFE } else { Color::Rgb { r: 120, g: 200, b: 255 } };
    fb.put_str(21, HUD_ROW, &bar(state.progress()), goal_fg, Color::Reset);

    fb.put_str(43, HUD_ROW, "LINE", Color::DarkGrey, Color::Reset);
    fb.put_str(48, HUD_ROW, &bar(state.mark_strength()), PLAYER_MARKING, Color::Reset);
}

/// Draw the grid; returns the number of terminal rows used.
fn compose_grid(fb: &mut FrameBuffer, state: &GameState) -> usize {
    let n = state.snapshot_grid().size();
    let rows = (n + 1) / 2;
    for row in 0..rows {
        let upper_y = n - 1 - 2 * row;
        let lower_y = upper_y.checked_sub(1);
        for x in 0..n {
            let fg = grid_color(state, Coord::new(x, upper_y));
            let bg = match lower_y {
                Some(y) => grid_color(state, Coord::new(x, y)),
                None => Cell::BASE_BG,
            };
            fb.set(x, MAP_ROW + row, Cell::new(UPPER_HALF, fg, bg));
        }
    }
    rows
}

fn compose_help(fb: &mut FrameBuffer, row: usize) {
    fb.put_str(0, row, "←↑→↓/WASD: move   SPACE: draw   R: restart   ESC/Q: quit", Color::DarkGrey, Color::Reset);
}

fn compose_game_over(fb: &mut FrameBuffer, state: &GameState) {
    let box_art = [
        "╔══════════════════════════╗",
        "║        GAME  OVER        ║",
        "╚══════════════════════════╝",
    ];
    let top = MAP_ROW + 4;
    for (i, l) in box_art.iter().enumerate() {
        fb.put_str(4, top + i, l, BOSS, Color::Reset);
    }
    let filled = format!("  Claimed {:.1}%  ", state.fill_fraction() * 100.0);
    fb.put_str(6, top + 4, &filled, Color::White, Color::Reset);
    fb.put_str(6, top + 5, "  R: play again  ", PLAYER_SAFE, Color::Reset);
}
