//! GameView: maps a `core::GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.
//!
//! Layout: one HUD line on top, the mine below it inside a border. Mines
//! larger than the terminal scroll: the camera keeps the player centered and
//! clamps at the mine edges.

use crate::core::{EntityState, GameSnapshot, SessionStatus, Tile};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{Cell, EntityKind};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub enabled: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub streaming_count: u16,
}

/// Visible part of the mine, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Camera {
    pub row: i32,
    pub col: i32,
    pub rows: i32,
    pub cols: i32,
}

impl Camera {
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= self.row
            && cell.row < self.row + self.rows
            && cell.col >= self.col
            && cell.col < self.col + self.cols
    }
}

/// A lightweight terminal renderer for the mine.
pub struct GameView {
    /// Mine cell width in terminal columns.
    cell_w: u16,
    /// Mine cell height in terminal rows.
    cell_h: u16,
}

const BG: Rgb = Rgb::new(20, 18, 16);
const HUD_ROWS: u16 = 1;

impl Default for GameView {
    fn default() -> Self {
        // 2x1 helps compensate for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
        }
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
        }
    }

    /// Where the camera sits for a snapshot in a viewport
    pub fn camera(&self, snap: &GameSnapshot, viewport: Viewport) -> Camera {
        let avail_w = viewport.width.saturating_sub(2) / self.cell_w;
        let avail_h = viewport.height.saturating_sub(HUD_ROWS + 2) / self.cell_h;
        let cols = snap.cols.min(i32::from(avail_w)).max(0);
        let rows = snap.rows.min(i32::from(avail_h)).max(0);
        let focus = snap.player.unwrap_or(Cell::new(snap.rows / 2, snap.cols / 2));
        Camera {
            row: follow(snap.rows, rows, focus.row),
            col: follow(snap.cols, cols, focus.col),
            rows,
            cols,
        }
    }

    /// Render the current snapshot into an existing framebuffer.
    ///
    /// This is the allocation-free hot path. Callers can reuse a framebuffer
    /// across frames and only resize when the terminal size changes.
    pub fn render_into(
        &self,
        snap: &GameSnapshot,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().into_cell(' '));

        self.draw_hud(fb, snap, adapter, viewport);

        let cam = self.camera(snap, viewport);
        let frame_w = (cam.cols as u16) * self.cell_w + 2;
        let frame_h = (cam.rows as u16) * self.cell_h + 2;
        let start_x = viewport.width.saturating_sub(frame_w) / 2;
        let start_y = HUD_ROWS + viewport.height.saturating_sub(HUD_ROWS + frame_h) / 2;

        if cam.rows > 0 && cam.cols > 0 {
            let border = CellStyle::fg(Rgb::new(150, 140, 120), Rgb::new(0, 0, 0));
            draw_border(fb, start_x, start_y, frame_w, frame_h, border);

            for r in 0..cam.rows {
                for c in 0..cam.cols {
                    let cell = Cell::new(cam.row + r, cam.col + c);
                    let (glyph, style) = match snap.tile(cell) {
                        Some(tile) => tile_glyph(tile),
                        None => ([' ', ' '], CellStyle::fg(BG, BG)),
                    };
                    self.draw_cell(fb, start_x, start_y, c as u16, r as u16, glyph, style);
                }
            }
        }

        if let Some(text) = overlay_text(snap) {
            draw_overlay_text(fb, start_x, start_y, frame_w, frame_h, text);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(
        &self,
        snap: &GameSnapshot,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, adapter, viewport, &mut fb);
        fb
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &self,
        fb: &mut FrameBuffer,
        start_x: u16,
        start_y: u16,
        cell_x: u16,
        cell_y: u16,
        glyph: [char; 2],
        style: CellStyle,
    ) {
        let px = start_x + 1 + cell_x * self.cell_w;
        let py = start_y + 1 + cell_y * self.cell_h;
        for dy in 0..self.cell_h {
            for dx in 0..self.cell_w {
                let ch = glyph[(dx as usize) % 2];
                fb.put_char(px + dx, py + dy, ch, style);
            }
        }
    }

    fn draw_hud(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
    ) {
        let label = CellStyle {
            bold: true,
            ..CellStyle::default()
        };
        let value = CellStyle::fg(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        let diamond = CellStyle {
            bold: true,
            ..CellStyle::fg(Rgb::new(90, 220, 240), Rgb::new(0, 0, 0))
        };
        let alarm = snap.countdown <= crate::types::COUNTDOWN_ALARM_SECS
            && snap.status == SessionStatus::Playing;
        let clock = if alarm {
            CellStyle {
                bold: true,
                ..CellStyle::fg(Rgb::new(240, 80, 60), Rgb::new(0, 0, 0))
            }
        } else {
            value
        };

        let mut x = fb.put_str(1, 0, "<>", diamond);
        x = fb.put_u32(x + 1, 0, snap.remaining, value);
        x = fb.put_str(x + 2, 0, "SCORE ", label);
        x = fb.put_u32(x, 0, snap.score, value);
        x = fb.put_str(x + 2, 0, "BEST ", label);
        x = fb.put_u32(x, 0, snap.best_score, value);
        x = fb.put_str(x + 2, 0, "TIME ", label);
        x = put_clock(fb, x, 0, snap.countdown, clock);
        x = fb.put_str(x + 2, 0, "LV ", label);
        x = fb.put_u32(x, 0, snap.level, value);
        if !snap.level_name.is_empty() {
            x = fb.put_str(x + 1, 0, &snap.level_name, value);
        }

        if let Some(st) = adapter.filter(|a| a.enabled) {
            let dim = CellStyle { dim: true, ..value };
            let needed = 8;
            if viewport.width >= x.saturating_add(needed + 2) {
                let ax = viewport.width - needed;
                let ax = fb.put_str(ax, 0, "AI ", dim);
                let ax = fb.put_u32(ax, 0, u32::from(st.client_count), dim);
                fb.put_str(ax, 0, if st.controller_id.is_some() { "*" } else { "" }, dim);
            }
        }
    }
}

/// First visible index along one axis, centering `focus` and clamping
fn follow(len: i32, visible: i32, focus: i32) -> i32 {
    if len <= visible {
        return 0;
    }
    (focus - visible / 2).clamp(0, len - visible)
}

fn put_clock(fb: &mut FrameBuffer, x: u16, y: u16, secs: u32, style: CellStyle) -> u16 {
    let x = fb.put_u32_padded(x, y, secs / 3600, 2, style);
    let x = fb.put_str(x, y, ":", style);
    let x = fb.put_u32_padded(x, y, secs / 60 % 60, 2, style);
    let x = fb.put_str(x, y, ":", style);
    fb.put_u32_padded(x, y, secs % 60, 2, style)
}

fn overlay_text(snap: &GameSnapshot) -> Option<&str> {
    match &snap.status {
        SessionStatus::Idle => Some("PRESS R TO START"),
        SessionStatus::Playing | SessionStatus::LevelLost if snap.paused => Some("PAUSED"),
        SessionStatus::Playing | SessionStatus::LevelLost => None,
        SessionStatus::LevelComplete => Some("LEVEL COMPLETE"),
        SessionStatus::GameOver => Some("GAME OVER"),
        SessionStatus::WonAll => Some("CHAMPION"),
        SessionStatus::Failed(message) => Some(message.as_str()),
    }
}

/// Two-column glyph and style of a tile
pub fn tile_glyph(tile: Tile) -> ([char; 2], CellStyle) {
    let rgb = |r, g, b| CellStyle::fg(Rgb::new(r, g, b), BG);
    let bold = |style: CellStyle| CellStyle { bold: true, ..style };
    let dim = |style: CellStyle| CellStyle { dim: true, ..style };

    match (tile.kind, tile.state) {
        (EntityKind::Player, EntityState::Frozen) => (['@', '@'], bold(rgb(120, 160, 255))),
        (EntityKind::Player, EntityState::Splashed) => (['%', '%'], bold(rgb(230, 60, 60))),
        (EntityKind::Player, _) => (['@', '@'], bold(rgb(255, 230, 120))),
        (EntityKind::Wall, _) => (['█', '█'], rgb(120, 110, 100)),
        (EntityKind::Earth, _) => (['░', '░'], rgb(140, 100, 60)),
        (EntityKind::Barrier, _) => (['#', '#'], rgb(220, 140, 40)),
        (EntityKind::Rock, _) => (['(', ')'], bold(rgb(170, 170, 170))),
        (EntityKind::Diamond, _) => (['<', '>'], bold(rgb(90, 220, 240))),
        (EntityKind::RockDiamond, EntityState::Transformed) => {
            (['<', '>'], bold(rgb(220, 110, 240)))
        }
        (EntityKind::RockDiamond, EntityState::Changing) => (['{', '}'], bold(rgb(220, 110, 240))),
        (EntityKind::RockDiamond, _) => (['(', ')'], bold(rgb(190, 150, 200))),
        (EntityKind::PrizeDiamond, _) => (['<', '>'], bold(rgb(110, 230, 110))),
        (EntityKind::KillerDiamond, _) => (['<', '>'], bold(rgb(240, 80, 80))),
        (EntityKind::GoldenKey, _) => (['o', '-'], bold(rgb(250, 210, 60))),
        (EntityKind::Treasure, EntityState::Open) => (['$', '$'], bold(rgb(250, 210, 60))),
        (EntityKind::Treasure, _) => (['[', ']'], dim(rgb(250, 210, 60))),
        (EntityKind::Trophy, EntityState::Open) => (['Y', 'Y'], bold(rgb(250, 230, 120))),
        (EntityKind::Trophy, _) => (['[', ']'], dim(rgb(250, 230, 120))),
        (EntityKind::Zombie, EntityState::Dying) => (['x', 'x'], dim(rgb(120, 200, 90))),
        (EntityKind::Zombie, EntityState::Attacking) => (['Z', '!'], bold(rgb(160, 240, 90))),
        (EntityKind::Zombie, _) => (['Z', 'z'], bold(rgb(120, 200, 90))),
    }
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

fn draw_overlay_text(
    fb: &mut FrameBuffer,
    start_x: u16,
    start_y: u16,
    frame_w: u16,
    frame_h: u16,
    text: &str,
) {
    let mid_y = start_y.saturating_add(frame_h / 2);
    let text_w = text.chars().count() as u16;
    let x = start_x.saturating_add(frame_w.saturating_sub(text_w) / 2);
    let style = CellStyle {
        bold: true,
        ..CellStyle::fg(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0))
    };
    fb.put_str(x, mid_y, text, style);
}

trait IntoCell {
    fn into_cell(self, ch: char) -> crate::fb::Cell;
}

impl IntoCell for CellStyle {
    fn into_cell(self, ch: char) -> crate::fb::Cell {
        crate::fb::Cell { ch, style: self }
    }
}
