use crate::entity::EntityState;
use crate::session::SessionStatus;
use crate::types::{Cell, EntityKind};

/// What a cell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub kind: EntityKind,
    pub state: EntityState,
}

/// Read-only view of a session, for renderers and remote observers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameSnapshot {
    pub rows: i32,
    pub cols: i32,
    /// Row-major, `rows * cols` entries
    pub tiles: Vec<Option<Tile>>,
    pub player: Option<Cell>,
    pub score: u32,
    pub best_score: u32,
    pub remaining: u32,
    pub countdown: u32,
    pub level: u32,
    pub level_name: String,
    pub paused: bool,
    pub status: SessionStatus,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.rows = 0;
        self.cols = 0;
        self.tiles.clear();
        self.player = None;
        self.score = 0;
        self.best_score = 0;
        self.remaining = 0;
        self.countdown = 0;
        self.level = 0;
        self.level_name.clear();
        self.paused = false;
        self.status = SessionStatus::Idle;
    }

    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        if cell.row < 0 || cell.row >= self.rows || cell.col < 0 || cell.col >= self.cols {
            return None;
        }
        self.tiles
            .get((cell.row * self.cols + cell.col) as usize)
            .copied()
            .flatten()
    }

    pub fn playable(&self) -> bool {
        self.status == SessionStatus::Playing && !self.paused
    }
}
