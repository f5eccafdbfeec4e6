//! Held-key repeat handler for terminal environments.
//!
//! Supports terminals that do not emit key release events by using a timeout.

use crossterm::event::KeyCode;

use arrayvec::ArrayVec;

use crate::map::direction_of;
use crate::types::{Direction, GameAction, MOVE_REPEAT_DELAY_MS, MOVE_REPEAT_MS};

/// Tracks the held move key and turns it into repeated moves.
#[derive(Debug, Clone)]
pub struct InputHandler {
    held: Option<Direction>,
    last_key_time: std::time::Instant,
    delay_timer: u32,
    repeat_accumulator: u32,
    repeat_delay: u32,
    repeat_rate: u32,
    key_release_timeout_ms: u32,
}

// In terminals without key-release events, a short timeout prevents a single tap
// from turning into a sustained "held" state that triggers repeats.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(MOVE_REPEAT_DELAY_MS, MOVE_REPEAT_MS)
    }

    pub fn with_config(repeat_delay: u32, repeat_rate: u32) -> Self {
        Self {
            held: None,
            last_key_time: std::time::Instant::now(),
            delay_timer: 0,
            repeat_accumulator: 0,
            repeat_delay,
            repeat_rate: repeat_rate.max(1),
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    pub fn key_release_timeout_ms(&self) -> u32 {
        self.key_release_timeout_ms
    }

    pub fn held(&self) -> Option<Direction> {
        self.held
    }

    /// A key press; returns the immediate move for a newly held direction.
    pub fn handle_key_press(&mut self, code: KeyCode) -> Option<GameAction> {
        let dir = direction_of(code)?;
        self.last_key_time = std::time::Instant::now();
        if self.held == Some(dir) {
            // Terminal auto-repeat of a key we already track
            return None;
        }
        self.held = Some(dir);
        self.delay_timer = 0;
        self.repeat_accumulator = 0;
        Some(GameAction::from_direction(dir))
    }

    pub fn handle_key_release(&mut self, code: KeyCode) {
        if let Some(dir) = direction_of(code) {
            if self.held == Some(dir) {
                self.release();
            }
        }
    }

    fn release(&mut self) {
        self.held = None;
        self.delay_timer = 0;
        self.repeat_accumulator = 0;
    }

    pub fn update(&mut self, elapsed_ms: u32) -> ArrayVec<GameAction, 32> {
        let mut actions = ArrayVec::<GameAction, 32>::new();

        // Auto-release when terminal does not emit release events.
        let time_since_last_key = self.last_key_time.elapsed().as_millis() as u32;
        if time_since_last_key > self.key_release_timeout_ms && self.held.is_some() {
            self.release();
        }

        let Some(dir) = self.held else {
            return actions;
        };
        let prev = self.delay_timer;
        self.delay_timer = self.delay_timer.saturating_add(elapsed_ms);
        if self.delay_timer >= self.repeat_delay {
            let excess = if prev < self.repeat_delay {
                self.delay_timer - self.repeat_delay
            } else {
                elapsed_ms
            };
            self.repeat_accumulator += excess;
            while self.repeat_accumulator >= self.repeat_rate {
                let _ = actions.try_push(GameAction::from_direction(dir));
                self.repeat_accumulator -= self.repeat_rate;
            }
        }
        actions
    }

    pub fn reset(&mut self) {
        self.release();
        self.last_key_time = std::time::Instant::now();
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
