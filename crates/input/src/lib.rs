//! Terminal input module: keys to game actions.
//!
//! This module is independent of any UI framework. It maps `crossterm` key
//! events into [`crate::types::GameAction`] and provides a held-key repeat
//! handler suitable for terminal environments (including terminals without
//! key-release events).

pub mod handler;
pub mod map;

pub use tui_boulder_types as types;

pub use handler::InputHandler;
pub use map::{handle_key_event, should_quit};
