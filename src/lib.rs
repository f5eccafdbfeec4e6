//! TUI Boulder (workspace facade crate).
//!
//! Re-exports the workspace crates as `tui_boulder::{core,adapter,level,term,input,types}`
//! and holds the binary's glue: environment config, the file logger and the
//! best-score file.

pub mod config;
pub mod logging;
pub mod scores;

pub use tui_boulder_adapter as adapter;
pub use tui_boulder_core as core;
pub use tui_boulder_input as input;
pub use tui_boulder_level as level;
pub use tui_boulder_term as term;
pub use tui_boulder_types as types;

pub use config::GameConfig;
pub use scores::JsonScoreStore;
