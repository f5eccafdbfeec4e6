//! Level loading module - JSON level files for the simulation core
//!
//! A level file names its symbols and lays them out in a matrix:
//!
//! ```json
//! {
//!   "level_name": "First steps",
//!   "countdown": 300,
//!   "defs": {
//!     "#": {"role": "wall"},
//!     "P": {"role": "player"},
//!     "*": {"role": "diamond"},
//!     " ": {"role": "empty"},
//!     "=": {"role": "barrier", "group": "gate"}
//!   },
//!   "matrix": ["#####", "#P *#", "#####"]
//! }
//! ```
//!
//! [`LevelFile`] is the serde schema; [`LevelFile::into_plan`] turns it into
//! the core's [`LevelPlan`](tui_boulder_core::LevelPlan), where symbol and
//! role validation happens. [`LevelDirectory`] serves `level_{n}.json` files
//! from a directory as a [`LevelSource`](tui_boulder_core::LevelSource).

pub mod directory;
pub mod file;

pub use tui_boulder_core as core;
pub use tui_boulder_types as types;

pub use directory::LevelDirectory;
pub use file::{LevelFile, LevelFileError, SymbolDefFile};
