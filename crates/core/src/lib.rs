//! Core simulation module - pure, deterministic, and testable
//!
//! This module contains the grid simulation engine of the mine game: the
//! rules, the timed behaviors, and the level flow. It has **no dependencies**
//! on UI, networking, or I/O, making it:
//!
//! - **Deterministic**: same level and seed produce identical runs
//! - **Testable**: every rule is exercised by unit tests without a clock
//! - **Portable**: runs in the terminal, headless, or behind the adapter
//!
//! # Module Structure
//!
//! - [`grid`]: sparse cell map with at most one entity per cell
//! - [`events`]: topic-keyed event bus with queued, non-reentrant dispatch
//! - [`scheduler`]: discrete-time delay queue with FIFO tie-break
//! - [`entity`]: flat capability model of mine objects
//! - [`level`]: validated level plans and entity placements
//! - [`world`]: one running level (physics, zombies, counters)
//! - [`session`]: a whole game across levels, plus the level-source and
//!   score-store boundaries
//! - [`snapshot`]: read-only view for renderers and remote observers
//! - [`rng`]: seeded generator for zombie decisions
//!
//! # Rules in brief
//!
//! - **Falling**: loose objects fall one cell per step; an object that lands
//!   after moving raises `TouchedDown`
//! - **Roll-aside**: an object resting on another loose object slides
//!   sideways (left first) when the side and diagonal cells are clear
//! - **Crushing**: a falling object meeting the player splashes it
//! - **Pushing**: rocks, treasures and trophies move sideways only
//! - **Winning**: collecting the last goal diamond wins the level, once
//!
//! # Example
//!
//! ```
//! use tui_boulder_core::{LevelPlan, LevelStatus, World};
//! use tui_boulder_types::Direction;
//!
//! let plan = LevelPlan::new("demo", &["P.*", "###"]);
//! let mut world = World::new(&plan, 1).unwrap();
//! world.start();
//!
//! assert!(world.step_player(Direction::Right)); // dig
//! assert!(world.step_player(Direction::Right)); // collect
//! assert_eq!(world.status(), LevelStatus::Won);
//! assert_eq!(world.score(), 250);
//! ```
//!
//! # Timing
//!
//! There is no wall clock inside the core. The owner calls
//! [`World::advance`] (or [`Session::advance`]) with elapsed milliseconds and
//! every task that falls due fires in time order.

mod enemy;
pub mod entity;
pub mod error;
pub mod events;
pub mod grid;
pub mod level;
mod physics;
pub mod rng;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod world;

pub use tui_boulder_types as types;

// Re-export commonly used types for convenience
pub use entity::{Behavior, Entity, EntityId, EntityState};
pub use error::{LevelError, SimError};
pub use events::{Event, EventBus};
pub use grid::{Grid, GridError};
pub use level::{LevelPlan, Placement, SymbolDef};
pub use rng::SimpleRng;
pub use scheduler::{Flow, Scheduler, TaskId};
pub use session::{
    LevelSource, MemoryLevels, MemoryScores, ScoreStore, Session, SessionStatus, SourceError,
};
pub use snapshot::{GameSnapshot, Tile};
pub use world::{Handler, LevelStatus, Reaction, Task, World};
