use thiserror::Error;

use crate::entity::EntityId;
use crate::grid::GridError;
use crate::types::Cell;

/// Level data errors; fatal for the level being loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level matrix is empty")]
    EmptyMatrix,
    #[error("symbol {symbol:?} at row {}, column {} has no definition", .cell.row, .cell.col)]
    UndefinedSymbol { symbol: char, cell: Cell },
    #[error("symbol {symbol:?} names unknown role {role:?}")]
    UnknownRole { symbol: char, role: String },
    #[error("level has no player")]
    MissingPlayer,
    #[error("level has more than one player")]
    MultiplePlayers,
}

/// Internal consistency faults met while running a handler or a task
///
/// These never stop the simulation: the world logs them, counts them, and
/// carries on with the next handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    #[error("entity {id:?} is not at {cell:?}")]
    Misplaced { id: EntityId, cell: Cell },
    #[error(transparent)]
    Grid(#[from] GridError),
}
