//! Grid module - sparse cell map of the mine
//!
//! The grid maps `(row, col)` cells to occupant references. It owns no
//! entities: an occupant is a small `Copy` handle (an entity id in the
//! simulation), so moving an occupant relocates the handle, never the object.
//!
//! Two flavours of mutation are offered:
//!
//! - **Lenient** (`move_to`, `duplicate`): return `false` on conflict. The
//!   collision resolver validates first and uses these.
//! - **Strict** (`try_move`, `try_duplicate`): return a [`GridError`] naming
//!   the conflict. Used by internal consistency checks and tests.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::{Cell, Corner, CELL_SIZE};

/// Conflicts reported by the strict grid operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({}, {}) is already occupied", .0.row, .0.col)]
    CellOccupied(Cell),
    #[error("cell ({}, {}) is empty", .0.row, .0.col)]
    CellEmpty(Cell),
    #[error("cell ({}, {}) is outside the grid", .0.row, .0.col)]
    OutOfBounds(Cell),
}

/// Sparse two-dimensional occupancy map
#[derive(Debug, Clone)]
pub struct Grid<T> {
    rows: i32,
    cols: i32,
    cell_size: i32,
    cells: HashMap<Cell, T>,
}

impl<T: Copy> Grid<T> {
    /// Create an empty grid using the default [`CELL_SIZE`]
    pub fn new(rows: i32, cols: i32) -> Self {
        Self::with_cell_size(rows, cols, CELL_SIZE)
    }

    pub fn with_cell_size(rows: i32, cols: i32, cell_size: i32) -> Self {
        Self {
            rows: rows.max(0),
            cols: cols.max(0),
            cell_size: cell_size.max(1),
            cells: HashMap::new(),
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if a cell lies inside the grid
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    /// Occupant of a cell, if any
    pub fn at(&self, cell: Cell) -> Option<T> {
        self.cells.get(&cell).copied()
    }

    /// Occupant of the cell under a pixel position
    pub fn at_xy(&self, x: i32, y: i32) -> Option<T> {
        self.at(self.cell_of_xy(x, y))
    }

    /// Unconditionally place `value` at `cell`, replacing any occupant
    ///
    /// Returns `false` (and does nothing) when the cell is outside the grid.
    pub fn set(&mut self, cell: Cell, value: T) -> bool {
        if !self.contains(cell) {
            return false;
        }
        self.cells.insert(cell, value);
        true
    }

    /// Relocate the occupant of `from` to `to`
    ///
    /// Fails silently when `from` is empty, `to` is occupied or out of bounds.
    pub fn move_to(&mut self, from: Cell, to: Cell) -> bool {
        self.try_move(from, to).is_ok()
    }

    /// Strict variant of [`Grid::move_to`]
    pub fn try_move(&mut self, from: Cell, to: Cell) -> Result<(), GridError> {
        self.check_transfer(from, to)?;
        if let Some(value) = self.cells.remove(&from) {
            self.cells.insert(to, value);
        }
        Ok(())
    }

    /// Copy the occupant of `from` into `to`, keeping the source
    pub fn duplicate(&mut self, from: Cell, to: Cell) -> bool {
        self.try_duplicate(from, to).is_ok()
    }

    /// Strict variant of [`Grid::duplicate`]
    pub fn try_duplicate(&mut self, from: Cell, to: Cell) -> Result<(), GridError> {
        self.check_transfer(from, to)?;
        if let Some(value) = self.at(from) {
            self.cells.insert(to, value);
        }
        Ok(())
    }

    fn check_transfer(&self, from: Cell, to: Cell) -> Result<(), GridError> {
        if !self.contains(to) {
            return Err(GridError::OutOfBounds(to));
        }
        if self.cells.contains_key(&to) {
            return Err(GridError::CellOccupied(to));
        }
        if !self.cells.contains_key(&from) {
            return Err(GridError::CellEmpty(from));
        }
        Ok(())
    }

    /// Remove and return the occupant of a cell
    pub fn drop(&mut self, cell: Cell) -> Option<T> {
        self.cells.remove(&cell)
    }

    pub fn drop_xy(&mut self, x: i32, y: i32) -> Option<T> {
        self.drop(self.cell_of_xy(x, y))
    }

    /// Remove every occupant
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Change the grid dimensions; occupants falling outside are dropped
    pub fn resize(&mut self, rows: i32, cols: i32) {
        self.rows = rows.max(0);
        self.cols = cols.max(0);
        let (rows, cols) = (self.rows, self.cols);
        self.cells
            .retain(|c, _| c.row >= 0 && c.row < rows && c.col >= 0 && c.col < cols);
    }

    /// Pixel position of a cell's center
    pub fn center_of(&self, cell: Cell) -> (i32, i32) {
        let half = self.cell_size / 2;
        (
            cell.col * self.cell_size + half,
            cell.row * self.cell_size + half,
        )
    }

    /// Pixel position of one corner of a cell
    pub fn corner(&self, cell: Cell, corner: Corner) -> (i32, i32) {
        let x = cell.col * self.cell_size;
        let y = cell.row * self.cell_size;
        match corner {
            Corner::TopLeft => (x, y),
            Corner::TopRight => (x + self.cell_size, y),
            Corner::BottomLeft => (x, y + self.cell_size),
            Corner::BottomRight => (x + self.cell_size, y + self.cell_size),
        }
    }

    /// Cell under a pixel position
    pub fn cell_of_xy(&self, x: i32, y: i32) -> Cell {
        Cell::new(y.div_euclid(self.cell_size), x.div_euclid(self.cell_size))
    }

    /// Pixel bounding box `(x0, y0, x1, y1)` of the whole grid
    pub fn bbox(&self) -> (i32, i32, i32, i32) {
        let (w, h) = self.width_height();
        (0, 0, w, h)
    }

    /// Pixel size `(width, height)` of the whole grid
    pub fn width_height(&self) -> (i32, i32) {
        (self.cols * self.cell_size, self.rows * self.cell_size)
    }

    /// Occupied cells in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (Cell, T)> + '_ {
        self.cells.iter().map(|(c, v)| (*c, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid: Grid<u32> = Grid::new(3, 4);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert!(grid.is_empty());
        assert_eq!(grid.at(Cell::new(0, 0)), None);
    }

    #[test]
    fn test_set_and_at() {
        let mut grid = Grid::new(3, 3);
        assert!(grid.set(Cell::new(1, 2), 7u32));
        assert_eq!(grid.at(Cell::new(1, 2)), Some(7));
        assert!(!grid.set(Cell::new(3, 0), 8));
        assert!(!grid.set(Cell::new(0, -1), 8));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_move_relocates_entry() {
        let mut grid = Grid::new(3, 3);
        grid.set(Cell::new(0, 0), 1u32);
        assert!(grid.move_to(Cell::new(0, 0), Cell::new(1, 0)));
        assert_eq!(grid.at(Cell::new(0, 0)), None);
        assert_eq!(grid.at(Cell::new(1, 0)), Some(1));
    }

    #[test]
    fn test_move_conflicts_are_lenient_by_default() {
        let mut grid = Grid::new(3, 3);
        grid.set(Cell::new(0, 0), 1u32);
        grid.set(Cell::new(0, 1), 2u32);

        assert!(!grid.move_to(Cell::new(0, 0), Cell::new(0, 1)));
        assert!(!grid.move_to(Cell::new(2, 2), Cell::new(1, 1)));
        assert!(!grid.move_to(Cell::new(0, 0), Cell::new(-1, 0)));

        assert_eq!(grid.at(Cell::new(0, 0)), Some(1));
        assert_eq!(grid.at(Cell::new(0, 1)), Some(2));
    }

    #[test]
    fn test_strict_move_reports_conflict() {
        let mut grid = Grid::new(3, 3);
        grid.set(Cell::new(0, 0), 1u32);
        grid.set(Cell::new(0, 1), 2u32);

        assert_eq!(
            grid.try_move(Cell::new(0, 0), Cell::new(0, 1)),
            Err(GridError::CellOccupied(Cell::new(0, 1)))
        );
        assert_eq!(
            grid.try_move(Cell::new(2, 2), Cell::new(1, 1)),
            Err(GridError::CellEmpty(Cell::new(2, 2)))
        );
        assert_eq!(
            grid.try_move(Cell::new(0, 0), Cell::new(0, 9)),
            Err(GridError::OutOfBounds(Cell::new(0, 9)))
        );
    }

    #[test]
    fn test_duplicate_keeps_source() {
        let mut grid = Grid::new(2, 2);
        grid.set(Cell::new(0, 0), 5u32);
        assert!(grid.duplicate(Cell::new(0, 0), Cell::new(1, 1)));
        assert_eq!(grid.at(Cell::new(0, 0)), Some(5));
        assert_eq!(grid.at(Cell::new(1, 1)), Some(5));
        assert_eq!(
            grid.try_duplicate(Cell::new(0, 0), Cell::new(1, 1)),
            Err(GridError::CellOccupied(Cell::new(1, 1)))
        );
    }

    #[test]
    fn test_drop_empties_cell() {
        let mut grid = Grid::new(2, 2);
        grid.set(Cell::new(1, 0), 3u32);
        assert_eq!(grid.drop(Cell::new(1, 0)), Some(3));
        assert_eq!(grid.at(Cell::new(1, 0)), None);
        assert_eq!(grid.drop(Cell::new(1, 0)), None);

        grid.set(Cell::new(1, 1), 4u32);
        assert_eq!(grid.drop_xy(64 + 10, 64 + 63), Some(4));
    }

    #[test]
    fn test_exclusivity_under_random_operations() {
        let mut grid = Grid::new(4, 4);
        let mut rng = crate::rng::SimpleRng::new(99);
        for id in 0..8u32 {
            grid.set(Cell::new((id / 4) as i32, (id % 4) as i32), id);
        }

        for _ in 0..500 {
            let from = Cell::new(rng.next_range(4) as i32, rng.next_range(4) as i32);
            let to = Cell::new(rng.next_range(5) as i32 - 1, rng.next_range(4) as i32);
            match rng.next_range(3) {
                0 => {
                    grid.move_to(from, to);
                }
                1 => {
                    grid.drop(from);
                }
                _ => {
                    if grid.at(to).is_none() {
                        grid.set(to, 100);
                    }
                }
            }

            let mut seen = std::collections::HashSet::new();
            for (cell, id) in grid.iter() {
                assert!(grid.contains(cell));
                if id != 100 {
                    assert!(seen.insert(id), "id {id} appears twice");
                }
            }
        }
    }

    #[test]
    fn test_resize_drops_outside_entries() {
        let mut grid = Grid::new(4, 4);
        grid.set(Cell::new(3, 3), 1u32);
        grid.set(Cell::new(0, 0), 2u32);
        grid.resize(2, 2);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.at(Cell::new(0, 0)), Some(2));
        assert!(!grid.contains(Cell::new(3, 3)));
    }

    #[test]
    fn test_coordinate_conversions() {
        let grid: Grid<u32> = Grid::with_cell_size(3, 5, 10);
        assert_eq!(grid.center_of(Cell::new(1, 2)), (25, 15));
        assert_eq!(grid.corner(Cell::new(1, 2), Corner::TopLeft), (20, 10));
        assert_eq!(grid.corner(Cell::new(1, 2), Corner::BottomRight), (30, 20));
        assert_eq!(grid.cell_of_xy(25, 15), Cell::new(1, 2));
        assert_eq!(grid.cell_of_xy(-1, 0), Cell::new(0, -1));
        assert_eq!(grid.bbox(), (0, 0, 50, 30));
        assert_eq!(grid.width_height(), (50, 30));
    }
}
