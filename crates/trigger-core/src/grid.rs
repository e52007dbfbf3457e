//! Spatial Grid
//!
//! A uniform `columns × rows` partition of a world rectangle. Any position,
//! even one outside the world, resolves to a valid cell in O(1): coordinates
//! past an edge clamp to the first or last row/column on that axis. Use
//! [`SpatialGrid::contains`] to tell inside from outside before trusting the
//! cell for game logic.

use std::ops::{Index, IndexMut};
use thiserror::Error;
use trigger_events::{Aabb, Vec2};

/// Errors raised when constructing a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid needs at least one column and one row (got {columns}x{rows})")]
    ZeroDimensions { columns: usize, rows: usize },
    #[error("grid bounds have no area: {0:?}")]
    DegenerateBounds(Aabb),
}

/// Uniform grid over a world rectangle, storing one `C` per cell.
///
/// Cells are laid out row-major: `index = row * columns + col`, with row 0 at
/// the bottom (minimum y) and column 0 at the left (minimum x).
#[derive(Debug, Clone)]
pub struct SpatialGrid<C> {
    bounds: Aabb,
    columns: usize,
    rows: usize,
    inv_cell_width: f32,
    inv_cell_height: f32,
    cells: Vec<C>,
}

impl<C: Default> SpatialGrid<C> {
    /// Creates a grid mapping `bounds` onto `columns × rows` default cells.
    pub fn new(columns: usize, rows: usize, bounds: Aabb) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::ZeroDimensions { columns, rows });
        }
        if bounds.is_degenerate() {
            return Err(GridError::DegenerateBounds(bounds));
        }

        let mut cells = Vec::with_capacity(columns * rows);
        cells.resize_with(columns * rows, C::default);

        Ok(Self {
            bounds,
            columns,
            rows,
            inv_cell_width: columns as f32 / bounds.width(),
            inv_cell_height: rows as f32 / bounds.height(),
            cells,
        })
    }
}

impl<C> SpatialGrid<C> {
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The world rectangle this grid maps.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.columns);
        row * self.columns + col
    }

    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.columns, index % self.columns)
    }

    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.cells.len()
    }

    /// Returns true if the position lies inside the world bounds (inclusive).
    pub fn contains(&self, position: Vec2) -> bool {
        self.bounds.contains(position)
    }

    /// Cell index for a position, clamped to the grid on each axis.
    pub fn cell_index(&self, position: Vec2) -> usize {
        self.index(self.row_of(position.y), self.column_of(position.x))
    }

    /// Column holding `x`, clamped.
    pub fn column_of(&self, x: f32) -> usize {
        Self::axis_slot(
            x,
            self.bounds.min.x,
            self.bounds.max.x,
            self.inv_cell_width,
            self.columns,
        )
    }

    /// Row holding `y`, clamped.
    pub fn row_of(&self, y: f32) -> usize {
        Self::axis_slot(
            y,
            self.bounds.min.y,
            self.bounds.max.y,
            self.inv_cell_height,
            self.rows,
        )
    }

    /// Every cell `cell_index` can return for a point of `area`.
    ///
    /// The slot mapping is monotone on each axis, so the span between the
    /// corners' cells holds the cell of every point in between.
    pub fn cells_spanned(&self, area: &Aabb) -> impl Iterator<Item = usize> + '_ {
        let cols = self.column_of(area.min.x)..=self.column_of(area.max.x);
        let rows = self.row_of(area.min.y)..=self.row_of(area.max.y);
        rows.flat_map(move |row| cols.clone().map(move |col| self.index(row, col)))
    }

    fn axis_slot(value: f32, min: f32, max: f32, inv_size: f32, count: usize) -> usize {
        if value <= min || value.is_nan() {
            0
        } else if value >= max {
            count - 1
        } else {
            // Float rounding can land exactly on `count` just below `max`
            (((value - min) * inv_size) as usize).min(count - 1)
        }
    }

    /// World rectangle covered by a cell.
    pub fn cell_bounds(&self, index: usize) -> Aabb {
        let (row, col) = self.row_col(index);
        let cell_width = self.bounds.width() / self.columns as f32;
        let cell_height = self.bounds.height() / self.rows as f32;
        let min = Vec2::new(
            self.bounds.min.x + col as f32 * cell_width,
            self.bounds.min.y + row as f32 * cell_height,
        );
        // Snap the last row/column to the world edge so rounding leaves no gap
        let max = Vec2::new(
            if col + 1 == self.columns {
                self.bounds.max.x
            } else {
                min.x + cell_width
            },
            if row + 1 == self.rows {
                self.bounds.max.y
            } else {
                min.y + cell_height
            },
        );
        Aabb { min, max }
    }

    pub fn cell(&self, index: usize) -> Option<&C> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut C> {
        self.cells.get_mut(index)
    }

    /// Cell holding a position (clamped, see [`SpatialGrid::cell_index`]).
    pub fn cell_at(&self, position: Vec2) -> &C {
        &self.cells[self.cell_index(position)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut C> {
        self.cells.iter_mut()
    }
}

impl<C> Index<usize> for SpatialGrid<C> {
    type Output = C;

    fn index(&self, index: usize) -> &C {
        &self.cells[index]
    }
}

impl<C> IndexMut<usize> for SpatialGrid<C> {
    fn index_mut(&mut self, index: usize) -> &mut C {
        &mut self.cells[index]
    }
}
