//! Trigger Cells
//!
//! Each grid cell caches the zones whose rectangle touches it, together with
//! their colors, so a position update only looks at a handful of candidates.

use trigger_events::{Aabb, Vec2};

use crate::grid::SpatialGrid;
use crate::palette::Color;

/// A zone candidate stored in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellElement {
    /// Index of the zone in the system's zone arena
    pub zone: usize,
    pub color: Color,
}

/// Candidate zones for one grid cell.
#[derive(Debug, Clone, Default)]
pub struct TriggerCell {
    pub elements: Vec<CellElement>,
}

impl TriggerCell {
    pub fn find_zone(&self, zone: usize) -> Option<&CellElement> {
        self.elements.iter().find(|e| e.zone == zone)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Candidates whose rectangle contains `position`.
    pub fn elements_at<'a>(
        &'a self,
        position: Vec2,
        zones: &'a [Aabb],
    ) -> impl Iterator<Item = &'a CellElement> + 'a {
        self.elements
            .iter()
            .filter(move |e| zones[e.zone].contains(position))
    }
}

/// Records every zone in every cell a contained point can resolve to.
///
/// Cells are picked with the grid's own slot mapping rather than by
/// rectangle tests, so rounding can never separate a point from its zone.
pub fn populate(grid: &mut SpatialGrid<TriggerCell>, zones: &[Aabb], colors: &[Color]) {
    for cell in grid.iter_mut() {
        cell.elements.clear();
    }

    for (zone, (area, &color)) in zones.iter().zip(colors).enumerate() {
        if !area.intersects(grid.bounds()) {
            continue;
        }
        let cells: Vec<usize> = grid.cells_spanned(area).collect();
        for index in cells {
            grid[index].elements.push(CellElement { zone, color });
        }
    }
}
