//! Zone Overlap Graph
//!
//! Zones are nodes; an edge joins two zones whose rectangles intersect
//! (inclusive, so touching zones are neighbors). The graph is colored with a
//! greedy first-fit pass in zone order, which is deterministic for a given
//! input order but not guaranteed to use the minimum number of colors.

use thiserror::Error;
use trigger_events::Aabb;

use crate::palette::{Color, ColorMask, PALETTE_SIZE};

/// Errors raised while coloring the overlap graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColoringError {
    /// A zone overlaps neighbors holding every color of the palette.
    #[error("zone {zone} overlaps zones using all {palette} colors")]
    TooManyOverlaps { zone: usize, palette: usize },
}

/// Adjacency lists of the zone overlap graph, indexed by zone.
#[derive(Debug, Clone, Default)]
pub struct OverlapGraph {
    neighbors: Vec<Vec<usize>>,
}

impl OverlapGraph {
    /// Builds the adjacency with a pairwise test. O(n²), meant for build time.
    pub fn build(zones: &[Aabb]) -> Self {
        let mut neighbors = vec![Vec::new(); zones.len()];
        for i in 0..zones.len() {
            for j in (i + 1)..zones.len() {
                if zones[i].intersects(&zones[j]) {
                    neighbors[i].push(j);
                    neighbors[j].push(i);
                }
            }
        }
        // Lists come out ascending: lower ids are pushed before higher ones
        Self { neighbors }
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn neighbors(&self, zone: usize) -> &[usize] {
        &self.neighbors[zone]
    }

    pub fn degree(&self, zone: usize) -> usize {
        self.neighbors[zone].len()
    }

    pub fn max_degree(&self) -> usize {
        self.neighbors.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of edges (each counted once).
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }
}

/// Assigns each zone the lowest color unused by its already-colored neighbors.
pub fn color_graph(graph: &OverlapGraph) -> Result<Vec<Color>, ColoringError> {
    let mut colors: Vec<Option<Color>> = vec![None; graph.len()];

    for zone in 0..graph.len() {
        let taken: ColorMask = graph
            .neighbors(zone)
            .iter()
            .filter_map(|&n| colors[n])
            .collect();

        let color = taken.first_free().ok_or(ColoringError::TooManyOverlaps {
            zone,
            palette: PALETTE_SIZE,
        })?;
        colors[zone] = Some(color);
    }

    let colors: Vec<Color> = colors.into_iter().flatten().collect();
    debug_assert_eq!(colors.len(), graph.len());
    debug_assert!(is_proper_coloring(graph, &colors));
    Ok(colors)
}

/// True when no two neighbors share a color.
pub fn is_proper_coloring(graph: &OverlapGraph, colors: &[Color]) -> bool {
    colors.len() == graph.len()
        && (0..graph.len()).all(|zone| {
            graph
                .neighbors(zone)
                .iter()
                .all(|&n| colors[n] != colors[zone])
        })
}

/// Number of distinct colors in a coloring.
pub fn colors_used(colors: &[Color]) -> usize {
    colors.iter().copied().collect::<ColorMask>().len()
}
