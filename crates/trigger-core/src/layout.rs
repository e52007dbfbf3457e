//! Zone Layouts
//!
//! Named zone lists loaded from TOML, the input a level loader hands to
//! `TriggerSystem::build`.
//!
//! ```toml
//! [[zones]]
//! name = "market"
//! min = [0.0, 0.0]
//! max = [12.0, 8.0]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trigger_events::{Aabb, Vec2, ZoneId};

/// One named zone rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedZone {
    pub name: String,
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl NamedZone {
    pub fn new(name: impl Into<String>, min: [f32; 2], max: [f32; 2]) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::from(self.min), Vec2::from(self.max))
    }
}

/// An ordered list of zones. Zone `i` is built as `ZoneId(i)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    #[serde(default)]
    pub zones: Vec<NamedZone>,
}

/// Errors that can occur while loading a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("zone '{0}' has a non-finite coordinate")]
    NonFinite(String),
}

impl ZoneLayout {
    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LayoutError> {
        let layout: ZoneLayout = toml::from_str(content)?;
        if let Some(bad) = layout
            .zones
            .iter()
            .find(|z| !z.min.iter().chain(&z.max).all(|v| v.is_finite()))
        {
            return Err(LayoutError::NonFinite(bad.name.clone()));
        }
        Ok(layout)
    }

    pub fn push(&mut self, zone: NamedZone) {
        self.zones.push(zone);
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Rectangles in layout order, ready for `TriggerSystem::build`.
    pub fn bounds(&self) -> Vec<Aabb> {
        self.zones.iter().map(NamedZone::bounds).collect()
    }

    pub fn name_of(&self, zone: ZoneId) -> Option<&str> {
        self.zones.get(zone.index()).map(|z| z.name.as_str())
    }
}

/// A small town used by the simulator when no layout file is given.
pub fn demo_layout() -> ZoneLayout {
    let mut layout = ZoneLayout::default();

    // === TOWN CENTER ===
    layout.push(NamedZone::new("plaza", [-10.0, -10.0], [10.0, 10.0]));
    layout.push(NamedZone::new("fountain", [-2.0, -2.0], [2.0, 2.0]));
    layout.push(NamedZone::new("market", [5.0, -15.0], [25.0, 0.0]));
    layout.push(NamedZone::new("tavern", [-30.0, 5.0], [-12.0, 20.0]));
    layout.push(NamedZone::new("tavern_door", [-13.0, 8.0], [-9.0, 12.0]));

    // === OUTSKIRTS ===
    layout.push(NamedZone::new("north_road", [-3.0, 10.0], [3.0, 45.0]));
    layout.push(NamedZone::new("east_road", [25.0, -8.0], [45.0, -4.0]));
    layout.push(NamedZone::new("fields", [15.0, 15.0], [45.0, 45.0]));
    layout.push(NamedZone::new("watchtower", [38.0, 38.0], [45.0, 45.0]));
    layout.push(NamedZone::new("forest", [-45.0, -45.0], [-15.0, -10.0]));
    layout.push(NamedZone::new("clearing", [-35.0, -35.0], [-25.0, -25.0]));
    layout.push(NamedZone::new("river", [-45.0, -20.0], [45.0, -16.0]));

    layout
}
