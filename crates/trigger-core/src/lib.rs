//! Zone trigger engine: colored zone graph, spatial grid, agent tracking.
//!
//! # Modules
//!
//! - [`palette`]: color bits and masks
//! - [`grid`]: uniform spatial grid
//! - [`graph`]: zone overlap graph and greedy coloring
//! - [`cell`]: per-cell zone candidates
//! - [`listeners`]: per-zone callback lists and connections
//! - [`agent`]: tracked agents
//! - [`system`]: the `TriggerSystem` build and update protocol
//! - [`config`]: TOML configuration
//! - [`layout`]: named zone layouts
//! - [`logger`]: JSONL event log

pub mod agent;
pub mod cell;
pub mod config;
pub mod graph;
pub mod grid;
pub mod layout;
pub mod listeners;
pub mod logger;
pub mod palette;
pub mod system;

pub use agent::{Agent, AgentState};
pub use config::{default_config_toml, ConfigError, GridConfig, TriggerConfig};
pub use graph::{color_graph, is_proper_coloring, ColoringError, OverlapGraph};
pub use grid::{GridError, SpatialGrid};
pub use layout::{demo_layout, LayoutError, NamedZone, ZoneLayout};
pub use listeners::{Connection, Listener, ListenerKey};
pub use logger::{EventLogger, EventRecord};
pub use palette::{Color, ColorMask, PALETTE_SIZE};
pub use system::{BuildError, BuildStats, Renumbered, TriggerCode, TriggerError, TriggerSystem};

// Re-export the shared data types
pub use trigger_events::{Aabb, AgentId, EventType, TriggerEvent, Vec2, ZoneId};
