//! Shared geometry and event types for the zone trigger system.
//!
//! This crate contains pure data structures with no trigger logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod geometry;

// Re-export geometry types
pub use geometry::{Aabb, Vec2};

// Re-export event types
pub use event::{AgentId, EventType, TriggerEvent, ZoneId};
