//! Event Types
//!
//! Identifiers and the record delivered to zone listeners.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Vec2;

/// Dense zone identifier assigned by a build. Meaningless across builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl ZoneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone_{}", self.0)
    }
}

/// Dense agent identifier.
///
/// Ids are ephemeral: removing an agent moves the last agent into the freed
/// slot, so the moved agent's id changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{}", self.0)
    }
}

/// Kind of zone transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The agent moved into the zone
    Entering,
    /// The agent moved out of the zone
    Leaving,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Entering => write!(f, "entering"),
            EventType::Leaving => write!(f, "leaving"),
        }
    }
}

/// A single zone transition of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub event_type: EventType,
    pub zone_id: ZoneId,
    pub agent_id: AgentId,
    /// Agent position at the moment of the transition
    pub position: Vec2,
}

impl TriggerEvent {
    pub fn entering(zone_id: ZoneId, agent_id: AgentId, position: Vec2) -> Self {
        Self {
            event_type: EventType::Entering,
            zone_id,
            agent_id,
            position,
        }
    }

    pub fn leaving(zone_id: ZoneId, agent_id: AgentId, position: Vec2) -> Self {
        Self {
            event_type: EventType::Leaving,
            zone_id,
            agent_id,
            position,
        }
    }

    pub fn is_entering(&self) -> bool {
        self.event_type == EventType::Entering
    }
}
