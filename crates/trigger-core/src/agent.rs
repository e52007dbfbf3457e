//! Trigger Agents
//!
//! A tracked point moving through the zones. Agents are owned by the
//! `TriggerSystem` and only change through its methods.

use trigger_events::{AgentId, Vec2};

use crate::palette::ColorMask;

/// Where an agent stands in the update protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentState {
    /// Created but never placed (or the system was destroyed since)
    #[default]
    Uninitialized,
    /// Inside the world; `cell` is the grid cell of the last position
    Tracking { cell: usize },
    /// Last seen outside the world bounds
    OutOfBounds,
}

/// A moving point whose zone occupancy is maintained incrementally.
#[derive(Debug, Clone)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) position: Vec2,
    /// Colors of the zones the agent is currently inside
    pub(crate) colors: ColorMask,
    pub(crate) state: AgentState,
}

impl Agent {
    pub(crate) fn new(id: AgentId) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            colors: ColorMask::EMPTY,
            state: AgentState::Uninitialized,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn colors(&self) -> ColorMask {
        self.colors
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Grid cell of the last in-bounds position, if tracking.
    pub fn last_cell(&self) -> Option<usize> {
        match self.state {
            AgentState::Tracking { cell } => Some(cell),
            _ => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state != AgentState::Uninitialized
    }

    /// Drops all occupancy; the agent must be initialized again.
    pub(crate) fn reset(&mut self) {
        self.colors = ColorMask::EMPTY;
        self.state = AgentState::Uninitialized;
    }
}
