//! Trigger System
//!
//! Owns a static set of zones and a dynamic set of agents, and fires
//! Entering/Leaving events exactly once per zone transition.
//!
//! # Build
//!
//! `zones → overlap graph → greedy coloring → grid of colored candidates`.
//! Overlapping zones never share a color, so the zones an agent stands in are
//! recorded as a single [`ColorMask`].
//!
//! # Updates
//!
//! Each position update only looks at the candidates of the agent's previous
//! and current grid cells:
//!
//! - outside the world: leave every tracked zone
//! - same cell: re-test that cell's candidates
//! - different cell ("remap"): re-test the zones tracked in the old cell, then
//!   pick up new zones from the new cell
//!
//! A move that skips over cells in one step never consults the skipped cells
//! ("big jump"). Occupancy at the destination is still exact, but a zone that
//! was entered and left again between two updates fires nothing.
//!
//! Colors are unique only among mutually overlapping zones; two disjoint zones
//! in one cell may share a bit. A zone therefore counts as previously occupied
//! only if its bit is set *and* it contains the previous position.

use thiserror::Error;
use tracing::{debug, info, trace, warn};
use trigger_events::{Aabb, AgentId, TriggerEvent, Vec2, ZoneId};

use crate::agent::{Agent, AgentState};
use crate::cell::{self, CellElement, TriggerCell};
use crate::config::TriggerConfig;
use crate::graph::{color_graph, colors_used, ColoringError, OverlapGraph};
use crate::grid::{GridError, SpatialGrid};
use crate::listeners::{Connection, ListenerList};
use crate::palette::{Color, ColorMask};

/// Routine outcome of placing or moving an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCode {
    Ok,
    /// Outside the world bounds, or in a zone-free spot of its cell
    UnreachablePosition,
}

/// Precondition violations of per-call operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error("the trigger system is not built")]
    SystemNotBuilt,
    #[error("{0} is already initialized")]
    AlreadyInitialized(AgentId),
    #[error("{0} has not been initialized")]
    NotInitialized(AgentId),
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),
}

/// Reasons a build is rejected. The system is left unbuilt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("the system is already built, call destroy() first")]
    AlreadyBuilt,
    #[error("no zones were given to build the system")]
    EmptyZoneList,
    #[error(transparent)]
    Coloring(#[from] ColoringError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// An agent whose id changed because another agent was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renumbered {
    pub from: AgentId,
    pub to: AgentId,
}

/// Summary of a successful build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildStats {
    pub zones: usize,
    pub overlaps: usize,
    pub colors_used: usize,
    pub cells: usize,
    /// Zone entries across all cells (zones are duplicated per cell)
    pub cell_entries: usize,
    pub max_cell_candidates: usize,
    pub world_bounds: Aabb,
}

/// Zone arena and spatial index of one build, addressed by zone index.
#[derive(Debug)]
struct BuiltZones {
    zones: Vec<Aabb>,
    colors: Vec<Color>,
    graph: OverlapGraph,
    listeners: Vec<ListenerList>,
    grid: SpatialGrid<TriggerCell>,
    stats: BuildStats,
}

impl BuiltZones {
    fn cell(&self, index: usize) -> &TriggerCell {
        &self.grid[index]
    }

    fn was_inside(&self, element: &CellElement, agent: &Agent) -> bool {
        agent.colors.contains(element.color) && self.zones[element.zone].contains(agent.position)
    }

    fn leave_world(
        &self,
        agent: &mut Agent,
        position: Vec2,
        pending: &mut Vec<TriggerEvent>,
    ) -> TriggerCode {
        if let Some(old) = agent.last_cell() {
            for element in &self.cell(old).elements {
                if self.was_inside(element, agent) {
                    pending.push(TriggerEvent::leaving(zone_id(element.zone), agent.id, position));
                }
            }
        }
        agent.colors = ColorMask::EMPTY;
        agent.state = AgentState::OutOfBounds;
        agent.position = position;
        TriggerCode::UnreachablePosition
    }

    fn update_in_cell(
        &self,
        agent: &mut Agent,
        cell: usize,
        position: Vec2,
        pending: &mut Vec<TriggerEvent>,
    ) -> TriggerCode {
        let mut colors = ColorMask::EMPTY;
        for element in &self.cell(cell).elements {
            let inside_now = self.zones[element.zone].contains(position);
            match (self.was_inside(element, agent), inside_now) {
                (false, true) => {
                    colors.insert(element.color);
                    pending.push(TriggerEvent::entering(zone_id(element.zone), agent.id, position));
                }
                (true, true) => colors.insert(element.color),
                (true, false) => {
                    pending.push(TriggerEvent::leaving(zone_id(element.zone), agent.id, position));
                }
                (false, false) => {}
            }
        }

        agent.colors = colors;
        agent.position = position;
        if colors.is_empty() {
            TriggerCode::UnreachablePosition
        } else {
            TriggerCode::Ok
        }
    }

    fn remap(
        &self,
        agent: &mut Agent,
        new_cell: usize,
        position: Vec2,
        pending: &mut Vec<TriggerEvent>,
    ) -> TriggerCode {
        let target = self.cell(new_cell);
        let mut colors = ColorMask::EMPTY;

        // Zones tracked in the old cell: carry them over or leave them
        let old_cell = agent.last_cell();
        if let Some(old) = old_cell {
            for element in &self.cell(old).elements {
                if !self.was_inside(element, agent) {
                    continue;
                }
                if self.zones[element.zone].contains(position) {
                    // A zone containing the point is always a candidate of its cell
                    debug_assert!(target.find_zone(element.zone).is_some());
                    colors.insert(element.color);
                } else {
                    pending.push(TriggerEvent::leaving(zone_id(element.zone), agent.id, position));
                }
            }
        }

        // Zones only the new cell knows about
        for element in &target.elements {
            if !colors.contains(element.color) && self.zones[element.zone].contains(position) {
                colors.insert(element.color);
                pending.push(TriggerEvent::entering(zone_id(element.zone), agent.id, position));
            }
        }

        debug!(agent = %agent.id, from = ?old_cell, to = new_cell, "agent remapped to new cell");
        agent.colors = colors;
        agent.state = AgentState::Tracking { cell: new_cell };
        agent.position = position;
        TriggerCode::Ok
    }
}

fn zone_id(index: usize) -> ZoneId {
    ZoneId(index as u32)
}

fn dispatch(listeners: &mut [ListenerList], pending: &mut Vec<TriggerEvent>) {
    for event in pending.drain(..) {
        trace!(
            zone = %event.zone_id,
            agent = %event.agent_id,
            kind = %event.event_type,
            "zone event"
        );
        listeners[event.zone_id.index()].dispatch(&event);
    }
}

/// Spatial event dispatcher for a static zone set and moving agents.
///
/// Single-threaded. Listeners run synchronously inside
/// [`TriggerSystem::initialize_agent`] and [`TriggerSystem::update_position`],
/// after the agent's new state is stored.
#[derive(Debug)]
pub struct TriggerSystem {
    config: TriggerConfig,
    built: Option<BuiltZones>,
    agents: Vec<Agent>,
    /// Bumped on every build and destroy; stales old connections
    epoch: u64,
    /// Events of the call in progress
    pending: Vec<TriggerEvent>,
}

impl Default for TriggerSystem {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TriggerSystem {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            built: None,
            agents: Vec::new(),
            epoch: 0,
            pending: Vec::with_capacity(crate::palette::PALETTE_SIZE),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TriggerConfig::default())
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Builds the zone graph, colors it and buckets the zones into the grid.
    ///
    /// Zone `i` of the input gets `ZoneId(i)`. The coloring depends on input
    /// order. O(n²) in the number of zones; call once during setup.
    pub fn build(&mut self, zones: &[Aabb]) -> Result<Vec<ZoneId>, BuildError> {
        if self.built.is_some() {
            warn!("rejecting build: the system is already built");
            return Err(BuildError::AlreadyBuilt);
        }
        if zones.is_empty() {
            warn!("rejecting build: no zones");
            return Err(BuildError::EmptyZoneList);
        }

        let graph = OverlapGraph::build(zones);
        let colors = match color_graph(&graph) {
            Ok(colors) => colors,
            Err(e) => {
                warn!(error = %e, zones = zones.len(), "could not color the zone overlap graph");
                return Err(e.into());
            }
        };

        let world = self
            .config
            .world_bounds
            .unwrap_or_else(|| zones[1..].iter().fold(zones[0], |acc, z| acc.union(z)));
        let mut grid =
            match SpatialGrid::new(self.config.grid.columns, self.config.grid.rows, world) {
                Ok(grid) => grid,
                Err(e) => {
                    warn!(error = %e, "could not create the spatial grid");
                    return Err(e.into());
                }
            };
        cell::populate(&mut grid, zones, &colors);

        let stats = BuildStats {
            zones: zones.len(),
            overlaps: graph.edge_count(),
            colors_used: colors_used(&colors),
            cells: grid.len(),
            cell_entries: grid.iter().map(TriggerCell::len).sum(),
            max_cell_candidates: grid.iter().map(TriggerCell::len).max().unwrap_or(0),
            world_bounds: world,
        };
        info!(
            zones = stats.zones,
            overlaps = stats.overlaps,
            colors = stats.colors_used,
            cells = stats.cells,
            max_candidates = stats.max_cell_candidates,
            "trigger system built"
        );

        let mut listeners = Vec::with_capacity(zones.len());
        listeners.resize_with(zones.len(), ListenerList::new);

        self.built = Some(BuiltZones {
            zones: zones.to_vec(),
            colors,
            graph,
            listeners,
            grid,
            stats,
        });
        self.epoch += 1;

        Ok((0..zones.len()).map(zone_id).collect())
    }

    /// Drops zones, grid and listeners. Agents survive but must be
    /// initialized again after the next build.
    pub fn destroy(&mut self) {
        if self.built.take().is_some() {
            info!(agents = self.agents.len(), "trigger system destroyed");
        }
        for agent in &mut self.agents {
            agent.reset();
        }
        self.epoch += 1;
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Subscribes a listener to a zone's Entering/Leaving events.
    pub fn add_callback<F>(&mut self, zone: ZoneId, listener: F) -> Result<Connection, TriggerError>
    where
        F: FnMut(&TriggerEvent) + 'static,
    {
        let built = self.built.as_mut().ok_or(TriggerError::SystemNotBuilt)?;
        let list = built.listeners.get_mut(zone.index()).ok_or_else(|| {
            warn!(%zone, "callback for unknown zone");
            TriggerError::UnknownZone(zone)
        })?;
        let key = list.connect(Box::new(listener));
        Ok(Connection {
            zone,
            key,
            build: self.epoch,
        })
    }

    /// Revokes a listener. Returns false if it was already gone or belongs to
    /// a destroyed build.
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        if connection.build != self.epoch {
            return false;
        }
        self.built
            .as_mut()
            .and_then(|built| built.listeners.get_mut(connection.zone.index()))
            .is_some_and(|list| list.disconnect(connection.key))
    }

    // ------------------------------------------------------------------
    // Zone queries
    // ------------------------------------------------------------------

    pub fn zone_count(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.zones.len())
    }

    pub fn zone_bounds(&self, zone: ZoneId) -> Option<Aabb> {
        self.built.as_ref()?.zones.get(zone.index()).copied()
    }

    pub fn zone_color(&self, zone: ZoneId) -> Option<Color> {
        self.built.as_ref()?.colors.get(zone.index()).copied()
    }

    /// Zones whose rectangles overlap the given zone.
    pub fn zone_neighbors(&self, zone: ZoneId) -> Option<Vec<ZoneId>> {
        let built = self.built.as_ref()?;
        if zone.index() >= built.graph.len() {
            return None;
        }
        Some(built.graph.neighbors(zone.index()).iter().map(|&n| zone_id(n)).collect())
    }

    /// Number of listeners connected to a zone.
    pub fn listener_count(&self, zone: ZoneId) -> usize {
        self.built
            .as_ref()
            .and_then(|b| b.listeners.get(zone.index()))
            .map_or(0, ListenerList::len)
    }

    pub fn world_bounds(&self) -> Option<Aabb> {
        self.built.as_ref().map(|b| *b.grid.bounds())
    }

    pub fn stats(&self) -> Option<&BuildStats> {
        self.built.as_ref().map(|b| &b.stats)
    }

    /// Every zone containing `position`. Empty outside the world bounds.
    pub fn zones_at(&self, position: Vec2) -> Result<Vec<ZoneId>, TriggerError> {
        let built = self.built.as_ref().ok_or(TriggerError::SystemNotBuilt)?;
        if !built.grid.contains(position) {
            return Ok(Vec::new());
        }
        Ok(built
            .grid
            .cell_at(position)
            .elements_at(position, &built.zones)
            .map(|e| zone_id(e.zone))
            .collect())
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    /// Adds an uninitialized agent and returns its id.
    pub fn create_agent(&mut self) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        self.agents.push(Agent::new(id));
        debug!(agent = %id, "agent created");
        id
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Removes an agent by moving the last agent into its slot.
    ///
    /// Returns the renumbering of the moved agent, if any. No Leaving events
    /// are fired for the removed agent.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Option<Renumbered>, TriggerError> {
        if id.index() >= self.agents.len() {
            warn!(agent = %id, count = self.agents.len(), "removing unknown agent");
            return Err(TriggerError::UnknownAgent(id));
        }

        self.agents.swap_remove(id.index());
        let renumbered = self.agents.get_mut(id.index()).map(|moved| {
            let from = moved.id;
            moved.id = id;
            Renumbered { from, to: id }
        });
        debug!(agent = %id, moved = ?renumbered, "agent removed");
        Ok(renumbered)
    }

    /// Places an agent for the first time and fires Entering for every zone
    /// containing the position.
    ///
    /// An out-of-bounds position returns `UnreachablePosition` and leaves the
    /// agent uninitialized.
    pub fn initialize_agent(
        &mut self,
        id: AgentId,
        position: Vec2,
    ) -> Result<TriggerCode, TriggerError> {
        let built = self.built.as_mut().ok_or(TriggerError::SystemNotBuilt)?;
        let agent = self.agents.get_mut(id.index()).ok_or_else(|| {
            warn!(agent = %id, "unknown agent");
            TriggerError::UnknownAgent(id)
        })?;
        if agent.is_initialized() {
            return Err(TriggerError::AlreadyInitialized(id));
        }

        if !built.grid.contains(position) {
            warn!(
                agent = %id,
                x = position.x,
                y = position.y,
                "initializing agent outside the world bounds"
            );
            return Ok(TriggerCode::UnreachablePosition);
        }

        let cell = built.grid.cell_index(position);
        let mut colors = ColorMask::EMPTY;
        for element in built.cell(cell).elements_at(position, &built.zones) {
            colors.insert(element.color);
            self.pending
                .push(TriggerEvent::entering(zone_id(element.zone), id, position));
        }
        agent.position = position;
        agent.colors = colors;
        agent.state = AgentState::Tracking { cell };

        dispatch(&mut built.listeners, &mut self.pending);
        Ok(TriggerCode::Ok)
    }

    /// Moves an agent and fires the Entering/Leaving events of the move.
    pub fn update_position(
        &mut self,
        id: AgentId,
        position: Vec2,
    ) -> Result<TriggerCode, TriggerError> {
        let built = self.built.as_mut().ok_or(TriggerError::SystemNotBuilt)?;
        let agent = self.agents.get_mut(id.index()).ok_or_else(|| {
            warn!(agent = %id, "unknown agent");
            TriggerError::UnknownAgent(id)
        })?;
        if !agent.is_initialized() {
            return Err(TriggerError::NotInitialized(id));
        }

        let code = if !built.grid.contains(position) {
            built.leave_world(agent, position, &mut self.pending)
        } else {
            let cell = built.grid.cell_index(position);
            if agent.last_cell() == Some(cell) {
                built.update_in_cell(agent, cell, position, &mut self.pending)
            } else {
                built.remap(agent, cell, position, &mut self.pending)
            }
        };

        dispatch(&mut built.listeners, &mut self.pending);
        Ok(code)
    }

    /// Zones the agent is currently tracked inside.
    pub fn occupied_zones(&self, id: AgentId) -> Result<Vec<ZoneId>, TriggerError> {
        let built = self.built.as_ref().ok_or(TriggerError::SystemNotBuilt)?;
        let agent = self.agent(id).ok_or(TriggerError::UnknownAgent(id))?;
        let Some(cell) = agent.last_cell() else {
            return Ok(Vec::new());
        };
        Ok(built
            .cell(cell)
            .elements
            .iter()
            .filter(|e| built.was_inside(e, agent))
            .map(|e| zone_id(e.zone))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE_SIZE;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect(left: f32, bottom: f32, right: f32, top: f32) -> Aabb {
        Aabb::new(Vec2::new(left, bottom), Vec2::new(right, top))
    }

    fn chain() -> Vec<Aabb> {
        vec![
            rect(-2.0, -1.0, 2.0, 1.0),
            rect(0.5, -1.0, 4.5, 1.0),
            rect(3.0, -1.0, 7.0, 1.0),
        ]
    }

    type Recorded = Rc<RefCell<Vec<TriggerEvent>>>;

    fn record_all(system: &mut TriggerSystem) -> Recorded {
        let events: Recorded = Rc::new(RefCell::new(Vec::new()));
        for zone in 0..system.zone_count() {
            let events = Rc::clone(&events);
            system
                .add_callback(ZoneId(zone as u32), move |e| events.borrow_mut().push(*e))
                .unwrap();
        }
        events
    }

    fn take(events: &Recorded) -> Vec<(Kind, u32)> {
        events
            .borrow_mut()
            .drain(..)
            .map(|e| {
                let kind = if e.is_entering() {
                    Kind::In
                } else {
                    Kind::Out
                };
                (kind, e.zone_id.0)
            })
            .collect()
    }

    #[derive(Debug, PartialEq)]
    enum Kind {
        In,
        Out,
    }
    use Kind::{In, Out};

    #[test]
    fn test_build_assigns_dense_ids() {
        let mut system = TriggerSystem::with_defaults();
        let ids = system.build(&chain()).unwrap();

        assert_eq!(ids, vec![ZoneId(0), ZoneId(1), ZoneId(2)]);
        assert!(system.is_built());
        assert_eq!(system.zone_count(), 3);
        assert_eq!(system.zone_neighbors(ZoneId(1)), Some(vec![ZoneId(0), ZoneId(2)]));
        assert_eq!(system.zone_bounds(ZoneId(2)), Some(chain()[2]));
        assert_eq!(system.zone_bounds(ZoneId(3)), None);

        let stats = system.stats().unwrap();
        assert_eq!(stats.zones, 3);
        assert_eq!(stats.overlaps, 2);
        assert_eq!(stats.colors_used, 2);
        assert_eq!(stats.world_bounds, rect(-2.0, -1.0, 7.0, 1.0));
    }

    #[test]
    fn test_build_rejections() {
        let mut system = TriggerSystem::with_defaults();
        assert_eq!(system.build(&[]), Err(BuildError::EmptyZoneList));
        assert!(!system.is_built());

        system.build(&chain()).unwrap();
        assert_eq!(system.build(&chain()), Err(BuildError::AlreadyBuilt));

        system.destroy();
        assert!(!system.is_built());
        assert!(system.build(&chain()).is_ok());
    }

    #[test]
    fn test_build_fails_on_palette_overflow() {
        let zones: Vec<Aabb> = (0..=PALETTE_SIZE)
            .map(|i| Aabb::from_center(Vec2::ZERO, Vec2::new(1.0 + i as f32, 1.0 + i as f32)))
            .collect();
        let mut system = TriggerSystem::with_defaults();

        assert!(matches!(
            system.build(&zones),
            Err(BuildError::Coloring(ColoringError::TooManyOverlaps { .. }))
        ));
        assert!(!system.is_built());
        assert_eq!(system.zone_count(), 0);

        // The system is still usable
        assert!(system.build(&zones[..PALETTE_SIZE]).is_ok());
    }

    #[test]
    fn test_build_fails_on_bad_grid() {
        let config = TriggerConfig::default().with_grid(0, 4);
        let mut system = TriggerSystem::new(config);
        assert!(matches!(
            system.build(&chain()),
            Err(BuildError::Grid(GridError::ZeroDimensions { .. }))
        ));
        assert!(!system.is_built());
    }

    #[test]
    fn test_world_bounds_from_config() {
        let world = rect(-50.0, -50.0, 50.0, 50.0);
        let mut system = TriggerSystem::new(TriggerConfig::default().with_world_bounds(world));
        system.build(&chain()).unwrap();
        assert_eq!(system.world_bounds(), Some(world));
    }

    #[test]
    fn test_chain_walk() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let events = record_all(&mut system);
        let agent = system.create_agent();

        assert_eq!(
            system.initialize_agent(agent, Vec2::new(-1.0, 0.0)),
            Ok(TriggerCode::Ok)
        );
        assert_eq!(take(&events), vec![(In, 0)]);

        system.update_position(agent, Vec2::new(2.5, 0.0)).unwrap();
        assert_eq!(take(&events), vec![(Out, 0), (In, 1)]);

        system.update_position(agent, Vec2::new(5.0, 0.0)).unwrap();
        assert_eq!(take(&events), vec![(Out, 1), (In, 2)]);

        // Straight back, never passing through zone 1
        system.update_position(agent, Vec2::new(-1.0, 0.0)).unwrap();
        assert_eq!(take(&events), vec![(Out, 2), (In, 0)]);
        assert_eq!(system.occupied_zones(agent), Ok(vec![ZoneId(0)]));
    }

    #[test]
    fn test_overlap_region_tracks_both_zones() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let events = record_all(&mut system);
        let agent = system.create_agent();

        system.initialize_agent(agent, Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(take(&events), vec![(In, 0), (In, 1)]);

        // Exactly on zone 0's right edge: still inside both
        system.update_position(agent, Vec2::new(2.0, 0.0)).unwrap();
        assert!(take(&events).is_empty());

        system.update_position(agent, Vec2::new(2.01, 0.0)).unwrap();
        assert_eq!(take(&events), vec![(Out, 0)]);

        let colors = system.agent(agent).unwrap().colors();
        assert_eq!(colors.len(), 1);
        assert!(colors.contains(system.zone_color(ZoneId(1)).unwrap()));
    }

    #[test]
    fn test_disjoint_zones_sharing_a_color_in_one_cell() {
        let mut system = TriggerSystem::new(TriggerConfig::default().with_grid(1, 1));
        system
            .build(&[rect(0.0, 0.0, 1.0, 1.0), rect(2.0, 0.0, 3.0, 1.0)])
            .unwrap();
        assert_eq!(system.zone_color(ZoneId(0)), system.zone_color(ZoneId(1)));
        let events = record_all(&mut system);
        let agent = system.create_agent();

        system.initialize_agent(agent, Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!(take(&events), vec![(In, 0)]);

        assert_eq!(
            system.update_position(agent, Vec2::new(2.5, 0.5)),
            Ok(TriggerCode::Ok)
        );
        assert_eq!(take(&events), vec![(Out, 0), (In, 1)]);

        // In bounds but between the zones
        assert_eq!(
            system.update_position(agent, Vec2::new(1.5, 0.5)),
            Ok(TriggerCode::UnreachablePosition)
        );
        assert_eq!(take(&events), vec![(Out, 1)]);
        assert!(system.agent(agent).unwrap().colors().is_empty());
    }

    #[test]
    fn test_leaving_the_world() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let events = record_all(&mut system);
        let agent = system.create_agent();
        system.initialize_agent(agent, Vec2::new(4.0, 0.0)).unwrap();
        assert_eq!(take(&events), vec![(In, 1), (In, 2)]);

        assert_eq!(
            system.update_position(agent, Vec2::new(1000.0, 1000.0)),
            Ok(TriggerCode::UnreachablePosition)
        );
        assert_eq!(take(&events), vec![(Out, 1), (Out, 2)]);
        assert_eq!(system.agent(agent).unwrap().state(), AgentState::OutOfBounds);

        // Still outside: nothing to leave
        system.update_position(agent, Vec2::new(-500.0, 0.0)).unwrap();
        assert!(take(&events).is_empty());

        // Back inside
        assert_eq!(
            system.update_position(agent, Vec2::new(6.0, 0.5)),
            Ok(TriggerCode::Ok)
        );
        assert_eq!(take(&events), vec![(In, 2)]);
    }

    #[test]
    fn test_event_carries_agent_and_position() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let events = record_all(&mut system);
        system.create_agent();
        let agent = system.create_agent();

        system.initialize_agent(agent, Vec2::new(6.0, 0.25)).unwrap();
        let recorded = events.borrow();
        assert_eq!(
            recorded.as_slice(),
            &[TriggerEvent::entering(ZoneId(2), AgentId(1), Vec2::new(6.0, 0.25))]
        );
    }

    #[test]
    fn test_precondition_errors() {
        let mut system = TriggerSystem::with_defaults();
        let agent = system.create_agent();

        assert_eq!(
            system.initialize_agent(agent, Vec2::ZERO),
            Err(TriggerError::SystemNotBuilt)
        );
        assert_eq!(
            system.update_position(agent, Vec2::ZERO),
            Err(TriggerError::SystemNotBuilt)
        );
        assert_eq!(
            system.add_callback(ZoneId(0), |_| {}).unwrap_err(),
            TriggerError::SystemNotBuilt
        );
        assert_eq!(system.zones_at(Vec2::ZERO), Err(TriggerError::SystemNotBuilt));

        system.build(&chain()).unwrap();
        assert_eq!(
            system.update_position(agent, Vec2::ZERO),
            Err(TriggerError::NotInitialized(agent))
        );
        assert_eq!(
            system.initialize_agent(AgentId(9), Vec2::ZERO),
            Err(TriggerError::UnknownAgent(AgentId(9)))
        );
        assert_eq!(
            system.add_callback(ZoneId(3), |_| {}).unwrap_err(),
            TriggerError::UnknownZone(ZoneId(3))
        );

        system.initialize_agent(agent, Vec2::ZERO).unwrap();
        assert_eq!(
            system.initialize_agent(agent, Vec2::ZERO),
            Err(TriggerError::AlreadyInitialized(agent))
        );
    }

    #[test]
    fn test_initialize_out_of_bounds_can_retry() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let events = record_all(&mut system);
        let agent = system.create_agent();

        assert_eq!(
            system.initialize_agent(agent, Vec2::new(100.0, 0.0)),
            Ok(TriggerCode::UnreachablePosition)
        );
        assert!(!system.agent(agent).unwrap().is_initialized());
        assert!(take(&events).is_empty());

        assert_eq!(
            system.initialize_agent(agent, Vec2::new(0.0, 0.0)),
            Ok(TriggerCode::Ok)
        );
        assert_eq!(take(&events), vec![(In, 0)]);
    }

    #[test]
    fn test_remove_agent_renumbers_last() {
        let mut system = TriggerSystem::with_defaults();
        let a = system.create_agent();
        let b = system.create_agent();
        let c = system.create_agent();
        assert_eq!((a, b, c), (AgentId(0), AgentId(1), AgentId(2)));

        let moved = system.remove_agent(a).unwrap();
        assert_eq!(
            moved,
            Some(Renumbered {
                from: AgentId(2),
                to: AgentId(0)
            })
        );
        assert_eq!(system.agent_count(), 2);
        assert_eq!(system.agent(AgentId(0)).unwrap().id(), AgentId(0));

        // Removing the last one moves nothing
        assert_eq!(system.remove_agent(AgentId(1)), Ok(None));
        assert_eq!(system.remove_agent(AgentId(0)), Ok(None));
        assert_eq!(system.agent_count(), 0);

        assert_eq!(
            system.remove_agent(AgentId(0)),
            Err(TriggerError::UnknownAgent(AgentId(0)))
        );
        assert_eq!(system.create_agent(), AgentId(0));
    }

    #[test]
    fn test_renumbered_agent_keeps_its_state() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let events = record_all(&mut system);
        let first = system.create_agent();
        let second = system.create_agent();
        system.initialize_agent(second, Vec2::new(6.0, 0.0)).unwrap();
        take(&events);

        system.remove_agent(first).unwrap();
        system.update_position(AgentId(0), Vec2::new(-1.0, 0.0)).unwrap();

        let recorded = events.borrow();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().all(|e| e.agent_id == AgentId(0)));
    }

    #[test]
    fn test_disconnect() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let connection = system
            .add_callback(ZoneId(0), move |_| *counter.borrow_mut() += 1)
            .unwrap();
        assert_eq!(connection.zone(), ZoneId(0));
        assert_eq!(system.listener_count(ZoneId(0)), 1);

        let agent = system.create_agent();
        system.initialize_agent(agent, Vec2::ZERO).unwrap();
        assert_eq!(*hits.borrow(), 1);

        assert!(system.disconnect(connection));
        assert!(!system.disconnect(connection));
        assert_eq!(system.listener_count(ZoneId(0)), 0);

        system.update_position(agent, Vec2::new(5.0, 0.0)).unwrap();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_destroy_resets_agents_and_connections() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();
        let connection = system.add_callback(ZoneId(1), |_| {}).unwrap();
        let agent = system.create_agent();
        system.initialize_agent(agent, Vec2::new(1.0, 0.0)).unwrap();

        system.destroy();
        assert_eq!(system.agent_count(), 1);
        let stale = system.agent(agent).unwrap();
        assert!(!stale.is_initialized());
        assert!(stale.colors().is_empty());

        system.build(&chain()).unwrap();
        assert!(!system.disconnect(connection));
        assert_eq!(system.listener_count(ZoneId(1)), 0);
        assert_eq!(
            system.update_position(agent, Vec2::ZERO),
            Err(TriggerError::NotInitialized(agent))
        );
        assert_eq!(system.initialize_agent(agent, Vec2::ZERO), Ok(TriggerCode::Ok));
    }

    #[test]
    fn test_world_far_from_origin() {
        let world = rect(1.0e6, 0.0, 1.0e6 + 100.0, 100.0);
        let config = TriggerConfig::default()
            .with_grid(12, 1)
            .with_world_bounds(world);
        let mut system = TriggerSystem::new(config);
        // Two overlapping zones straddling the border between columns 2 and 3
        let left = rect(1.0e6 + 24.0, 0.0, 1.0e6 + 25.0, 10.0);
        let right = rect(1.0e6 + 24.5, 0.0, 1.0e6 + 26.0, 10.0);
        system.build(&[left, right]).unwrap();
        let events = record_all(&mut system);
        let agent = system.create_agent();

        system.initialize_agent(agent, Vec2::new(1.0e6 + 24.0, 5.0)).unwrap();
        assert_eq!(take(&events), vec![(In, 0)]);

        // Walk right in ulp-sized steps across the cell border
        let mut inside_left = true;
        let mut inside_right = false;
        for step in 1..=32 {
            let x = 1.0e6 + 24.0 + step as f32 * 0.0625;
            system.update_position(agent, Vec2::new(x, 5.0)).unwrap();

            let now_left = left.contains(Vec2::new(x, 5.0));
            let now_right = right.contains(Vec2::new(x, 5.0));
            let mut expected = Vec::new();
            if inside_left && !now_left {
                expected.push((Out, 0));
            }
            if !inside_right && now_right {
                expected.push((In, 1));
            }
            assert_eq!(take(&events), expected, "x = {x}");
            assert_eq!(
                system.zones_at(Vec2::new(x, 5.0)),
                system.occupied_zones(agent)
            );
            inside_left = now_left;
            inside_right = now_right;
        }
        assert_eq!(system.occupied_zones(agent), Ok(vec![ZoneId(1)]));
    }

    #[test]
    fn test_zones_at() {
        let mut system = TriggerSystem::with_defaults();
        system.build(&chain()).unwrap();

        assert_eq!(system.zones_at(Vec2::new(1.0, 0.0)), Ok(vec![ZoneId(0), ZoneId(1)]));
        assert_eq!(system.zones_at(Vec2::new(3.0, 1.0)), Ok(vec![ZoneId(1), ZoneId(2)]));
        assert_eq!(system.zones_at(Vec2::new(50.0, 0.0)), Ok(vec![]));
    }
}
