//! World simulation for Tilequest: tile grids, maps, movement, and the
//! controller that owns map lifecycles and teleportation.
//!
//! A [`World`] holds a registry of [`MapScript`] constructors keyed by map
//! id. Exactly one map is live at a time; teleport requests raised by game
//! scripts retire the active map (caching its opaque local state) and build
//! the destination on demand, carrying the party avatar across.

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tilequest_core::{CommandEdge, Direction, MapId, PartyCommand, Position};

mod area;
mod grid;
mod map;
mod movement;
mod object;
mod script;

pub use area::Area;
pub use grid::{Grid, GridError, Tile, TileImage, TileLayer};
pub use map::{EntityRef, Map, MapError, Occupant, TeleportRequest, TickOutcome};
pub use movement::{Advance, Movement, MovementCycle};
pub use object::{MapObject, Mover, ObjectHooks, Party};
pub use script::{ScriptEffect, ScriptHook};

/// Per-map constructor and re-entry initializer registered with the world.
///
/// `construct` builds the map's static content (grid, objects, areas) from
/// scratch; `initialize` then applies dynamic state, receiving the cached
/// local-state snapshot from the previous visit, if any, plus mutable
/// access to the world-global state document.
pub trait MapScript {
    /// Builds the map's static content.
    fn construct(&self) -> Result<Map, MapError>;

    /// Applies dynamic state after construction.
    fn initialize(&self, map: &mut Map, local_state: Option<&Value>, global_state: &mut Value);
}

/// Lifecycle phase of the world controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldState {
    /// No map has been started yet.
    Idle,
    /// A map is live and ticking.
    Running,
    /// A cross-map teleport is being performed.
    Transitioning,
}

/// Errors raised by the world controller.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A teleport or registration referenced an unregistered map id.
    #[error("no map registered under id {}", .0.get())]
    UnknownMap(MapId),
    /// Two scripts were registered under the same map id.
    #[error("a map is already registered under id {}", .0.get())]
    DuplicateMap(MapId),
    /// An operation required a live map but none has been started.
    #[error("the world has not been started")]
    NotRunning,
    /// The world was started twice.
    #[error("the world is already running")]
    AlreadyRunning,
    /// A cross-map teleport found no party to carry over.
    #[error("no party avatar is available to carry across maps")]
    PartyMissing,
    /// The live map raised an error.
    #[error(transparent)]
    Map(#[from] MapError),
}

struct ActiveMap {
    id: MapId,
    map: Map,
}

/// Owns the map registry, the single live map, and cross-map persistence.
pub struct World {
    registry: BTreeMap<MapId, Box<dyn MapScript>>,
    active: Option<ActiveMap>,
    local_states: BTreeMap<MapId, Value>,
    global_state: Value,
    messages: Vec<String>,
    state: WorldState,
}

impl World {
    /// Creates an empty world with no registered maps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: BTreeMap::new(),
            active: None,
            local_states: BTreeMap::new(),
            global_state: Value::Null,
            messages: Vec::new(),
            state: WorldState::Idle,
        }
    }

    /// Registers a map constructor under an id.
    pub fn register_map(
        &mut self,
        id: MapId,
        script: Box<dyn MapScript>,
    ) -> Result<(), WorldError> {
        if self.registry.contains_key(&id) {
            return Err(WorldError::DuplicateMap(id));
        }
        let _ = self.registry.insert(id, script);
        Ok(())
    }

    /// Builds the starting map and places the party on it.
    pub fn start(
        &mut self,
        id: MapId,
        party: Party,
        position: Position,
    ) -> Result<(), WorldError> {
        if self.active.is_some() {
            return Err(WorldError::AlreadyRunning);
        }
        let mut map = self.build_map(id)?;
        map.place_party(party, position)?;
        self.active = Some(ActiveMap { id, map });
        self.state = WorldState::Running;
        Ok(())
    }

    /// Advances the live map by one tick, performing any teleport the tick
    /// requested before returning.
    pub fn tick(&mut self, party_movement_suspended: bool) -> Result<(), WorldError> {
        let outcome = {
            let active = self.active.as_mut().ok_or(WorldError::NotRunning)?;
            active.map.tick(party_movement_suspended)?
        };
        if outcome == TickOutcome::TeleportRequested {
            let request = self
                .active
                .as_mut()
                .and_then(|active| active.map.take_pending_teleport());
            if let Some(request) = request {
                self.perform_teleport(request)?;
            }
        }
        Ok(())
    }

    /// Delivers a decoded input edge to the live map.
    pub fn handle_command(
        &mut self,
        command: PartyCommand,
        edge: CommandEdge,
    ) -> Result<(), WorldError> {
        let active = self.active.as_mut().ok_or(WorldError::NotRunning)?;
        active.map.handle_command(command, edge);
        Ok(())
    }

    /// Schedules a teleport directly, outside any script hook.
    pub fn schedule_teleport(
        &mut self,
        map: Option<MapId>,
        position: Position,
        facing: Option<Direction>,
    ) -> Result<(), WorldError> {
        let active = self.active.as_mut().ok_or(WorldError::NotRunning)?;
        active.map.schedule_teleport(map, position, facing);
        Ok(())
    }

    /// Takes all messages queued since the last drain, oldest first.
    pub fn drain_messages(&mut self) -> Vec<String> {
        let mut out = std::mem::take(&mut self.messages);
        if let Some(active) = self.active.as_mut() {
            out.extend(active.map.drain_messages());
        }
        out
    }

    /// World-global state document shared by all map scripts.
    #[must_use]
    pub const fn global_state(&self) -> &Value {
        &self.global_state
    }

    /// Mutable access to the world-global state document.
    pub fn global_state_mut(&mut self) -> &mut Value {
        &mut self.global_state
    }

    /// Read-only access to the live map.
    #[must_use]
    pub fn active_map(&self) -> Option<&Map> {
        self.active.as_ref().map(|active| &active.map)
    }

    /// Id of the live map.
    #[must_use]
    pub fn active_map_id(&self) -> Option<MapId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn state(&self) -> WorldState {
        self.state
    }

    fn perform_teleport(&mut self, request: TeleportRequest) -> Result<(), WorldError> {
        let current = self.active.as_ref().map(|active| active.id);
        match request.map {
            // Same-map teleports reposition in place and stay Running.
            None => {
                let active = self.active.as_mut().ok_or(WorldError::NotRunning)?;
                active.map.reposition_party(request.position, request.facing)?;
                Ok(())
            }
            Some(target) if Some(target) == current => {
                let active = self.active.as_mut().ok_or(WorldError::NotRunning)?;
                active.map.reposition_party(request.position, request.facing)?;
                Ok(())
            }
            Some(target) => {
                if !self.registry.contains_key(&target) {
                    return Err(WorldError::UnknownMap(target));
                }
                self.state = WorldState::Transitioning;

                let mut party = None;
                if let Some(mut retired) = self.active.take() {
                    party = retired.map.take_party();
                    self.messages.extend(retired.map.drain_messages());
                    if let Some(state) = retired.map.save_state() {
                        let _ = self.local_states.insert(retired.id, state);
                    }
                }
                let mut party = party.ok_or(WorldError::PartyMissing)?;
                if let Some(facing) = request.facing {
                    party.mover_mut().set_facing(facing);
                }

                let mut map = self.build_map(target)?;
                map.receive_party(party, request.position)?;
                self.active = Some(ActiveMap { id: target, map });
                self.state = WorldState::Running;
                Ok(())
            }
        }
    }

    fn build_map(&mut self, id: MapId) -> Result<Map, WorldError> {
        let script = self.registry.get(&id).ok_or(WorldError::UnknownMap(id))?;
        let mut map = script.construct()?;
        let local = self.local_states.get(&id).cloned();
        if let Some(state) = local.clone() {
            map.set_local_state(state);
        }
        script.initialize(&mut map, local.as_ref(), &mut self.global_state);
        Ok(map)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only snapshot accessors over a [`World`], for presentation layers.
pub mod query {
    use tilequest_core::{Direction, ObjectId, ObstacleClass, Position};

    use crate::grid::TileImage;
    use crate::object::MapObject;
    use crate::World;

    /// The party avatar as seen by a renderer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PartySnapshot {
        /// Tile position, or `None` while unplaced.
        pub position: Option<Position>,
        /// Visible facing.
        pub facing: Direction,
        /// Ticks remaining in the in-progress transit.
        pub movement_phase: u8,
        /// Ticks per tile.
        pub speed: u8,
        /// Image handle supplied by the leading character.
        pub leader_image: TileImage,
    }

    /// Snapshots the party on the active map.
    #[must_use]
    pub fn party_view(world: &World) -> Option<PartySnapshot> {
        let party = world.active_map()?.party()?;
        Some(PartySnapshot {
            position: party.mover().position(),
            facing: party.mover().facing(),
            movement_phase: party.mover().movement_phase(),
            speed: party.mover().speed(),
            leader_image: party.leader_image(),
        })
    }

    /// Party tile position on the live map.
    #[must_use]
    pub fn party_position(world: &World) -> Option<Position> {
        world
            .active_map()?
            .party()
            .and_then(|party| party.mover().position())
    }

    /// Party facing on the live map.
    #[must_use]
    pub fn party_facing(world: &World) -> Option<Direction> {
        world
            .active_map()?
            .party()
            .map(|party| party.mover().facing())
    }

    /// Party transit progress as `(phase, speed)`; phase is zero at rest.
    #[must_use]
    pub fn party_transit(world: &World) -> Option<(u8, u8)> {
        let mover = world.active_map()?.party()?.mover();
        Some((mover.movement_phase(), mover.speed()))
    }

    /// One placed object as seen by a renderer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ObjectSnapshot {
        /// Arena handle of the object.
        pub id: ObjectId,
        /// Tile position, or `None` while unplaced.
        pub position: Option<Position>,
        /// Visible facing.
        pub facing: Direction,
        /// Obstacle classification, which doubles as draw-layer ordering.
        pub obstacle: ObstacleClass,
        /// Ticks remaining in the in-progress transit.
        pub movement_phase: u8,
        /// Ticks per tile.
        pub speed: u8,
    }

    /// Snapshots every live object on the active map, ordered by id.
    #[must_use]
    pub fn object_view(world: &World) -> Vec<ObjectSnapshot> {
        let Some(map) = world.active_map() else {
            return Vec::new();
        };
        map.objects()
            .map(|(id, object)| snapshot(id, object))
            .collect()
    }

    fn snapshot(id: ObjectId, object: &MapObject) -> ObjectSnapshot {
        ObjectSnapshot {
            id,
            position: object.mover().position(),
            facing: object.mover().facing(),
            obstacle: object.obstacle(),
            movement_phase: object.mover().movement_phase(),
            speed: object.mover().speed(),
        }
    }
}
