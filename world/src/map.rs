//! Authoritative per-map state: grid, placed objects, party, and triggers.

use serde_json::Value;
use thiserror::Error;
use tilequest_core::{
    AreaId, CommandEdge, Direction, MapId, ObjectId, ObstacleClass, PartyCommand, Position,
};

use crate::area::Area;
use crate::grid::{Grid, GridError};
use crate::movement::{Advance, Movement};
use crate::object::{MapObject, Mover, Party};
use crate::script::{ScriptEffect, ScriptHook};

/// Addresses one mover owned by a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityRef {
    /// The player-controlled avatar.
    Party,
    /// A placed object, addressed by its arena handle.
    Object(ObjectId),
}

/// Blocking occupant recorded in the dense position index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupant {
    /// The party avatar.
    Party,
    /// A placed object with a blocking obstacle class.
    Object(ObjectId),
}

/// Result of advancing the map by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick ran to completion.
    Completed,
    /// A teleport was scheduled; per-tick processing was suspended and
    /// control should return to the world.
    TeleportRequested,
}

/// Pending teleport extracted by the world controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportRequest {
    /// Destination map, or `None` for a reposition within the current map.
    pub map: Option<MapId>,
    /// Tile the party lands on.
    pub position: Position,
    /// Optional facing override applied at the destination.
    pub facing: Option<Direction>,
}

/// Errors raised by map construction, placement, and contract violations.
#[derive(Debug, Error)]
pub enum MapError {
    /// A grid indexing or construction contract was violated.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A blocking entity was placed on an already occupied tile.
    #[error("tile ({x}, {y}) already holds a blocking occupant")]
    TileOccupied {
        /// Column of the occupied tile.
        x: i32,
        /// Row of the occupied tile.
        y: i32,
    },
    /// A second party avatar was placed on the same map.
    #[error("a party avatar is already placed on this map")]
    PartyAlreadyPlaced,
    /// An operation required a party but none is placed.
    #[error("no party avatar is placed on this map")]
    PartyMissing,
    /// An object handle does not address a live object.
    #[error("no object with id {} exists on this map", .0.get())]
    UnknownObject(ObjectId),
}

/// Owns the grid, all placed objects, the party avatar, trigger areas, and
/// runs one simulation tick at a time.
pub struct Map {
    grid: Grid,
    objects: Vec<Option<MapObject>>,
    occupancy: BlockingOccupancy,
    party: Option<Party>,
    areas: Vec<Area>,
    tile_actions: Vec<(Position, ScriptHook)>,
    pending_effects: Vec<ScriptEffect>,
    pending_teleport: Option<TeleportRequest>,
    messages: Vec<String>,
    local_state: Option<Value>,
}

impl Map {
    /// Creates an empty map over the provided grid.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let (columns, rows) = grid.dimensions();
        Self {
            grid,
            objects: Vec::new(),
            occupancy: BlockingOccupancy::new(columns, rows),
            party: None,
            areas: Vec::new(),
            tile_actions: Vec::new(),
            pending_effects: Vec::new(),
            pending_teleport: None,
            messages: Vec::new(),
            local_state: None,
        }
    }

    /// Tile grid backing the map.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access, for map initialization.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Places an object on the map, transferring ownership to it.
    ///
    /// Placement outside the grid or onto a tile that already holds a
    /// blocking occupant is a construction-time contract violation.
    pub fn place_object(
        &mut self,
        mut object: MapObject,
        position: Position,
    ) -> Result<ObjectId, MapError> {
        let _ = self.grid.terrain().tile(position)?;
        if object.obstacle().blocks_movement() && !self.occupancy.is_free(position) {
            return Err(MapError::TileOccupied {
                x: position.x(),
                y: position.y(),
            });
        }

        let id = ObjectId::new(u32::try_from(self.objects.len()).unwrap_or(u32::MAX));
        object.mover_mut().set_position(Some(position));
        if object.obstacle().blocks_movement() {
            self.occupancy.occupy(position, Occupant::Object(id));
        }
        self.objects.push(Some(object));
        Ok(id)
    }

    /// Removes an object from the map, destroying it.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), MapError> {
        let slot = self
            .objects
            .get_mut(id.get() as usize)
            .ok_or(MapError::UnknownObject(id))?;
        let object = slot.take().ok_or(MapError::UnknownObject(id))?;
        if object.obstacle().blocks_movement() {
            if let Some(position) = object.mover().position() {
                self.occupancy.vacate(position, Occupant::Object(id));
            }
        }
        Ok(())
    }

    /// Read-only access to a placed object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(id.get() as usize).and_then(Option::as_ref)
    }

    /// Mutable access to a placed object.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.objects
            .get_mut(id.get() as usize)
            .and_then(Option::as_mut)
    }

    /// Iterates live objects in deterministic arena order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &MapObject)> {
        self.objects.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|object| (ObjectId::new(index as u32), object))
        })
    }

    /// Places the party avatar, carrying over its facing, movement phase,
    /// and any queued movement.
    pub fn place_party(&mut self, mut party: Party, position: Position) -> Result<(), MapError> {
        if self.party.is_some() {
            return Err(MapError::PartyAlreadyPlaced);
        }
        let _ = self.grid.terrain().tile(position)?;
        if !self.occupancy.is_free(position) {
            return Err(MapError::TileOccupied {
                x: position.x(),
                y: position.y(),
            });
        }
        party.mover_mut().set_position(Some(position));
        self.occupancy.occupy(position, Occupant::Party);
        self.party = Some(party);
        Ok(())
    }

    /// Places a party arriving from another map, bypassing the occupancy
    /// check. Teleport arrival is not a collision-checked step: a blocking
    /// occupant already on the tile keeps its registration and the party
    /// shares the tile until its next committed move. Only the grid
    /// boundary is enforced.
    pub fn receive_party(&mut self, mut party: Party, position: Position) -> Result<(), MapError> {
        if self.party.is_some() {
            return Err(MapError::PartyAlreadyPlaced);
        }
        let _ = self.grid.terrain().tile(position)?;
        party.mover_mut().set_position(Some(position));
        self.occupancy.occupy(position, Occupant::Party);
        self.party = Some(party);
        Ok(())
    }

    /// Extracts the party avatar, preserving its in-flight motion state for
    /// the next map.
    pub fn take_party(&mut self) -> Option<Party> {
        let mut party = self.party.take()?;
        if let Some(position) = party.mover().position() {
            self.occupancy.vacate(position, Occupant::Party);
        }
        party.mover_mut().set_position(None);
        Some(party)
    }

    /// Moves the party to a new tile within this map (same-map teleport).
    ///
    /// Arrival is not a collision-checked step: a blocking occupant already
    /// on the tile keeps its registration and the party shares the tile
    /// until its next committed move.
    pub fn reposition_party(
        &mut self,
        position: Position,
        facing: Option<Direction>,
    ) -> Result<(), MapError> {
        let _ = self.grid.terrain().tile(position)?;
        let old = self
            .party
            .as_ref()
            .ok_or(MapError::PartyMissing)?
            .mover()
            .position();

        if old != Some(position) {
            if let Some(old) = old {
                self.occupancy.vacate(old, Occupant::Party);
            }
            self.occupancy.occupy(position, Occupant::Party);
        }

        if let Some(party) = self.party.as_mut() {
            party.mover_mut().set_position(Some(position));
            if let Some(facing) = facing {
                party.mover_mut().set_facing(facing);
            }
        }
        Ok(())
    }

    /// Read-only access to the party avatar.
    #[must_use]
    pub const fn party(&self) -> Option<&Party> {
        self.party.as_ref()
    }

    /// Mutable access to the party avatar.
    pub fn party_mut(&mut self) -> Option<&mut Party> {
        self.party.as_mut()
    }

    /// Registers a trigger area; areas are evaluated in registration order.
    pub fn add_area(&mut self, area: Area) -> AreaId {
        let id = AreaId::new(u32::try_from(self.areas.len()).unwrap_or(u32::MAX));
        self.areas.push(area);
        id
    }

    /// Installs an activation handler on a scenario tile.
    pub fn register_tile_action(
        &mut self,
        position: Position,
        hook: ScriptHook,
    ) -> Result<(), MapError> {
        let _ = self.grid.terrain().tile(position)?;
        self.tile_actions.push((position, hook));
        Ok(())
    }

    /// Queues a movement on a mover owned by this map.
    pub fn schedule_movement(
        &mut self,
        entity: EntityRef,
        movement: Movement,
        override_queue: bool,
    ) -> Result<(), MapError> {
        match entity {
            EntityRef::Party => {
                let party = self.party.as_mut().ok_or(MapError::PartyMissing)?;
                party.mover_mut().schedule(movement, override_queue);
            }
            EntityRef::Object(id) => {
                let object = self.object_mut(id).ok_or(MapError::UnknownObject(id))?;
                object.mover_mut().schedule(movement, override_queue);
            }
        }
        Ok(())
    }

    /// Requests a teleport; per-tick processing stops once this is set.
    pub fn schedule_teleport(
        &mut self,
        map: Option<MapId>,
        position: Position,
        facing: Option<Direction>,
    ) {
        self.pending_teleport = Some(TeleportRequest {
            map,
            position,
            facing,
        });
    }

    /// Pending teleport request, if any.
    #[must_use]
    pub const fn pending_teleport(&self) -> Option<TeleportRequest> {
        self.pending_teleport
    }

    pub(crate) fn take_pending_teleport(&mut self) -> Option<TeleportRequest> {
        self.pending_teleport.take()
    }

    /// Takes the queued fire-and-forget messages for the presentation layer.
    pub fn drain_messages(&mut self) -> Vec<String> {
        self.messages.drain(..).collect()
    }

    /// Replaces the opaque local-state snapshot persisted across re-entry.
    pub fn set_local_state(&mut self, state: Value) {
        self.local_state = Some(state);
    }

    /// Opaque per-map snapshot handed to the persistence collaborator.
    #[must_use]
    pub fn save_state(&self) -> Option<Value> {
        self.local_state.clone()
    }

    /// Blocking occupant recorded at the position, if any.
    #[must_use]
    pub fn blocking_occupant(&self, position: Position) -> Option<Occupant> {
        self.occupancy.occupant(position)
    }

    /// Delivers one decoded input edge to the party avatar.
    ///
    /// Directional edges latch or clear the held direction; an `Activate`
    /// press interacts with the tile ahead of the party. Commands arriving
    /// while no party is placed are ignored.
    pub fn handle_command(&mut self, command: PartyCommand, edge: CommandEdge) {
        match (command.direction(), edge) {
            (Some(direction), CommandEdge::Pressed) => {
                if let Some(party) = self.party.as_mut() {
                    party.press_direction(direction);
                }
            }
            (Some(direction), CommandEdge::Released) => {
                if let Some(party) = self.party.as_mut() {
                    party.release_direction(direction);
                }
            }
            (None, CommandEdge::Pressed) => self.activate(),
            (None, CommandEdge::Released) => {}
        }
    }

    /// Activates the tile directly ahead of the party.
    ///
    /// A Counter-class occupant redirects the activation to the occupant
    /// one tile beyond it in the same direction; a plain blocking occupant
    /// receives it directly; an empty tile fires its registered handler, if
    /// any. Activation never changes a position.
    pub fn activate(&mut self) {
        let Some(position) = self.party.as_ref().and_then(|party| party.mover().position())
        else {
            return;
        };
        let facing = match self.party.as_ref() {
            Some(party) => party.mover().facing(),
            None => return,
        };
        let ahead = position.step(facing, 1);

        match self.occupancy.occupant(ahead) {
            Some(Occupant::Object(id)) => {
                let target = if self.object(id).map(MapObject::obstacle)
                    == Some(ObstacleClass::Counter)
                {
                    // Counters are act-through: deliver past them.
                    match self.occupancy.occupant(ahead.step(facing, 1)) {
                        Some(Occupant::Object(beyond)) => Some(beyond),
                        _ => None,
                    }
                } else {
                    Some(id)
                };
                if let Some(id) = target {
                    self.fire_object_hook(id, HookKind::Activate);
                }
            }
            Some(Occupant::Party) => {}
            None => self.fire_tile_action(ahead),
        }

        self.drain_effects();
    }

    /// Advances the map by one simulation tick.
    ///
    /// The party moves first, then objects in arena order; the order is
    /// fixed so replays stay deterministic. `party_movement_suspended`
    /// reflects the presentation collaborator's "movement paused" query
    /// (modal dialogs) and skips the party's movement engine only.
    pub fn tick(&mut self, party_movement_suspended: bool) -> Result<TickOutcome, MapError> {
        if self.pending_teleport.is_some() {
            return Ok(TickOutcome::TeleportRequested);
        }

        let before = self.party.as_ref().and_then(|party| party.mover().position());
        if !party_movement_suspended && self.party.is_some() && self.phase_ready(EntityRef::Party)
        {
            self.latch_held_direction();
            self.run_queue(EntityRef::Party)?;
        }
        let after = self.party.as_ref().and_then(|party| party.mover().position());
        if before != after {
            self.fire_area_transitions(before, after);
        }
        self.drain_effects();
        if self.pending_teleport.is_some() {
            return Ok(TickOutcome::TeleportRequested);
        }

        for index in 0..self.objects.len() {
            if self.objects[index].is_none() {
                continue;
            }
            let entity = EntityRef::Object(ObjectId::new(index as u32));
            if self.phase_ready(entity) {
                self.run_queue(entity)?;
            }
            self.drain_effects();
            if self.pending_teleport.is_some() {
                return Ok(TickOutcome::TeleportRequested);
            }
        }

        Ok(TickOutcome::Completed)
    }

    /// Attempts to move a mover one tile; returns whether it moved.
    ///
    /// A blocked step is a defined no-op outcome, not an error. On success
    /// the logical position commits immediately and the movement phase is
    /// reset to the mover's speed, producing a multi-tick visual transit.
    pub fn try_to_move(&mut self, entity: EntityRef, direction: Direction) -> bool {
        let Some(from) = self.mover_ref(entity).and_then(Mover::position) else {
            return false;
        };
        let target = from.step(direction, 1);
        if !self.can_enter(target, direction) {
            return false;
        }
        self.commit_move(entity, from, target, direction);
        self.fire_collisions(entity, target);
        true
    }

    /// Moves a mover one tile bypassing collision; only the grid boundary
    /// is enforced, and leaving it is a contract violation.
    pub fn forced_move(&mut self, entity: EntityRef, direction: Direction) -> Result<(), MapError> {
        let Some(from) = self.mover_ref(entity).and_then(Mover::position) else {
            return Ok(());
        };
        let target = from.step(direction, 1);
        let _ = self.grid.terrain().tile(target)?;
        self.commit_move(entity, from, target, direction);
        self.fire_collisions(entity, target);
        Ok(())
    }

    /// Read-only move-resolution predicate consumed by the pathfinder.
    #[must_use]
    pub fn can_enter(&self, target: Position, direction: Direction) -> bool {
        self.grid.walkable(target, direction) && self.occupancy.is_free(target)
    }

    /// Sets the visible facing of a mover without moving it.
    pub fn set_facing(&mut self, entity: EntityRef, facing: Direction) {
        if let Some(mover) = self.mover_mut(entity) {
            mover.set_facing(facing);
        }
    }

    /// Burns down an in-progress transit; returns whether the mover is free
    /// to act this tick. The tick a transit ends, the mover acts again, so a
    /// speed-1 mover steps every tick.
    fn phase_ready(&mut self, entity: EntityRef) -> bool {
        let Some(mover) = self.mover_mut(entity) else {
            return false;
        };
        if mover.movement_phase() > 0 {
            mover.decrement_phase();
        }
        self.mover_ref(entity)
            .is_some_and(|mover| mover.movement_phase() == 0)
    }

    fn latch_held_direction(&mut self) {
        if let Some(party) = self.party.as_mut() {
            if party.mover().scheduled_is_empty() {
                if let Some(held) = party.held_direction() {
                    party.mover_mut().schedule(Movement::Step(held), false);
                }
            }
        }
    }

    fn run_queue(&mut self, entity: EntityRef) -> Result<(), MapError> {
        let Some(mover) = self.mover_mut(entity) else {
            return Ok(());
        };
        if let Some(mut movement) = mover.pop_scheduled() {
            match movement.advance(self, entity)? {
                Advance::Pending => {
                    if let Some(mover) = self.mover_mut(entity) {
                        mover.push_front_scheduled(movement);
                    }
                }
                Advance::Done => {
                    // Zero-cost completions fall through to the idle
                    // behavior in the same tick; a committed step does not.
                    let at_rest = self.mover_ref(entity).is_some_and(|mover| {
                        mover.scheduled_is_empty() && mover.movement_phase() == 0
                    });
                    if at_rest {
                        self.run_behavior(entity)?;
                    }
                }
            }
        } else {
            self.run_behavior(entity)?;
        }
        Ok(())
    }

    fn run_behavior(&mut self, entity: EntityRef) -> Result<(), MapError> {
        let Some(mover) = self.mover_mut(entity) else {
            return Ok(());
        };
        let Some(mut movement) = mover.cycle_mut().take_current() else {
            return Ok(());
        };
        match movement.advance(self, entity)? {
            Advance::Pending => {
                if let Some(mover) = self.mover_mut(entity) {
                    mover.cycle_mut().store_active(movement);
                }
            }
            Advance::Done => {
                if let Some(mover) = self.mover_mut(entity) {
                    mover.cycle_mut().advance_cursor();
                }
            }
        }
        Ok(())
    }

    fn commit_move(
        &mut self,
        entity: EntityRef,
        from: Position,
        target: Position,
        direction: Direction,
    ) {
        if self.entity_blocks(entity) {
            let occupant = occupant_of(entity);
            self.occupancy.vacate(from, occupant);
            self.occupancy.occupy(target, occupant);
        }
        if let Some(mover) = self.mover_mut(entity) {
            mover.begin_transit(target, direction);
        }
    }

    fn fire_collisions(&mut self, entity: EntityRef, target: Position) {
        let colliders: Vec<ObjectId> = self
            .objects()
            .filter(|(id, object)| {
                EntityRef::Object(*id) != entity
                    && !object.obstacle().blocks_movement()
                    && object.mover().position() == Some(target)
            })
            .map(|(id, _)| id)
            .collect();
        if colliders.is_empty() {
            return;
        }

        for id in colliders {
            self.fire_object_hook(id, HookKind::Collide);
        }
        if let EntityRef::Object(id) = entity {
            self.fire_object_hook(id, HookKind::Collide);
        }
    }

    fn fire_object_hook(&mut self, id: ObjectId, kind: HookKind) {
        let mut effects = std::mem::take(&mut self.pending_effects);
        if let Some(object) = self
            .objects
            .get_mut(id.get() as usize)
            .and_then(Option::as_mut)
        {
            let hook = match kind {
                HookKind::Activate => object.hooks_mut().on_activate.as_mut(),
                HookKind::Collide => object.hooks_mut().on_collide.as_mut(),
            };
            if let Some(hook) = hook {
                hook(&mut effects);
            }
        }
        self.pending_effects = effects;
    }

    fn fire_tile_action(&mut self, position: Position) {
        let mut effects = std::mem::take(&mut self.pending_effects);
        for (tile, hook) in self.tile_actions.iter_mut() {
            if *tile == position {
                hook(&mut effects);
            }
        }
        self.pending_effects = effects;
    }

    fn fire_area_transitions(&mut self, old: Option<Position>, new: Option<Position>) {
        let mut effects = std::mem::take(&mut self.pending_effects);
        // All leave callbacks fire before any enter callback within a tick.
        for area in self.areas.iter_mut() {
            let was_inside = old.is_some_and(|position| area.contains(position));
            let is_inside = new.is_some_and(|position| area.contains(position));
            if was_inside && !is_inside {
                area.fire_leave(&mut effects);
            }
        }
        for area in self.areas.iter_mut() {
            let was_inside = old.is_some_and(|position| area.contains(position));
            let is_inside = new.is_some_and(|position| area.contains(position));
            if is_inside && !was_inside {
                area.fire_enter(&mut effects);
            } else if is_inside && was_inside {
                area.fire_move_within(&mut effects);
            }
        }
        self.pending_effects = effects;
    }

    fn drain_effects(&mut self) {
        let effects: Vec<ScriptEffect> = self.pending_effects.drain(..).collect();
        for effect in effects {
            match effect {
                ScriptEffect::ScheduleTeleport {
                    map,
                    position,
                    facing,
                } => {
                    self.pending_teleport = Some(TeleportRequest {
                        map,
                        position,
                        facing,
                    });
                }
                ScriptEffect::ScheduleMovement {
                    object,
                    movement,
                    override_queue,
                } => {
                    // Stale handles from removed objects are a defined no-op.
                    if let Some(target) = self.object_mut(object) {
                        target.mover_mut().schedule(movement, override_queue);
                    }
                }
                ScriptEffect::SchedulePartyMovement {
                    movement,
                    override_queue,
                } => {
                    if let Some(party) = self.party.as_mut() {
                        party.mover_mut().schedule(movement, override_queue);
                    }
                }
                ScriptEffect::Message(text) => self.messages.push(text),
                ScriptEffect::SetLocalState(state) => self.local_state = Some(state),
            }
        }
    }

    fn mover_ref(&self, entity: EntityRef) -> Option<&Mover> {
        match entity {
            EntityRef::Party => self.party.as_ref().map(Party::mover),
            EntityRef::Object(id) => self.object(id).map(MapObject::mover),
        }
    }

    fn mover_mut(&mut self, entity: EntityRef) -> Option<&mut Mover> {
        match entity {
            EntityRef::Party => self.party.as_mut().map(Party::mover_mut),
            EntityRef::Object(id) => self.object_mut(id).map(MapObject::mover_mut),
        }
    }

    fn entity_blocks(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Party => true,
            EntityRef::Object(id) => self
                .object(id)
                .is_some_and(|object| object.obstacle().blocks_movement()),
        }
    }
}

#[derive(Clone, Copy)]
enum HookKind {
    Activate,
    Collide,
}

const fn occupant_of(entity: EntityRef) -> Occupant {
    match entity {
        EntityRef::Party => Occupant::Party,
        EntityRef::Object(id) => Occupant::Object(id),
    }
}

/// Dense index of blocking occupants, one slot per grid tile.
#[derive(Clone, Debug)]
struct BlockingOccupancy {
    columns: u32,
    rows: u32,
    cells: Vec<Option<Occupant>>,
}

impl BlockingOccupancy {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn occupant(&self, position: Position) -> Option<Occupant> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn is_free(&self, position: Position) -> bool {
        self.occupant(position).is_none()
    }

    /// Records an occupant; never overwrites a foreign registration, so an
    /// entity force-moved over an occupied tile stays unregistered until it
    /// reaches a free one.
    fn occupy(&mut self, position: Position, occupant: Occupant) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                if slot.is_none() {
                    *slot = Some(occupant);
                }
            }
        }
    }

    /// Clears the slot only when it records the departing occupant.
    fn vacate(&mut self, position: Position, occupant: Occupant) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                if *slot == Some(occupant) {
                    *slot = None;
                }
            }
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x() < 0 || position.y() < 0 {
            return None;
        }
        let x = position.x() as u32;
        let y = position.y() as u32;
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Tile, TileImage, TileLayer};

    fn open_map(columns: u32, rows: u32) -> Map {
        let tile = Tile::new(ObstacleClass::Below, TileImage::new(0));
        let terrain = TileLayer::filled(columns, rows, tile).expect("terrain");
        let scenario = TileLayer::filled(columns, rows, tile).expect("scenario");
        Map::new(Grid::new(terrain, vec![scenario]).expect("grid"))
    }

    #[test]
    fn placing_two_blocking_objects_on_one_tile_is_rejected() {
        let mut map = open_map(4, 4);
        let _ = map
            .place_object(
                MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(1, 1),
            )
            .expect("first placement");

        let result = map.place_object(
            MapObject::new(ObstacleClass::Counter, 1),
            Position::new(1, 1),
        );
        assert!(matches!(result, Err(MapError::TileOccupied { x: 1, y: 1 })));
    }

    #[test]
    fn below_objects_share_tiles_with_blocking_occupants() {
        let mut map = open_map(4, 4);
        let _ = map
            .place_object(
                MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(1, 1),
            )
            .expect("blocking placement");
        let _ = map
            .place_object(MapObject::new(ObstacleClass::Below, 1), Position::new(1, 1))
            .expect("below placement");
    }

    #[test]
    fn placement_outside_the_grid_is_a_contract_violation() {
        let mut map = open_map(4, 4);
        let result = map.place_object(
            MapObject::new(ObstacleClass::Obstacle, 1),
            Position::new(4, 0),
        );
        assert!(matches!(result, Err(MapError::Grid(_))));
    }

    #[test]
    fn removing_an_object_vacates_its_tile() {
        let mut map = open_map(4, 4);
        let id = map
            .place_object(
                MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(2, 2),
            )
            .expect("placement");
        assert!(!map.can_enter(Position::new(2, 2), Direction::Right));

        map.remove_object(id).expect("removal");
        assert!(map.can_enter(Position::new(2, 2), Direction::Right));
        assert!(matches!(
            map.remove_object(id),
            Err(MapError::UnknownObject(_))
        ));
    }

    #[test]
    fn forced_move_out_of_bounds_is_surfaced() {
        let mut map = open_map(3, 3);
        let id = map
            .place_object(MapObject::new(ObstacleClass::Above, 1), Position::new(2, 1))
            .expect("placement");

        let result = map.forced_move(EntityRef::Object(id), Direction::Right);
        assert!(matches!(result, Err(MapError::Grid(_))));
    }

    #[test]
    fn forced_move_traverses_blocking_tiles() {
        let mut map = open_map(3, 1);
        let wall = Tile::new(ObstacleClass::Obstacle, TileImage::new(9));
        map.grid_mut()
            .scenario_mut(0)
            .expect("layer")
            .set_tile(Position::new(1, 0), wall)
            .expect("set tile");

        let id = map
            .place_object(MapObject::new(ObstacleClass::Above, 1), Position::new(0, 0))
            .expect("placement");

        assert!(!map.try_to_move(EntityRef::Object(id), Direction::Right));
        map.forced_move(EntityRef::Object(id), Direction::Right)
            .expect("forced move");
        assert_eq!(
            map.object(id).and_then(|o| o.mover().position()),
            Some(Position::new(1, 0))
        );
    }

    #[test]
    fn forced_traversal_leaves_standing_blockers_registered() {
        let mut map = open_map(3, 1);
        let runner = map
            .place_object(
                MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(0, 0),
            )
            .expect("runner placement");
        let standing = map
            .place_object(
                MapObject::new(ObstacleClass::Obstacle, 1),
                Position::new(1, 0),
            )
            .expect("standing placement");

        // Onto the held tile, then past it.
        map.forced_move(EntityRef::Object(runner), Direction::Right)
            .expect("first forced move");
        assert!(!map.can_enter(Position::new(1, 0), Direction::Right));
        map.forced_move(EntityRef::Object(runner), Direction::Right)
            .expect("second forced move");

        assert_eq!(
            map.blocking_occupant(Position::new(1, 0)),
            Some(Occupant::Object(standing))
        );
        assert!(!map.can_enter(Position::new(1, 0), Direction::Right));
        assert_eq!(
            map.blocking_occupant(Position::new(2, 0)),
            Some(Occupant::Object(runner))
        );
        assert!(map.can_enter(Position::new(0, 0), Direction::Left));
    }
}
