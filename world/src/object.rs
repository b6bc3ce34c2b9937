//! Placed entities: autonomous map objects and the party avatar.

use std::collections::VecDeque;
use std::fmt;

use serde_json::Value;
use tilequest_core::{Direction, ObstacleClass, Position};

use crate::grid::TileImage;
use crate::movement::{Movement, MovementCycle};
use crate::script::ScriptHook;

/// Per-entity motion state shared by objects and the party.
#[derive(Debug)]
pub struct Mover {
    position: Option<Position>,
    facing: Direction,
    speed: u8,
    movement_phase: u8,
    scheduled: VecDeque<Movement>,
    cycle: MovementCycle,
}

impl Mover {
    /// Creates an unplaced mover.
    ///
    /// `speed` is the number of ticks required to cross one tile; smaller is
    /// faster. A speed of zero is clamped to one.
    #[must_use]
    pub fn new(speed: u8) -> Self {
        Self {
            position: None,
            facing: Direction::Down,
            speed: speed.max(1),
            movement_phase: 0,
            scheduled: VecDeque::new(),
            cycle: MovementCycle::empty(),
        }
    }

    /// Current tile, or `None` while unplaced.
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        self.position
    }

    /// Direction the entity is visibly facing.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Ticks required to cross one tile.
    #[must_use]
    pub const fn speed(&self) -> u8 {
        self.speed
    }

    /// Ticks remaining in the in-progress one-tile transit; zero at rest.
    #[must_use]
    pub const fn movement_phase(&self) -> u8 {
        self.movement_phase
    }

    /// Reports whether the entity is at rest with an empty queue.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.movement_phase == 0 && self.scheduled.is_empty()
    }

    /// Queues a movement.
    ///
    /// Appends FIFO by default; `override_queue` clears pending commands
    /// first and inserts the new command alone, which is how scripts
    /// interrupt patrol patterns on player interaction.
    pub fn schedule(&mut self, movement: Movement, override_queue: bool) {
        if override_queue {
            self.scheduled.clear();
        }
        self.scheduled.push_back(movement);
    }

    /// Replaces the repeating idle behavior.
    pub fn set_cycle(&mut self, cycle: MovementCycle) {
        self.cycle = cycle;
    }

    /// Sets the visible facing directly.
    pub fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
    }

    pub(crate) fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    pub(crate) fn begin_transit(&mut self, target: Position, facing: Direction) {
        self.position = Some(target);
        self.movement_phase = self.speed;
        self.facing = facing;
    }

    pub(crate) fn decrement_phase(&mut self) {
        self.movement_phase = self.movement_phase.saturating_sub(1);
    }

    pub(crate) fn pop_scheduled(&mut self) -> Option<Movement> {
        self.scheduled.pop_front()
    }

    pub(crate) fn push_front_scheduled(&mut self, movement: Movement) {
        self.scheduled.push_front(movement);
    }

    pub(crate) fn scheduled_is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    pub(crate) fn cycle_mut(&mut self) -> &mut MovementCycle {
        &mut self.cycle
    }
}

/// Script callbacks installed on a map object.
#[derive(Default)]
pub struct ObjectHooks {
    pub(crate) on_activate: Option<ScriptHook>,
    pub(crate) on_collide: Option<ScriptHook>,
}

impl fmt::Debug for ObjectHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHooks")
            .field("on_activate", &self.on_activate.is_some())
            .field("on_collide", &self.on_collide.is_some())
            .finish()
    }
}

/// Autonomous entity placed on a map.
///
/// Objects are exclusively owned by the map they are placed in; removing
/// one from the map destroys it.
#[derive(Debug)]
pub struct MapObject {
    obstacle: ObstacleClass,
    mover: Mover,
    hooks: ObjectHooks,
}

impl MapObject {
    /// Creates an unplaced object.
    #[must_use]
    pub fn new(obstacle: ObstacleClass, speed: u8) -> Self {
        Self {
            obstacle,
            mover: Mover::new(speed),
            hooks: ObjectHooks::default(),
        }
    }

    /// Installs a repeating movement pattern used while the queue is empty.
    #[must_use]
    pub fn with_behavior(mut self, cycle: MovementCycle) -> Self {
        self.mover.set_cycle(cycle);
        self
    }

    /// Installs the activation callback.
    #[must_use]
    pub fn with_on_activate(mut self, hook: ScriptHook) -> Self {
        self.hooks.on_activate = Some(hook);
        self
    }

    /// Installs the collision callback fired when a mover shares this
    /// object's tile.
    #[must_use]
    pub fn with_on_collide(mut self, hook: ScriptHook) -> Self {
        self.hooks.on_collide = Some(hook);
        self
    }

    /// Obstacle classification governing pass-over/through semantics.
    #[must_use]
    pub const fn obstacle(&self) -> ObstacleClass {
        self.obstacle
    }

    /// Motion state of the object.
    #[must_use]
    pub const fn mover(&self) -> &Mover {
        &self.mover
    }

    /// Mutable motion state of the object.
    pub fn mover_mut(&mut self) -> &mut Mover {
        &mut self.mover
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut ObjectHooks {
        &mut self.hooks
    }
}

/// Player-controlled avatar.
///
/// The party is a mover like any object, but it responds to held
/// directional commands instead of autonomous behavior, and its visible
/// image is supplied by the leading character.
#[derive(Debug)]
pub struct Party {
    mover: Mover,
    leader_image: TileImage,
    held: Option<Direction>,
    custom_state: Option<Value>,
}

impl Party {
    /// Creates an unplaced party avatar.
    #[must_use]
    pub fn new(leader_image: TileImage, speed: u8) -> Self {
        Self {
            mover: Mover::new(speed),
            leader_image,
            held: None,
            custom_state: None,
        }
    }

    /// Motion state of the party.
    #[must_use]
    pub const fn mover(&self) -> &Mover {
        &self.mover
    }

    /// Mutable motion state of the party.
    pub fn mover_mut(&mut self) -> &mut Mover {
        &mut self.mover
    }

    /// Image handle of the leading character.
    #[must_use]
    pub const fn leader_image(&self) -> TileImage {
        self.leader_image
    }

    /// Direction currently held by the player, if any.
    #[must_use]
    pub const fn held_direction(&self) -> Option<Direction> {
        self.held
    }

    pub(crate) fn press_direction(&mut self, direction: Direction) {
        self.held = Some(direction);
    }

    pub(crate) fn release_direction(&mut self, direction: Direction) {
        if self.held == Some(direction) {
            self.held = None;
        }
    }

    /// Opaque snapshot for the persistence collaborator.
    #[must_use]
    pub fn custom_save(&self) -> Option<Value> {
        self.custom_state.clone()
    }

    /// Restores an opaque snapshot produced by [`Party::custom_save`].
    pub fn custom_load(&mut self, state: Value) {
        self.custom_state = Some(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_speed_is_clamped_to_one_tick_per_tile() {
        assert_eq!(Mover::new(0).speed(), 1);
        assert_eq!(Mover::new(4).speed(), 4);
    }

    #[test]
    fn override_scheduling_clears_pending_commands() {
        let mut mover = Mover::new(1);
        mover.schedule(Movement::Step(Direction::Up), false);
        mover.schedule(Movement::Step(Direction::Up), false);
        mover.schedule(Movement::Face(Direction::Left), true);

        assert_eq!(mover.pop_scheduled(), Some(Movement::Face(Direction::Left)));
        assert!(mover.scheduled_is_empty());
    }

    #[test]
    fn releasing_a_different_direction_keeps_the_held_one() {
        let mut party = Party::new(TileImage::new(1), 2);
        party.press_direction(Direction::Right);
        party.release_direction(Direction::Left);
        assert_eq!(party.held_direction(), Some(Direction::Right));
        party.release_direction(Direction::Right);
        assert_eq!(party.held_direction(), None);
    }

    #[test]
    fn custom_state_round_trips_through_the_party() {
        let mut party = Party::new(TileImage::new(1), 2);
        assert!(party.custom_save().is_none());
        party.custom_load(serde_json::json!({ "steps": 12 }));
        assert_eq!(
            party.custom_save(),
            Some(serde_json::json!({ "steps": 12 }))
        );
    }
}
