//! Effect vocabulary for trigger and object callbacks.
//!
//! Hooks never receive `&mut Map`; they push [`ScriptEffect`] values into a
//! sink the map drains deterministically once the hook batch returns. This
//! keeps the callback surface free of re-entrant borrows and global
//! registries while still letting game scripts teleport the party, steer
//! objects, and queue dialog requests.

use serde_json::Value;
use tilequest_core::{Direction, MapId, ObjectId, Position};

use crate::movement::Movement;

/// Callback installed on areas, objects, and interactive tiles.
pub type ScriptHook = Box<dyn FnMut(&mut Vec<ScriptEffect>)>;

/// Deferred world mutation requested by a script callback.
#[derive(Clone, Debug)]
pub enum ScriptEffect {
    /// Requests a teleport; `map: None` repositions within the current map.
    ScheduleTeleport {
        /// Destination map, or `None` to stay on the current map.
        map: Option<MapId>,
        /// Tile the party is placed on after the transition.
        position: Position,
        /// Optional facing override applied at the destination.
        facing: Option<Direction>,
    },
    /// Queues a movement on a placed object.
    ScheduleMovement {
        /// Object receiving the movement.
        object: ObjectId,
        /// Movement to queue.
        movement: Movement,
        /// Clears the queue first and inserts this command alone.
        override_queue: bool,
    },
    /// Queues a movement on the party avatar.
    SchedulePartyMovement {
        /// Movement to queue.
        movement: Movement,
        /// Clears the queue first and inserts this command alone.
        override_queue: bool,
    },
    /// Fire-and-forget request for the dialog/presentation collaborator.
    Message(String),
    /// Replaces the map's opaque local-state snapshot.
    SetLocalState(Value),
}
