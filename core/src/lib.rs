#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilequest engine.
//!
//! This crate defines the primitive vocabulary that connects the
//! authoritative world, the pure systems, and the adapters: grid positions,
//! cardinal directions, the shared obstacle classification consumed by both
//! tiles and placed objects, and the identifier newtypes used to address
//! maps, objects, and trigger areas. Adapters deliver already-decoded
//! [`PartyCommand`] edges; the world advances one tick at a time and exposes
//! read-only snapshots in return.

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tilequest.";

/// Location of a single grid tile expressed as signed x/y coordinates.
///
/// Positions are immutable values; the arithmetic helpers return new
/// positions rather than mutating in place. Ordering is row-major: the row
/// (`y`) is compared first, then the column (`x`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position one tile above this one.
    #[must_use]
    pub const fn up(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    /// Returns the position one tile below this one.
    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// Returns the position one tile to the left of this one.
    #[must_use]
    pub const fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    /// Returns the position one tile to the right of this one.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// Returns the position `amount` tiles away in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction, amount: i32) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx * amount, self.y + dy * amount)
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub const fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

/// Cardinal movement directions available to the party and map objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
}

impl Direction {
    /// All directions in stable table order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Returns the direction pointing the opposite way.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Unit offset applied to a position when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Stable index used for per-direction lookup tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }
}

/// Obstacle classification shared by tiles and placed map objects.
///
/// The same four-way split governs both the static grid and dynamic
/// entities so move resolution is written once against this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleClass {
    /// Drawn under entities; never blocks movement.
    Below,
    /// Solid: blocks movement and receives activation directly.
    Obstacle,
    /// Solid for walking, transparent for activation (see-through barrier).
    Counter,
    /// Drawn over entities; never blocks movement.
    Above,
}

impl ObstacleClass {
    /// Reports whether this classification blocks movement onto its tile.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, ObstacleClass::Obstacle | ObstacleClass::Counter)
    }
}

/// Unique identifier assigned to a registered map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(u32);

impl MapId {
    /// Creates a new map identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle addressing a map object inside its owning map's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier assigned to a trigger area in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(u32);

impl AreaId {
    /// Creates a new area identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Decoded player commands delivered by the input adapter.
///
/// The core never polls devices; it consumes this closed set as discrete
/// pressed/released edges paired with a [`CommandEdge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartyCommand {
    /// Directional command toward decreasing rows.
    Up,
    /// Directional command toward increasing rows.
    Down,
    /// Directional command toward decreasing columns.
    Left,
    /// Directional command toward increasing columns.
    Right,
    /// Interaction with the tile the party faces.
    Activate,
}

impl PartyCommand {
    /// Maps directional commands to their grid direction.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            PartyCommand::Up => Some(Direction::Up),
            PartyCommand::Down => Some(Direction::Down),
            PartyCommand::Left => Some(Direction::Left),
            PartyCommand::Right => Some(Direction::Right),
            PartyCommand::Activate => None,
        }
    }
}

/// Edge type of a delivered command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandEdge {
    /// The command key transitioned to held.
    Pressed,
    /// The command key transitioned to released.
    Released,
}
