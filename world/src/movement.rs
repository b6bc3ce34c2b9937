//! Queued and cyclic motion for the party and placed objects.
//!
//! Each entity carries a FIFO queue of [`Movement`] commands plus a
//! repeating [`MovementCycle`] consulted only when the queue is empty. One
//! queue entry is advanced per tick at most; an entry that completes and
//! leaves the queue empty falls through to the cycle in the same tick.

use std::collections::VecDeque;

use tilequest_core::{Direction, Position};
use tilequest_system_pathfinding::find_path;

use crate::map::{EntityRef, Map, MapError};

/// Outcome of advancing one movement for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The movement occupies further ticks and stays at the queue front.
    Pending,
    /// The movement completed; the engine pops it.
    Done,
}

/// A unit of motion intent consumed by the movement engine.
///
/// The set is closed: every variant advances through the same
/// one-call-per-tick contract, so the engine's drain loop stays uniform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Movement {
    /// One collision-checked step; completes after a single attempt whether
    /// or not the step succeeded (a blocked step is not retried).
    Step(Direction),
    /// One step that bypasses collision entirely; only the grid boundary is
    /// enforced.
    ForcedStep(Direction),
    /// Repeated steps until blocked or until the optional distance budget
    /// is exhausted. `back` reverses the visible facing while moving.
    Slide {
        /// Direction of travel.
        direction: Direction,
        /// Face away from the travel direction (being pulled).
        back: bool,
        /// Remaining tiles, or `None` to slide until blocked.
        remaining: Option<u32>,
    },
    /// Sets the facing without moving; consumes one scheduling slot.
    Face(Direction),
    /// Occupies the given number of ticks doing nothing.
    Wait(u32),
    /// Precomputed route replayed as steps; an empty route completes
    /// immediately.
    Path(VecDeque<Direction>),
}

impl Movement {
    /// Slide until blocked, facing the travel direction.
    #[must_use]
    pub const fn slide(direction: Direction) -> Self {
        Movement::Slide {
            direction,
            back: false,
            remaining: None,
        }
    }

    /// Slide until blocked while facing away from the travel direction.
    #[must_use]
    pub const fn slide_back(direction: Direction) -> Self {
        Movement::Slide {
            direction,
            back: true,
            remaining: None,
        }
    }

    /// Slide at most `distance` tiles, stopping earlier when blocked.
    #[must_use]
    pub const fn slide_bounded(direction: Direction, distance: u32) -> Self {
        Movement::Slide {
            direction,
            back: false,
            remaining: Some(distance),
        }
    }

    /// Plans a route on the map and wraps it as a replayable path.
    ///
    /// The route is computed once, here; the world changing afterwards does
    /// not trigger a re-plan. When no route exists the resulting movement
    /// completes immediately without moving.
    #[must_use]
    pub fn path_to(map: &Map, start: Position, goal: Position) -> Self {
        let (columns, rows) = map.grid().dimensions();
        let steps = find_path(columns, rows, start, goal, |from, direction| {
            map.can_enter(from.step(direction, 1), direction)
        })
        .unwrap_or_default();
        Movement::Path(steps.into())
    }

    /// Advances the movement by one tick against the provided map.
    pub(crate) fn advance(
        &mut self,
        map: &mut Map,
        entity: EntityRef,
    ) -> Result<Advance, MapError> {
        match self {
            Movement::Step(direction) => {
                let _ = map.try_to_move(entity, *direction);
                Ok(Advance::Done)
            }
            Movement::ForcedStep(direction) => {
                map.forced_move(entity, *direction)?;
                Ok(Advance::Done)
            }
            Movement::Slide {
                direction,
                back,
                remaining,
            } => {
                // A pulled entity faces away from its travel direction even
                // when the very first step is blocked.
                if *back {
                    map.set_facing(entity, direction.inverse());
                }
                if matches!(remaining, Some(0)) {
                    return Ok(Advance::Done);
                }
                if !map.try_to_move(entity, *direction) {
                    return Ok(Advance::Done);
                }
                // The committed move turned the mover forward again.
                if *back {
                    map.set_facing(entity, direction.inverse());
                }
                if let Some(budget) = remaining {
                    *budget -= 1;
                    if *budget == 0 {
                        return Ok(Advance::Done);
                    }
                }
                Ok(Advance::Pending)
            }
            Movement::Face(direction) => {
                map.set_facing(entity, *direction);
                Ok(Advance::Done)
            }
            Movement::Wait(ticks) => {
                if *ticks == 0 {
                    return Ok(Advance::Done);
                }
                *ticks -= 1;
                if *ticks == 0 {
                    Ok(Advance::Done)
                } else {
                    Ok(Advance::Pending)
                }
            }
            Movement::Path(steps) => {
                let Some(direction) = steps.pop_front() else {
                    return Ok(Advance::Done);
                };
                let _ = map.try_to_move(entity, direction);
                if steps.is_empty() {
                    Ok(Advance::Done)
                } else {
                    Ok(Advance::Pending)
                }
            }
        }
    }
}

/// Ordered, repeating movement pattern used when the queue is empty.
///
/// The cycle never empties: when its current entry completes the cursor
/// advances and wraps, restarting the pattern indefinitely. An empty cycle
/// simply idles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementCycle {
    entries: Vec<Movement>,
    cursor: usize,
    active: Option<Movement>,
}

impl MovementCycle {
    /// Creates a cycle from the provided pattern.
    #[must_use]
    pub fn new(entries: Vec<Movement>) -> Self {
        Self {
            entries,
            cursor: 0,
            active: None,
        }
    }

    /// Cycle with no entries; the entity idles when its queue is empty.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            active: None,
        }
    }

    /// Takes the in-flight entry, or instantiates the entry at the cursor.
    pub(crate) fn take_current(&mut self) -> Option<Movement> {
        self.active
            .take()
            .or_else(|| self.entries.get(self.cursor).cloned())
    }

    /// Stores a partially completed entry for the next tick.
    pub(crate) fn store_active(&mut self, movement: Movement) {
        self.active = Some(movement);
    }

    /// Moves to the next entry, wrapping at the end of the pattern.
    pub(crate) fn advance_cursor(&mut self) {
        if !self.entries.is_empty() {
            self.cursor = (self.cursor + 1) % self.entries.len();
        }
    }
}
