//! Trigger regions evaluated against party position changes.

use std::collections::HashSet;
use std::fmt;

use tilequest_core::Position;

use crate::script::{ScriptEffect, ScriptHook};

/// Named set of grid positions with enter/move/leave callbacks.
///
/// Areas are held by their map and are stateless besides geometry; all
/// game-specific reactions live in the installed hooks.
pub struct Area {
    positions: HashSet<Position>,
    on_enter: Option<ScriptHook>,
    on_move_within: Option<ScriptHook>,
    on_leave: Option<ScriptHook>,
}

impl Area {
    /// Creates an area from an explicit position collection.
    #[must_use]
    pub fn new<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        Self {
            positions: positions.into_iter().collect(),
            on_enter: None,
            on_move_within: None,
            on_leave: None,
        }
    }

    /// Creates a rectangular area spanning `columns x rows` tiles from
    /// `origin` (inclusive).
    #[must_use]
    pub fn from_rect(origin: Position, columns: u32, rows: u32) -> Self {
        let mut positions = HashSet::new();
        for row in 0..rows as i32 {
            for column in 0..columns as i32 {
                let _ = positions.insert(Position::new(origin.x() + column, origin.y() + row));
            }
        }
        Self {
            positions,
            on_enter: None,
            on_move_within: None,
            on_leave: None,
        }
    }

    /// Installs the callback fired when the party enters the area.
    #[must_use]
    pub fn with_on_enter(mut self, hook: ScriptHook) -> Self {
        self.on_enter = Some(hook);
        self
    }

    /// Installs the callback fired when the party moves between two tiles
    /// that both lie inside the area.
    #[must_use]
    pub fn with_on_move_within(mut self, hook: ScriptHook) -> Self {
        self.on_move_within = Some(hook);
        self
    }

    /// Installs the callback fired when the party leaves the area.
    #[must_use]
    pub fn with_on_leave(mut self, hook: ScriptHook) -> Self {
        self.on_leave = Some(hook);
        self
    }

    /// Reports whether the position lies inside the area.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    pub(crate) fn fire_enter(&mut self, effects: &mut Vec<ScriptEffect>) {
        if let Some(hook) = self.on_enter.as_mut() {
            hook(effects);
        }
    }

    pub(crate) fn fire_move_within(&mut self, effects: &mut Vec<ScriptEffect>) {
        if let Some(hook) = self.on_move_within.as_mut() {
            hook(effects);
        }
    }

    pub(crate) fn fire_leave(&mut self, effects: &mut Vec<ScriptEffect>) {
        if let Some(hook) = self.on_leave.as_mut() {
            hook(effects);
        }
    }
}

impl fmt::Debug for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Area")
            .field("positions", &self.positions.len())
            .field("on_enter", &self.on_enter.is_some())
            .field("on_move_within", &self.on_move_within.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .finish()
    }
}
