//! Entity lifecycle tracking.
//!
//! The tracker is a side-table from [`EntityId`] to [`EntityState`]. The
//! entities themselves live elsewhere; an id that is not in the table is
//! [`EntityState::Detached`] and can never produce a store mutation.
//!
//! ```text
//!   draw ─────────► Added ──── insert ok ───► Unchanged ◄── load
//!   edit Unchanged ────────────────────────► Modified ── update ok ─► Unchanged
//!   delete Added / Unchanged / Modified ───► Deleted ─── delete ok ─► (forgotten)
//! ```
//!
//! A failed store operation leaves the state untouched, so the entity is
//! retried on the next save.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use undergrid_types::{EntityId, EntityState};

/// What was attempted when a transition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateEvent {
    Draw,
    Load,
    Edit,
    Delete,
    Synced,
}

impl fmt::Display for StateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draw => "draw",
            Self::Load => "load",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Synced => "sync",
        };
        f.write_str(s)
    }
}

/// Errors from the lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cannot {event} entity {id} while {from}")]
    InvalidTransition {
        id: EntityId,
        from: EntityState,
        event: StateEvent,
    },
}

/// Side-table of lifecycle states for tracked entities.
#[derive(Debug, Clone, Default)]
pub struct StateTracker {
    states: HashMap<EntityId, EntityState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `id`; untracked ids are `Detached`.
    pub fn state(&self, id: &EntityId) -> EntityState {
        self.states.get(id).copied().unwrap_or(EntityState::Detached)
    }

    /// Starts tracking a freshly drawn entity as `Added`.
    pub fn track_drawn(&mut self, id: EntityId) -> Result<(), StateError> {
        self.track(id, EntityState::Added, StateEvent::Draw)
    }

    /// Starts tracking an entity read from the store as `Unchanged`.
    pub fn track_loaded(&mut self, id: EntityId) -> Result<(), StateError> {
        self.track(id, EntityState::Unchanged, StateEvent::Load)
    }

    fn track(&mut self, id: EntityId, state: EntityState, event: StateEvent) -> Result<(), StateError> {
        if let Some(&from) = self.states.get(&id) {
            return Err(StateError::InvalidTransition { id, from, event });
        }
        self.states.insert(id, state);
        Ok(())
    }

    /// Records a user edit. `Unchanged` becomes `Modified`; `Added` and
    /// `Modified` stay as they are.
    pub fn mark_modified(&mut self, id: EntityId) -> Result<EntityState, StateError> {
        let next = match self.state(&id) {
            EntityState::Unchanged | EntityState::Modified => EntityState::Modified,
            EntityState::Added => EntityState::Added,
            from @ (EntityState::Deleted | EntityState::Detached) => {
                return Err(StateError::InvalidTransition {
                    id,
                    from,
                    event: StateEvent::Edit,
                });
            }
        };
        self.states.insert(id, next);
        Ok(next)
    }

    /// Records a delete request.
    pub fn mark_deleted(&mut self, id: EntityId) -> Result<EntityState, StateError> {
        match self.state(&id) {
            EntityState::Added | EntityState::Unchanged | EntityState::Modified => {
                self.states.insert(id, EntityState::Deleted);
                Ok(EntityState::Deleted)
            }
            from @ (EntityState::Deleted | EntityState::Detached) => {
                Err(StateError::InvalidTransition {
                    id,
                    from,
                    event: StateEvent::Delete,
                })
            }
        }
    }

    /// Records a successful store operation and returns the resulting state.
    ///
    /// `Added` and `Modified` become `Unchanged`. A synced `Deleted` entity is
    /// forgotten and reported as `Detached`.
    pub fn mark_synced(&mut self, id: EntityId) -> Result<EntityState, StateError> {
        match self.state(&id) {
            EntityState::Added | EntityState::Modified => {
                self.states.insert(id, EntityState::Unchanged);
                Ok(EntityState::Unchanged)
            }
            EntityState::Deleted => {
                self.states.remove(&id);
                Ok(EntityState::Detached)
            }
            from @ (EntityState::Unchanged | EntityState::Detached) => {
                Err(StateError::InvalidTransition {
                    id,
                    from,
                    event: StateEvent::Synced,
                })
            }
        }
    }

    /// Stops tracking `id`, returning its last state.
    pub fn forget(&mut self, id: &EntityId) -> Option<EntityState> {
        self.states.remove(id)
    }

    /// Tracked entities that will produce a store mutation on the next save.
    pub fn pending(&self) -> impl Iterator<Item = (EntityId, EntityState)> + '_ {
        self.states
            .iter()
            .filter(|(_, state)| state.is_pending())
            .map(|(id, state)| (*id, *state))
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn is_tracked(&self, id: &EntityId) -> bool {
        self.states.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
