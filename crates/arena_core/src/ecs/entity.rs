//! Entity identifiers and the store that issues them.
//!
//! Entities are opaque, strictly increasing 64-bit ids. Zero is reserved as
//! the "none" sentinel and ids are never reused within a world.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Entity(pub u64);

impl Entity {
    /// Sentinel meaning "no entity".
    pub const NONE: Self = Self(0);

    /// Get the raw u64 value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this is the "none" sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Tracks which entities currently exist.
#[derive(Debug, Clone)]
pub struct EntityStore {
    alive: BTreeSet<Entity>,
    next_id: u64,
}

impl EntityStore {
    /// Create an empty store. The first entity issued is `Entity(1)`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alive: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Issue a fresh entity id.
    pub fn create(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        self.alive.insert(entity);
        entity
    }

    /// Forget an entity. Returns `false` if it did not exist.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.alive.remove(&entity)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Check if no entities are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Iterate live entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut store = EntityStore::new();
        let a = store.create();
        let b = store.create();
        assert_eq!(a, Entity(1));
        assert!(b > a);
        assert!(!a.is_none());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = EntityStore::new();
        let a = store.create();
        assert!(store.destroy(a));
        assert!(!store.destroy(a));
        let b = store.create();
        assert_ne!(a, b);
        assert!(!store.contains(a));
        assert!(store.contains(b));
    }
}
