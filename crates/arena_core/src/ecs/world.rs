//! The world: entities, components, filters and the message bus of one match.
//!
//! A world is owned by exactly one simulation and mutated only from inside
//! its tick. Every structural change (add, remove, destroy) goes through this
//! type so that registered filters stay exact.

use std::collections::{BTreeMap, BTreeSet};

use crate::components::{ComponentKind, ComponentStore};
use crate::ecs::filter::FilterState;
use crate::ecs::{
    Component, DataComponent, Entity, EntityStore, Filter, FilterEvent, FilterId, Message,
    Relation,
};
use crate::messages::MessageBus;

/// Container for all simulation state of one match.
#[derive(Debug, Clone, Default)]
pub struct World {
    entities: EntityStore,
    components: ComponentStore,
    filters: Vec<FilterState>,
    by_kind: BTreeMap<ComponentKind, Vec<FilterId>>,
    messages: MessageBus,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create a new entity with no components.
    pub fn create(&mut self) -> Entity {
        let entity = self.entities.create();
        let candidates: Vec<FilterId> = (0..self.filters.len())
            .map(FilterId)
            .filter(|id| self.filters[id.0].filter.accepts_bare())
            .collect();
        for id in candidates {
            self.refresh_one(id, entity);
        }
        entity
    }

    /// Destroy an entity, detaching every component and retracting it from
    /// every filter.
    ///
    /// Destroying a missing entity is a logged no-op. Returns whether the
    /// entity existed.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.entities.contains(entity) {
            tracing::warn!(%entity, "destroy called on missing entity");
            return false;
        }

        self.components.remove_all(entity);
        self.entities.destroy(entity);

        for state in &mut self.filters {
            if state.members.contains(&entity) {
                state.apply(entity, false);
            }
        }

        // Relations pointing at the destroyed entity now read as absent.
        let dependent: Vec<FilterId> = self
            .filters
            .iter()
            .enumerate()
            .filter(|(_, state)| state.filter.mentions_target(entity))
            .map(|(index, _)| FilterId(index))
            .collect();
        for id in dependent {
            self.rescan(id);
        }
        true
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component, replacing any existing one of the same type.
    ///
    /// Returns `false` (and attaches nothing) if the entity does not exist.
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.entities.contains(entity) {
            tracing::debug!(%entity, kind = ?T::KIND, "add on missing entity ignored");
            return false;
        }
        self.components.insert(entity, component);
        self.refresh(entity, T::KIND);
        true
    }

    /// Detach a component.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.components.remove::<T>(entity);
        if removed.is_some() {
            self.refresh(entity, T::KIND);
        }
        removed
    }

    /// Whether the entity holds a component of type `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        let present = self.components.contains::<T>(entity);
        if !present && !self.entities.contains(entity) {
            tracing::debug!(%entity, kind = ?T::KIND, "has on missing entity");
        }
        present
    }

    /// Borrow an entity's component.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let component = self.components.get::<T>(entity);
        if component.is_none() && !self.entities.contains(entity) {
            tracing::debug!(%entity, kind = ?T::KIND, "get on missing entity");
        }
        component
    }

    /// Mutably borrow an entity's data component.
    ///
    /// Presence does not change, so no filter is touched.
    pub fn get_mut<T: DataComponent>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    /// Every `(entity, component)` pair of a type, in id order.
    pub fn get_all<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter::<T>()
    }

    /// Target of a relation, or `None` if the relation is missing or its
    /// target no longer exists.
    #[must_use]
    pub fn relation<R: Relation>(&self, entity: Entity) -> Option<Entity> {
        self.components
            .get::<R>(entity)
            .map(R::target)
            .filter(|target| self.entities.contains(*target))
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Register a filter and compute its initial membership.
    pub fn add_filter(&mut self, filter: Filter) -> FilterId {
        let id = FilterId(self.filters.len());
        let kinds: BTreeSet<ComponentKind> = filter.kinds().collect();
        for kind in kinds {
            self.by_kind.entry(kind).or_default().push(id);
        }
        self.filters.push(FilterState::new(filter));
        self.rescan(id);
        // Initial membership is not a change anyone observed.
        self.filters[id.0].events.clear();
        id
    }

    /// Current members of a filter, in id order.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this world.
    #[must_use]
    pub fn members(&self, id: FilterId) -> &BTreeSet<Entity> {
        &self.filter_state(id).members
    }

    /// Snapshot of a filter's members, safe to iterate while mutating.
    #[must_use]
    pub fn query(&self, id: FilterId) -> Vec<Entity> {
        self.members(id).iter().copied().collect()
    }

    /// Whether an entity is currently in a filter.
    #[must_use]
    pub fn matches(&self, id: FilterId, entity: Entity) -> bool {
        self.members(id).contains(&entity)
    }

    /// Take the buffered membership changes of a tracked filter.
    pub fn drain_filter_events(&mut self, id: FilterId) -> Vec<FilterEvent> {
        let _ = self.filter_state(id);
        std::mem::take(&mut self.filters[id.0].events)
    }

    fn filter_state(&self, id: FilterId) -> &FilterState {
        self.filters
            .get(id.0)
            .unwrap_or_else(|| panic!("unknown filter handle {id:?}"))
    }

    fn refresh(&mut self, entity: Entity, kind: ComponentKind) {
        let Some(ids) = self.by_kind.get(&kind) else {
            return;
        };
        for &id in ids {
            let state = &mut self.filters[id.0];
            let matches = state.filter.matches(&self.components, &self.entities, entity);
            state.apply(entity, matches);
        }
    }

    fn refresh_one(&mut self, id: FilterId, entity: Entity) {
        let state = &mut self.filters[id.0];
        let matches = state.filter.matches(&self.components, &self.entities, entity);
        state.apply(entity, matches);
    }

    fn rescan(&mut self, id: FilterId) {
        let state = &mut self.filters[id.0];
        let stale: Vec<Entity> = state
            .members
            .iter()
            .copied()
            .filter(|entity| !self.entities.contains(*entity))
            .collect();
        for entity in stale {
            state.apply(entity, false);
        }
        for entity in self.entities.iter() {
            let matches = state.filter.matches(&self.components, &self.entities, entity);
            state.apply(entity, matches);
        }
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Send a message for the rest of this tick and the next.
    pub fn send<T: Message>(&mut self, message: T) {
        self.messages.send(message);
    }

    /// This tick's messages of type `T`.
    #[must_use]
    pub fn read<T: Message>(&self) -> &[T] {
        self.messages.read::<T>()
    }

    /// Last tick's messages of type `T`.
    #[must_use]
    pub fn read_previous<T: Message>(&self) -> &[T] {
        self.messages.read_previous::<T>()
    }

    /// Rotate the message bus. Called by the scheduler at the end of a tick.
    pub fn rotate_messages(&mut self) {
        self.messages.rotate();
    }

    /// Drop every pending message.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }
}
