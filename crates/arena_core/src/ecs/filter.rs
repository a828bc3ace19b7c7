//! Standing, incrementally maintained entity queries.
//!
//! A [`Filter`] is a predicate over component presence, component absence
//! and relations to specific entities. Once registered with a
//! [`World`](crate::ecs::World) it owns a membership set that the world keeps
//! exact on every add, remove and destroy, recomputing only the filters that
//! reference the touched component kind.

use std::collections::BTreeSet;

use crate::components::{ComponentKind, ComponentStore};
use crate::ecs::{Component, Entity, EntityStore, Relation};

/// Handle to a filter registered with a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(pub(crate) usize);

/// Membership change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEvent {
    /// Entity started matching.
    Added(Entity),
    /// Entity stopped matching (or was destroyed).
    Removed(Entity),
}

/// Predicate description for a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    include: Vec<ComponentKind>,
    exclude: Vec<ComponentKind>,
    relates: Vec<(ComponentKind, Entity)>,
    not_relates: Vec<(ComponentKind, Entity)>,
    tracked: bool,
}

impl Filter {
    /// Empty filter: matches every live entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a component.
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        self.include.push(T::KIND);
        self
    }

    /// Forbid a component.
    #[must_use]
    pub fn without<T: Component>(mut self) -> Self {
        self.exclude.push(T::KIND);
        self
    }

    /// Require a relation of type `R` pointing at `target`.
    #[must_use]
    pub fn relates<R: Relation>(mut self, target: Entity) -> Self {
        self.relates.push((R::KIND, target));
        self
    }

    /// Forbid a relation of type `R` pointing at `target`.
    #[must_use]
    pub fn not_relates<R: Relation>(mut self, target: Entity) -> Self {
        self.not_relates.push((R::KIND, target));
        self
    }

    /// Buffer [`FilterEvent`]s for this filter.
    #[must_use]
    pub fn tracked(mut self) -> Self {
        self.tracked = true;
        self
    }

    /// Evaluate the predicate for one entity.
    ///
    /// A relation whose target no longer exists counts as absent.
    #[must_use]
    pub fn matches(&self, store: &ComponentStore, entities: &EntityStore, entity: Entity) -> bool {
        if !entities.contains(entity) {
            return false;
        }
        let related = |kind: ComponentKind, target: Entity| {
            store.relation_target(kind, entity) == Some(target) && entities.contains(target)
        };

        self.include.iter().all(|&kind| store.has_kind(kind, entity))
            && !self.exclude.iter().any(|&kind| store.has_kind(kind, entity))
            && self.relates.iter().all(|&(kind, target)| related(kind, target))
            && !self
                .not_relates
                .iter()
                .any(|&(kind, target)| related(kind, target))
    }

    /// Component kinds whose change can flip this filter's result.
    pub(crate) fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.include
            .iter()
            .chain(self.exclude.iter())
            .copied()
            .chain(self.relates.iter().map(|(kind, _)| *kind))
            .chain(self.not_relates.iter().map(|(kind, _)| *kind))
    }

    /// Whether an entity with no components can match.
    pub(crate) fn accepts_bare(&self) -> bool {
        self.include.is_empty() && self.relates.is_empty()
    }

    /// Whether the predicate names `entity` as a relation target.
    pub(crate) fn mentions_target(&self, entity: Entity) -> bool {
        self.relates
            .iter()
            .chain(self.not_relates.iter())
            .any(|(_, target)| *target == entity)
    }
}

/// A registered filter and its current membership.
///
/// Only [`World`](super::World) updates a filter, through `&mut self`, so a
/// membership update can never start while another is in progress.
#[derive(Debug, Clone)]
pub(crate) struct FilterState {
    pub(crate) filter: Filter,
    pub(crate) members: BTreeSet<Entity>,
    pub(crate) events: Vec<FilterEvent>,
}

impl FilterState {
    pub(crate) fn new(filter: Filter) -> Self {
        Self {
            filter,
            members: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    /// Apply a freshly evaluated predicate result for one entity.
    pub(crate) fn apply(&mut self, entity: Entity, matches: bool) {
        let event = if matches {
            self.members.insert(entity).then_some(FilterEvent::Added(entity))
        } else {
            self.members
                .remove(&entity)
                .then_some(FilterEvent::Removed(entity))
        };
        if let (Some(event), true) = (event, self.filter.tracked) {
            self.events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AttackTarget, Health, Position, Speed};
    use crate::math::{Fixed, Vec2Fixed};

    fn setup() -> (ComponentStore, EntityStore, Entity, Entity) {
        let mut store = ComponentStore::default();
        let mut entities = EntityStore::new();
        let a = entities.create();
        let b = entities.create();
        store.insert(a, Position(Vec2Fixed::ZERO));
        store.insert(a, Health::new(10));
        store.insert(b, Position(Vec2Fixed::ZERO));
        store.insert(b, Speed(Fixed::from_num(1)));
        (store, entities, a, b)
    }

    #[test]
    fn test_include_exclude() {
        let (store, entities, a, b) = setup();
        let filter = Filter::new().with::<Position>().without::<Speed>();
        assert!(filter.matches(&store, &entities, a));
        assert!(!filter.matches(&store, &entities, b));
    }

    #[test]
    fn test_relation_to_destroyed_target_is_absent() {
        let (mut store, mut entities, a, b) = setup();
        store.insert(a, AttackTarget(b));
        let relates = Filter::new().relates::<AttackTarget>(b);
        let not_relates = Filter::new().not_relates::<AttackTarget>(b);
        assert!(relates.matches(&store, &entities, a));
        assert!(!not_relates.matches(&store, &entities, a));

        entities.destroy(b);
        assert!(!relates.matches(&store, &entities, a));
        assert!(not_relates.matches(&store, &entities, a));
    }

    #[test]
    fn test_apply_emits_events_only_when_tracked() {
        let mut state = FilterState::new(Filter::new().tracked());
        state.apply(Entity(1), true);
        state.apply(Entity(1), true);
        state.apply(Entity(1), false);
        assert_eq!(
            state.events,
            vec![FilterEvent::Added(Entity(1)), FilterEvent::Removed(Entity(1))]
        );

        let mut quiet = FilterState::new(Filter::new());
        quiet.apply(Entity(1), true);
        assert!(quiet.events.is_empty());
        assert!(quiet.members.contains(&Entity(1)));
    }
}
