//! Component traits and typed storage.
//!
//! The component set is closed: [`component_set!`] declares every data
//! component and every relation in one place and generates
//! [`ComponentKind`](crate::components::ComponentKind), the
//! [`ComponentStore`](crate::components::ComponentStore) with one ordered map
//! per type, and the trait impls that route a type to its storage. There is
//! no runtime type lookup.

use std::collections::BTreeMap;

use crate::components::{ComponentKind, ComponentStore};
use crate::ecs::Entity;

/// Per-type storage. Ordered so that iteration follows entity id order.
pub type Storage<T> = BTreeMap<Entity, T>;

/// A typed record attached to at most one entity per type.
pub trait Component: Sized + 'static {
    /// Discriminant used by filters.
    const KIND: ComponentKind;

    /// Storage holding every instance of this type.
    fn storage(store: &ComponentStore) -> &Storage<Self>;

    /// Mutable storage holding every instance of this type.
    fn storage_mut(store: &mut ComponentStore) -> &mut Storage<Self>;
}

/// Components that may be mutated in place.
///
/// Relations are excluded: changing a relation's target must go through
/// [`World::add`](crate::ecs::World::add) so filters see the change.
pub trait DataComponent: Component {}

/// A component that also links its holder to a target entity.
pub trait Relation: Component {
    /// The linked entity.
    fn target(&self) -> Entity;
}

impl ComponentStore {
    /// Borrow an entity's component.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::storage(self).get(&entity)
    }

    /// Mutably borrow an entity's data component.
    pub fn get_mut<T: DataComponent>(&mut self, entity: Entity) -> Option<&mut T> {
        T::storage_mut(self).get_mut(&entity)
    }

    /// Attach or replace a component, returning the previous value.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        T::storage_mut(self).insert(entity, component)
    }

    /// Detach a component.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        T::storage_mut(self).remove(&entity)
    }

    /// Whether the entity holds a component of this type.
    #[must_use]
    pub fn contains<T: Component>(&self, entity: Entity) -> bool {
        T::storage(self).contains_key(&entity)
    }

    /// Iterate every `(entity, component)` pair of a type in id order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        T::storage(self).iter().map(|(entity, component)| (*entity, component))
    }
}

/// Declare the closed component set.
///
/// Data components are listed first, relations second. Every relation must
/// be a tuple struct wrapping its target [`Entity`].
macro_rules! component_set {
    (
        data { $($data:ident => $dfield:ident),* $(,)? }
        relations { $($rel:ident => $rfield:ident),* $(,)? }
    ) => {
        /// Discriminant for every component type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ComponentKind {
            $(
                #[allow(missing_docs)]
                $data,
            )*
            $(
                #[allow(missing_docs)]
                $rel,
            )*
        }

        impl ComponentKind {
            /// Whether this kind is a relation.
            #[must_use]
            pub const fn is_relation(self) -> bool {
                match self {
                    $( ComponentKind::$rel => true, )*
                    _ => false,
                }
            }
        }

        /// One ordered storage per component type.
        #[derive(Debug, Clone, Default)]
        pub struct ComponentStore {
            $( $dfield: $crate::ecs::Storage<$data>, )*
            $( $rfield: $crate::ecs::Storage<$rel>, )*
        }

        impl ComponentStore {
            /// Presence check by kind, used by filter predicates.
            #[must_use]
            pub fn has_kind(&self, kind: ComponentKind, entity: $crate::ecs::Entity) -> bool {
                match kind {
                    $( ComponentKind::$data => self.$dfield.contains_key(&entity), )*
                    $( ComponentKind::$rel => self.$rfield.contains_key(&entity), )*
                }
            }

            /// Raw relation target by kind, without existence checks.
            #[must_use]
            pub fn relation_target(
                &self,
                kind: ComponentKind,
                entity: $crate::ecs::Entity,
            ) -> Option<$crate::ecs::Entity> {
                match kind {
                    $(
                        ComponentKind::$rel => self
                            .$rfield
                            .get(&entity)
                            .map(|relation| $crate::ecs::Relation::target(relation)),
                    )*
                    _ => None,
                }
            }

            /// Detach every component of an entity, returning the kinds removed.
            pub fn remove_all(&mut self, entity: $crate::ecs::Entity) -> Vec<ComponentKind> {
                let mut removed = Vec::new();
                $(
                    if self.$dfield.remove(&entity).is_some() {
                        removed.push(ComponentKind::$data);
                    }
                )*
                $(
                    if self.$rfield.remove(&entity).is_some() {
                        removed.push(ComponentKind::$rel);
                    }
                )*
                removed
            }
        }

        $(
            impl $crate::ecs::Component for $data {
                const KIND: ComponentKind = ComponentKind::$data;

                fn storage(store: &ComponentStore) -> &$crate::ecs::Storage<Self> {
                    &store.$dfield
                }

                fn storage_mut(store: &mut ComponentStore) -> &mut $crate::ecs::Storage<Self> {
                    &mut store.$dfield
                }
            }

            impl $crate::ecs::DataComponent for $data {}
        )*

        $(
            impl $crate::ecs::Component for $rel {
                const KIND: ComponentKind = ComponentKind::$rel;

                fn storage(store: &ComponentStore) -> &$crate::ecs::Storage<Self> {
                    &store.$rfield
                }

                fn storage_mut(store: &mut ComponentStore) -> &mut $crate::ecs::Storage<Self> {
                    &mut store.$rfield
                }
            }

            impl $crate::ecs::Relation for $rel {
                fn target(&self) -> $crate::ecs::Entity {
                    self.0
                }
            }
        )*
    };
}

pub(crate) use component_set;
