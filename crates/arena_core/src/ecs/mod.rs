//! Entity/component/message substrate.
//!
//! - [`entity`] - opaque ids and their store
//! - [`component`] - typed storage for the closed component set
//! - [`filter`] - standing queries kept exact on every change
//! - [`message`] - the per-tick message bus
//! - [`world`] - owner of all of the above
//! - [`scheduler`] - fixed-order system execution

pub mod component;
pub mod entity;
pub mod filter;
pub mod message;
pub mod scheduler;
pub mod world;

pub(crate) use component::component_set;
pub(crate) use message::message_set;

pub use component::{Component, DataComponent, Relation, Storage};
pub use entity::{Entity, EntityStore};
pub use filter::{Filter, FilterEvent, FilterId};
pub use message::{Mailbox, Message};
pub use scheduler::{Scheduler, System};
pub use world::World;
