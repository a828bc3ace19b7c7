//! Per-tick message bus.
//!
//! Messages are immutable, tick-scoped command and event records. A message
//! sent during tick *n* is readable for the rest of tick *n* through
//! [`MessageBus::read`] and during tick *n + 1* through
//! [`MessageBus::read_previous`]; the following rotation drops it.
//!
//! Like components, the message set is closed and declared with
//! [`message_set!`].

use crate::messages::MessageBus;

/// A typed, transient record carried by the bus.
pub trait Message: Clone + 'static {
    /// Mailbox holding this message type.
    fn mailbox(bus: &MessageBus) -> &Mailbox<Self>;

    /// Mutable mailbox holding this message type.
    fn mailbox_mut(bus: &mut MessageBus) -> &mut Mailbox<Self>;
}

/// Current and previous tick's messages of one type.
#[derive(Debug, Clone)]
pub struct Mailbox<T> {
    current: Vec<T>,
    previous: Vec<T>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
        }
    }
}

impl<T> Mailbox<T> {
    /// Move current into previous, dropping what previous held.
    pub fn rotate(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }
}

impl MessageBus {
    /// Append a message to the current tick's mailbox.
    pub fn send<T: Message>(&mut self, message: T) {
        T::mailbox_mut(self).current.push(message);
    }

    /// This tick's messages of type `T`, in emission order.
    #[must_use]
    pub fn read<T: Message>(&self) -> &[T] {
        &T::mailbox(self).current
    }

    /// Last tick's messages of type `T`.
    #[must_use]
    pub fn read_previous<T: Message>(&self) -> &[T] {
        &T::mailbox(self).previous
    }
}

/// Declare the closed message set and generate [`MessageBus`].
macro_rules! message_set {
    ($($msg:ident => $field:ident),* $(,)?) => {
        /// One mailbox per message type.
        #[derive(Debug, Clone, Default)]
        pub struct MessageBus {
            $( $field: $crate::ecs::Mailbox<$msg>, )*
        }

        impl MessageBus {
            /// End-of-tick rotation: current becomes previous, current empties.
            pub fn rotate(&mut self) {
                $( self.$field.rotate(); )*
            }

            /// Drop every message, current and previous.
            pub fn clear(&mut self) {
                $( self.$field.clear(); )*
            }
        }

        $(
            impl $crate::ecs::Message for $msg {
                fn mailbox(bus: &MessageBus) -> &$crate::ecs::Mailbox<Self> {
                    &bus.$field
                }

                fn mailbox_mut(bus: &mut MessageBus) -> &mut $crate::ecs::Mailbox<Self> {
                    &mut bus.$field
                }
            }
        )*
    };
}

pub(crate) use message_set;
