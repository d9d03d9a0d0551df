//! Event bus.
//!
//! Every window owns one [`EventQueue`] for its own signals (render ticks and
//! component lifecycle) and the app owns one for cross-window signals (the
//! app-wide render tick, window close and window destroyed notifications).
//!
//! Delivery is synchronous: [`EventQueue::fire`] calls the matching listeners
//! before it returns. The events a queue retains afterwards only serve as
//! bookkeeping and expire through [`EventQueue::tick`].

mod event;
mod listener;
mod queue;

pub use event::{Event, EventKind, EventOrigin, EventPayload};
pub use listener::{ListenerHandle, ListenerId, ListenerOptions, Subscriber};
pub use queue::EventQueue;
