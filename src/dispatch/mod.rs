//! Synchronous dispatch primitives: delegates, ordered subscriber events,
//! and buffered veto-capable message queues (§4.10).

pub mod delegate;
pub mod event;
pub mod message_queue;

pub use delegate::Delegate;
pub use event::{Event, SubscriberId};
pub use message_queue::{MessageQueue, Scope};
