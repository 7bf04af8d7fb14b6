//! An ordered, synchronously-dispatched subscriber list (§4.10).
//!
//! Subscribers are identified by a stable [`SubscriberId`] rather than a
//! drop-based guard: unsubscribing on drop would need the guard to share
//! ownership of the `Event` it came from (an `Rc<RefCell<_>>>`), which would
//! contradict the single-threaded-cooperative, lock-free core the rest of
//! this crate keeps to (see SPEC_FULL.md's concurrency section). Callers
//! that want RAII can pair the returned id with their own `Drop` impl.

use super::delegate::Delegate;

/// A stable handle returned by [`Event::subscribe`] and friends, used to
/// reorder or remove a subscription later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscription<Args, Out> {
    id: SubscriberId,
    delegate: Delegate<Args, Out>,
}

/// An ordered list of [`Delegate`]s, invoked in subscription order.
///
/// `Out` defaults to `()` for plain notification events; event types that
/// need to veto (component lock/enable hooks, message-queue send/receive
/// hooks) use `Out = bool`, where any subscriber returning `false` halts
/// dispatch and reports the event as vetoed.
pub struct Event<Args, Out = ()> {
    subscribers: Vec<Subscription<Args, Out>>,
    next_id: u64,
}

impl<Args, Out> Event<Args, Out> {
    pub fn new() -> Self {
        Event {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Appends a subscriber at the end of the dispatch order.
    pub fn subscribe(&mut self, delegate: Delegate<Args, Out>) -> SubscriberId {
        let id = self.alloc_id();
        self.subscribers.push(Subscription { id, delegate });
        id
    }

    /// Inserts a subscriber immediately before `before` in dispatch order.
    /// Appends at the end if `before` is not currently subscribed.
    pub fn subscribe_before(&mut self, before: SubscriberId, delegate: Delegate<Args, Out>) -> SubscriberId {
        let id = self.alloc_id();
        let pos = self
            .subscribers
            .iter()
            .position(|s| s.id == before)
            .unwrap_or(self.subscribers.len());
        self.subscribers.insert(pos, Subscription { id, delegate });
        id
    }

    /// Inserts a subscriber immediately after `after` in dispatch order.
    /// Appends at the end if `after` is not currently subscribed.
    pub fn subscribe_after(&mut self, after: SubscriberId, delegate: Delegate<Args, Out>) -> SubscriberId {
        let id = self.alloc_id();
        let pos = self
            .subscribers
            .iter()
            .position(|s| s.id == after)
            .map(|p| p + 1)
            .unwrap_or(self.subscribers.len());
        self.subscribers.insert(pos, Subscription { id, delegate });
        id
    }

    /// Removes a subscriber. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        match self.subscribers.iter().position(|s| s.id == id) {
            Some(pos) => {
                self.subscribers.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<Args: Clone, Out> Event<Args, Out> {
    /// Calls every subscriber in order, discarding their return values.
    pub fn dispatch(&self, args: Args) {
        for s in &self.subscribers {
            s.delegate.call(args.clone());
        }
    }
}

impl<Args: Clone> Event<Args, bool> {
    /// Calls subscribers in order until one returns `false` (a veto),
    /// stopping immediately. Returns whether the event was vetoed.
    pub fn dispatch_vetoable(&self, args: Args) -> bool {
        for s in &self.subscribers {
            if !s.delegate.call(args.clone()) {
                return true;
            }
        }
        false
    }
}

impl<Args, Out> Default for Event<Args, Out> {
    fn default() -> Self {
        Self::new()
    }
}
