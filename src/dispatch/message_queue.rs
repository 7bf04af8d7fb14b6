//! A buffered, veto-capable message channel (§4.10).
//!
//! `Scope::Global` guards its buffer with a `Mutex` for cross-thread use;
//! `Scope::Thread` uses a plain `RefCell`, trading thread-safety for no
//! locking overhead — the two scopes spec calls for, modeled as a storage
//! choice rather than two separate types so both share one API.

use std::cell::RefCell;
use std::collections::VecDeque;

use parking_lot::Mutex;

use super::event::Event;

/// Selects a [`MessageQueue`]'s internal synchronization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Mutex-guarded; safe to share across threads.
    Global,
    /// `RefCell`-backed; confined to a single thread, no locking.
    Thread,
}

enum Buffer<T> {
    Global(Mutex<VecDeque<T>>),
    Thread(RefCell<VecDeque<T>>),
}

/// A queue of messages of type `T`, with veto-capable hooks run before a
/// message is accepted (`on_send`) and when it is delivered (`on_receive`).
pub struct MessageQueue<T: 'static> {
    buffer: Buffer<T>,
    on_send: Event<T, bool>,
    on_receive: Event<T, bool>,
}

impl<T: 'static> MessageQueue<T> {
    pub fn new(scope: Scope) -> Self {
        MessageQueue {
            buffer: match scope {
                Scope::Global => Buffer::Global(Mutex::new(VecDeque::new())),
                Scope::Thread => Buffer::Thread(RefCell::new(VecDeque::new())),
            },
            on_send: Event::new(),
            on_receive: Event::new(),
        }
    }

    /// The hook run (in order) before a message is accepted by [`queue`] or
    /// [`send`]; any subscriber returning `false` rejects the message.
    ///
    /// [`queue`]: MessageQueue::queue
    /// [`send`]: MessageQueue::send
    pub fn on_send(&mut self) -> &mut Event<T, bool> {
        &mut self.on_send
    }

    /// The hook run (in order) when a message is delivered, either
    /// immediately by [`send`] or later by [`dispatch`].
    ///
    /// [`send`]: MessageQueue::send
    /// [`dispatch`]: MessageQueue::dispatch
    pub fn on_receive(&mut self) -> &mut Event<T, bool> {
        &mut self.on_receive
    }

    /// Buffers `message` for a later [`MessageQueue::dispatch`], unless an
    /// `on_send` subscriber vetoes it. Returns whether it was queued.
    pub fn queue(&self, message: T) -> bool
    where
        T: Clone,
    {
        if self.on_send.dispatch_vetoable(message.clone()) {
            return false;
        }
        match &self.buffer {
            Buffer::Global(m) => m.lock().push_back(message),
            Buffer::Thread(c) => c.borrow_mut().push_back(message),
        }
        true
    }

    /// Delivers `message` to `on_receive` subscribers immediately,
    /// bypassing the buffer. Returns whether it was delivered (not
    /// vetoed by either hook).
    pub fn send(&self, message: T) -> bool
    where
        T: Clone,
    {
        if self.on_send.dispatch_vetoable(message.clone()) {
            return false;
        }
        !self.on_receive.dispatch_vetoable(message)
    }

    /// Drains the buffer in FIFO order, running `on_receive` for each
    /// message. Messages vetoed at receive time are simply dropped.
    pub fn dispatch(&self)
    where
        T: Clone,
    {
        let drained: Vec<T> = match &self.buffer {
            Buffer::Global(m) => m.lock().drain(..).collect(),
            Buffer::Thread(c) => c.borrow_mut().drain(..).collect(),
        };
        for message in drained {
            self.on_receive.dispatch_vetoable(message);
        }
    }

    pub fn len(&self) -> usize {
        match &self.buffer {
            Buffer::Global(m) => m.lock().len(),
            Buffer::Thread(c) => c.borrow().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
