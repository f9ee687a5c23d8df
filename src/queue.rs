// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A bounded, blocking, closable FIFO ring buffer.
//!
//! Producers block in [`BoundedQueue::add`] while the ring is full and
//! consumers block in [`BoundedQueue::remove`] while it is empty.  Closing
//! the queue stops new items from entering but lets consumers drain what
//! is already there; [`BoundedQueue::finish`] closes and then waits for
//! that drain to complete.
//!
//! The ring has `capacity` slots but only ever holds `capacity - 1`
//! items at once.  Every predicate the queue waits on, and every change to
//! the cursors, the occupancy or the open flag, happens under the one
//! mutex, so a wakeup can never be lost between checking a condition and
//! going to sleep on it.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Returned by [`BoundedQueue::add`] when the queue is closed.  Carries
/// the refused item back to the caller.
#[derive(PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> fmt::Debug for Closed<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Closed(..)")
    }
}

struct Ring<T> {
    slots: Vec<Option<T>>,
    // Cursors only ever grow; the slot is the cursor modulo capacity.
    head: usize,
    tail: usize,
    len: usize,
    open: bool,
}

impl<T> Ring<T> {
    fn is_full(&self) -> bool {
        self.len == self.slots.len() - 1
    }
}

/// A thread-safe circular buffer of fixed capacity with blocking `add`
/// and `remove` and a close/drain shutdown protocol.
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    drained: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create an open, empty queue with `capacity` slots, of which
    /// `capacity - 1` are usable.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is less than 2, since such a queue could never
    /// hold anything.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "queue capacity must be at least 2");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        BoundedQueue {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                len: 0,
                open: true,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    // Ring updates never panic halfway, so a poisoned lock still guards a
    // consistent ring.
    fn lock(&self) -> MutexGuard<Ring<T>> {
        self.ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue `item`, blocking while the queue is full.
    ///
    /// Fails immediately if the queue is already closed, and fails if it
    /// is closed while this call is waiting for space.  Either way the
    /// item is handed back inside [`Closed`].
    pub fn add(&self, item: T) -> Result<(), Closed<T>> {
        let mut ring = self.lock();
        if !ring.open {
            return Err(Closed(item));
        }
        while ring.open && ring.is_full() {
            ring = self
                .not_full
                .wait(ring)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if !ring.open {
            return Err(Closed(item));
        }

        let capacity = ring.slots.len();
        let slot = ring.tail % capacity;
        debug_assert!(ring.slots[slot].is_none());
        ring.slots[slot] = Some(item);
        ring.tail = ring.tail.wrapping_add(1);
        ring.len += 1;
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue the oldest item, blocking while the queue is empty and
    /// open.  Returns `None` only once the queue is closed *and* empty,
    /// which is the end of the stream.
    pub fn remove(&self) -> Option<T> {
        let mut ring = self.lock();
        while ring.open && ring.len == 0 {
            ring = self
                .not_empty
                .wait(ring)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if ring.len == 0 {
            return None;
        }

        let capacity = ring.slots.len();
        let slot = ring.head % capacity;
        let item = ring.slots[slot].take();
        debug_assert!(item.is_some());
        ring.head = ring.head.wrapping_add(1);
        ring.len -= 1;
        self.not_full.notify_one();
        if ring.len == 0 {
            self.drained.notify_all();
        }
        item
    }

    /// Stop accepting items and wake every waiting thread so it can
    /// re-check its condition.  Closing a closed queue does nothing.
    pub fn close(&self) {
        let mut ring = self.lock();
        ring.open = false;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.drained.notify_all();
    }

    /// Close the queue, then block until every item already in it has
    /// been removed.
    pub fn finish(&self) {
        self.close();
        let mut ring = self.lock();
        while ring.len != 0 {
            ring = self
                .drained
                .wait(ring)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Close the queue and drop everything still in it, waking all
    /// waiters.  Returns the number of items dropped.  This is the
    /// teardown path for when the consumer has gone away and a `finish`
    /// would otherwise never return.
    pub fn discard(&self) -> usize {
        let mut ring = self.lock();
        ring.open = false;
        let dropped = ring.len;
        for slot in ring.slots.iter_mut() {
            *slot = None;
        }
        ring.head = ring.tail;
        ring.len = 0;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.drained.notify_all();
        dropped
    }

    /// True if nothing is queued right now.
    pub fn is_empty(&self) -> bool {
        self.lock().len == 0
    }

    /// True until the queue has been closed.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// The number of items queued right now.
    pub fn len(&self) -> usize {
        self.lock().len
    }

    /// The number of slots in the ring.  At most `capacity() - 1` items
    /// are ever held.
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }
}
