// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The OrderGate puts rows back in order after the workers have finished
//! them in whatever order the arithmetic allowed.
//!
//! Rows are produced from `height - 1` down to 0.  Points that escape
//! quickly are cheap and points inside the set cost the full iteration
//! budget, so a worker that picked up a later row can easily finish before
//! one that picked up an earlier row.  The gate holds a single counter,
//! the index of the next row allowed through; a worker holding any other
//! row sleeps until the counter reaches it.  Every time a row passes, the
//! counter drops by one and all sleepers are woken to compare it against
//! their own row.

use std::sync::{Condvar, Mutex, MutexGuard};

struct Counter {
    // None once row 0 has passed.
    next: Option<usize>,
    aborted: bool,
}

/// Returned by [`OrderGate::wait_turn`] when the gate was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateAborted;

/// A descending turnstile for row indices.
pub struct OrderGate {
    counter: Mutex<Counter>,
    advanced: Condvar,
}

/// The right to publish one row.  Hold it while handing the row on, then
/// call [`Turn::pass`] to let the next row through.  Dropping a `Turn`
/// without passing it leaves the gate where it was.
#[must_use = "the gate does not advance until the turn is passed"]
pub struct Turn<'a> {
    gate: &'a OrderGate,
    index: usize,
}

impl OrderGate {
    /// A gate for an image of `height` rows; row `height - 1` goes first.
    pub fn new(height: usize) -> Self {
        OrderGate {
            counter: Mutex::new(Counter {
                next: height.checked_sub(1),
                aborted: false,
            }),
            advanced: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<Counter> {
        self.counter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block until it is row `index`'s turn.  Fails if the gate is
    /// aborted first.
    pub fn wait_turn(&self, index: usize) -> Result<Turn, GateAborted> {
        let mut counter = self.lock();
        while !counter.aborted && counter.next != Some(index) {
            debug_assert!(
                counter.next.map_or(false, |next| next > index),
                "row {} is already behind the gate",
                index
            );
            counter = self
                .advanced
                .wait(counter)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if counter.aborted {
            return Err(GateAborted);
        }
        Ok(Turn { gate: self, index })
    }

    /// The next row allowed through, or `None` once every row has passed.
    pub fn next_required(&self) -> Option<usize> {
        self.lock().next
    }

    /// Wake every waiter and make all present and future waits fail.
    pub fn abort(&self) {
        let mut counter = self.lock();
        counter.aborted = true;
        self.advanced.notify_all();
    }

    /// True once [`OrderGate::abort`] has been called.
    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }
}

impl<'a> Turn<'a> {
    /// The row this turn belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Let the next row through.
    pub fn pass(self) {
        let mut counter = self.gate.lock();
        debug_assert_eq!(counter.next, Some(self.index));
        counter.next = self.index.checked_sub(1);
        self.gate.advanced.notify_all();
    }
}
