//! A counting semaphore with three independent classes: an optional
//! `TOTAL` cap shared across everything, plus dedicated `READER` and
//! `WRITER` classes.
//!
//! Acquiring a non-`TOTAL` class first acquires `TOTAL` (if enabled), then
//! its own class. Releasing does the mirror image: the owning class is
//! released first, then `TOTAL` — so a permit holder never observes a
//! window where `TOTAL` looks free while its own class permit is still
//! held.

use std::sync::{Condvar, Mutex};

/// Which counted resource a permit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// The shared cap across readers and writers combined. Disabled
    /// (unlimited) when `SyncIO` is built with `max_total = None`.
    Total,
    /// Concurrent readers of the shared input stream.
    Reader,
    /// Concurrent writers of run files.
    Writer,
}

struct Slot {
    state: Mutex<SlotState>,
    condvar: Condvar,
}

struct SlotState {
    available: i64,
    wakeups: u64,
}

impl Slot {
    fn new(capacity: i64) -> Self {
        Self {
            state: Mutex::new(SlotState {
                available: capacity,
                wakeups: 0,
            }),
            condvar: Condvar::new(),
        }
    }

    fn acquire(&self) {
        let mut state = self.state.lock().unwrap();
        state.available -= 1;
        if state.available < 0 {
            state = self
                .condvar
                .wait_while(state, |s| s.wakeups == 0)
                .unwrap();
            state.wakeups -= 1;
        }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.available += 1;
        if state.available <= 0 {
            state.wakeups += 1;
            drop(state);
            self.condvar.notify_one();
        }
    }
}

/// A multi-class counting semaphore guarding access to a shared stream
/// reader and a shared run writer.
pub struct SyncIO {
    total: Option<Slot>,
    reader: Slot,
    writer: Slot,
}

impl SyncIO {
    /// Builds a new semaphore. `max_total` of `None` (or `Some(0)`)
    /// disables the shared cap, leaving `reader`/`writer` as independent
    /// classes.
    #[must_use]
    pub fn new(max_total: Option<usize>, max_readers: usize, max_writers: usize) -> Self {
        Self {
            total: max_total
                .filter(|&n| n > 0)
                .map(|n| Slot::new(n as i64)),
            reader: Slot::new(max_readers as i64),
            writer: Slot::new(max_writers as i64),
        }
    }

    /// Acquires one permit of `class`, blocking until available.
    pub fn acquire(&self, class: Class) {
        if class != Class::Total {
            if let Some(total) = &self.total {
                total.acquire();
            }
        }
        self.slot(class).acquire();
    }

    /// Releases one permit of `class`, waking a waiter if any is queued.
    pub fn release(&self, class: Class) {
        self.slot(class).release();
        if class != Class::Total {
            if let Some(total) = &self.total {
                total.release();
            }
        }
    }

    fn slot(&self, class: Class) -> &Slot {
        match class {
            Class::Total => self.total.as_ref().expect("TOTAL class is disabled"),
            Class::Reader => &self.reader,
            Class::Writer => &self.writer,
        }
    }
}

/// RAII guard released on drop; convenience wrapper around
/// [`SyncIO::acquire`]/[`SyncIO::release`].
pub struct Permit<'a> {
    sync_io: &'a SyncIO,
    class: Class,
}

impl<'a> Permit<'a> {
    /// Acquires a permit of `class` from `sync_io`, blocking until one is
    /// available, and returns a guard that releases it on drop.
    #[must_use]
    pub fn acquire(sync_io: &'a SyncIO, class: Class) -> Self {
        sync_io.acquire(class);
        Self { sync_io, class }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sync_io.release(self.class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn single_class_round_trips() {
        let sio = SyncIO::new(None, 2, 1);
        let p1 = Permit::acquire(&sio, Class::Reader);
        let p2 = Permit::acquire(&sio, Class::Reader);
        drop(p1);
        drop(p2);
        // A third acquire must not deadlock now that both were released.
        let _p3 = Permit::acquire(&sio, Class::Reader);
    }

    #[test]
    fn total_cap_bounds_combined_readers_and_writers() {
        let sio = Arc::new(SyncIO::new(Some(1), 4, 4));
        let _reader = Permit::acquire(&sio, Class::Reader);

        let sio2 = Arc::clone(&sio);
        let handle = thread::spawn(move || {
            // Should block until the reader permit above is released,
            // since TOTAL capacity is 1.
            let _writer = Permit::acquire(&sio2, Class::Writer);
        });

        thread::sleep(std::time::Duration::from_millis(20));
        drop(_reader);
        handle.join().unwrap();
    }

    #[test]
    fn waiters_wake_on_release_without_losing_permits() {
        let sio = Arc::new(SyncIO::new(None, 1, 1));
        let guard = Permit::acquire(&sio, Class::Writer);

        let sio2 = Arc::clone(&sio);
        let handle = thread::spawn(move || {
            let _p = Permit::acquire(&sio2, Class::Writer);
        });

        thread::sleep(std::time::Duration::from_millis(20));
        drop(guard);
        handle.join().unwrap();
    }
}
