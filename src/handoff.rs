//! Single-slot handoff cell for moving the sphere manager across the
//! overlay thread boundary.
//!
//! The manager enters the slot before the render thread spawns and returns
//! through it when the loop exits, so a failed spawn loses nothing and the
//! owner can always retrieve it. Synchronization uses critical sections,
//! matching the progress cell.

use core::cell::RefCell;
use std::thread;
use std::time::Duration as StdDuration;

use critical_section::Mutex;
use embassy_time::{Duration, Instant};

/// A thread-safe cell holding at most one value.
pub struct Handoff<T> {
    slot: Mutex<RefCell<Option<T>>>,
}

impl<T> Handoff<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Place a value into the slot.
    ///
    /// Returns `Err(value)` if the slot is already occupied.
    pub fn put(&self, value: T) -> Result<(), T> {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow(cs).borrow_mut();
            if slot.is_some() {
                Err(value)
            } else {
                *slot = Some(value);
                Ok(())
            }
        })
    }

    /// Take the value out of the slot, if any.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow(cs).borrow_mut().take())
    }

    /// Poll the slot until a value arrives or the timeout expires.
    ///
    /// Blocks the calling thread in `poll_interval` steps; used for the
    /// bounded wait during overlay teardown.
    pub fn take_within(&self, timeout: Duration, poll_interval: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.take() {
                return Some(value);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(StdDuration::from_millis(poll_interval.as_millis().max(1)));
        }
    }
}

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}
