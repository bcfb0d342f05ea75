//! Shared boot progress: the only mutable state crossing the overlay
//! thread boundary.
//!
//! A single scalar in [0, 1] plus a one-shot stop flag, guarded by a
//! critical-section mutex. The heavy task writes through a thread-safe
//! callback; the render loop reads once per frame. The value is effectively
//! monotonic in steady state, so no queue is needed.

use core::cell::Cell;

use critical_section::Mutex;

/// One coherent read of the shared progress state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Heavy-task progress, clamped to [0, 1].
    pub progress: f32,
    /// One-shot cooperative cancellation flag.
    pub stop_requested: bool,
}

/// Mutex-guarded progress cell shared between execution contexts.
pub struct SharedProgress {
    inner: Mutex<Cell<ProgressSnapshot>>,
}

impl Default for SharedProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedProgress {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(ProgressSnapshot {
                progress: 0.0,
                stop_requested: false,
            })),
        }
    }

    /// Record new progress, clamped to [0, 1]. Safe from any thread.
    pub fn update(&self, progress: f32) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut state = cell.get();
            state.progress = progress.clamp(0.0, 1.0);
            cell.set(state);
        });
    }

    /// Raise the one-shot stop flag.
    pub fn request_stop(&self) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut state = cell.get();
            state.stop_requested = true;
            cell.set(state);
        });
    }

    /// Read both fields coherently.
    pub fn snapshot(&self) -> ProgressSnapshot {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    /// Reset to zero progress with the stop flag cleared.
    pub fn reset(&self) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).set(ProgressSnapshot::default());
        });
    }
}
