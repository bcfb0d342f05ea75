//! Frame pacing with drift correction.
//!
//! The render loops measure their own frame time and sleep the remaining
//! budget; the pacer only does the bookkeeping. If a loop falls more than
//! two frames behind, the backlog is skipped instead of replayed as a
//! catch-up burst.

use embassy_time::{Duration, Instant};

/// Default target frame rate for the sphere render loops (30 FPS).
pub const DEFAULT_FPS: u32 = 30;

/// Liveness hook fed once per render-loop iteration.
///
/// On embedded hosts this maps to the platform watchdog reset; the loop
/// calls it every frame so a longer-than-expected render cannot trip a hang
/// detector.
pub type WatchdogFeed = fn();

/// Tracks frame deadlines for a fixed-rate render loop.
#[derive(Debug, Clone)]
pub struct FramePacer {
    next_frame: Instant,
    frame_duration: Duration,
}

impl FramePacer {
    /// Create a pacer targeting `fps` frames per second.
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            next_frame: Instant::now(),
            frame_duration: Duration::from_millis(u64::from(1000 / fps)),
        }
    }

    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Account for one rendered frame and return how long to sleep.
    ///
    /// The returned duration is zero when the loop is behind schedule.
    pub fn tick(&mut self, now: Instant) -> Duration {
        // Drift correction: if we've fallen too far behind, reset to now.
        // This prevents catch-up bursts after long stalls.
        let max_drift = self.frame_duration.as_millis() * 2;
        if now.as_millis() > self.next_frame.as_millis() + max_drift {
            self.next_frame = now;
        }

        self.next_frame += self.frame_duration;

        if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        }
    }
}
