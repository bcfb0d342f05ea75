//! Spherical LED rendering engine.
//!
//! Maps a live orientation (quaternion + calibration offset) onto a sphere
//! of physical LEDs, renders procedural patterns into that point set, and
//! runs a synchronized boot overlay on a dedicated thread while a slow
//! storage operation executes concurrently.

pub mod boot;
pub mod color;
pub mod fastmath;
pub mod handoff;
pub mod layout;
pub mod math8;
pub mod overlay;
pub mod pacing;
pub mod pattern;
pub mod progress;
pub mod sequence;
pub mod sphere;
pub mod transform;

pub use boot::{
    BootCallbacks, BootConfig, BootOrchestrator, BootReport, BootServices, BootStage,
    FastBootOrchestrator, StageCallbacks, SynchronizedBoot,
};
pub use color::{Hsv, Rgb};
pub use layout::{LayoutSource, LedLayout, LedPosition};
pub use overlay::{BootOverlay, OverlayConfig, OverlayPattern};
pub use pacing::{FramePacer, WatchdogFeed};
pub use pattern::{Pattern, PatternId, PatternParams, PatternSlot, create_pattern};
pub use progress::{ProgressSnapshot, SharedProgress};
pub use sequence::{OpeningSequence, PhaseCallbacks, SequenceConfig, SequencePhase};
pub use sphere::{LedSphereManager, StripOutput};
pub use transform::{Quaternion, SphereCoordinateTransform, UvCache};

pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The sphere manager drives one driver per physical strip segment.
pub trait OutputDriver {
    /// Write colors to the LED strip
    fn write(&mut self, colors: &[Rgb]);
}
