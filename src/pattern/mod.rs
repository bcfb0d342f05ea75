//! Procedural pattern catalog with compile-time known variants
//!
//! All patterns are stored in an enum to avoid heap allocations and dynamic
//! dispatch. Each pattern implements the [`Pattern`] trait and draws into a
//! [`LedSphereManager`] passed at render time - patterns never own or flush
//! the framebuffer themselves.
//!
//! Rendering is deterministic: identical [`PatternParams`] and tunables
//! always produce identical framebuffer contents.

mod axis_indicator;
mod longitude_wave;
mod ring_descent;
mod spiral;
mod wave;

pub use axis_indicator::AxisIndicatorPattern;
pub use longitude_wave::LongitudeWavePattern;
pub use ring_descent::RingDescentPattern;
pub use spiral::SpiralTrajectoryPattern;
pub use wave::SphericalWavePattern;

use crate::sphere::LedSphereManager;

const PATTERN_NAME_RING_DESCENT: &str = "ring_descent";
const PATTERN_NAME_LONGITUDE_WAVE: &str = "longitude_wave";
const PATTERN_NAME_AXIS_INDICATOR: &str = "axis_indicator";
const PATTERN_NAME_SPIRAL_TRAJECTORY: &str = "spiral_trajectory";
const PATTERN_NAME_SPHERICAL_WAVE: &str = "spherical_wave";

/// Default pattern duration in seconds.
const DEFAULT_DURATION: f32 = 3.0;

/// Per-frame pattern parameters.
///
/// A fresh, stack-lived value every frame; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct PatternParams {
    /// Sequence progress [0.0 - 1.0]
    pub progress: f32,
    /// Elapsed animation time in seconds
    pub time: f32,
    /// Brightness multiplier [0.0 - 1.0]
    pub brightness: f32,
    /// Animation speed multiplier
    pub speed: f32,
    /// Enables the flicker modulation of patterns that support it
    pub flicker: bool,
    /// Line width hint for band-drawing patterns
    pub line_width: u8,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            progress: 0.0,
            time: 0.0,
            brightness: 1.0,
            speed: 1.0,
            flicker: true,
            line_width: 2,
        }
    }
}

pub trait Pattern {
    /// Draw a single frame into the sphere framebuffer.
    ///
    /// The caller clears and flushes; patterns only write pixels.
    fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams);

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Natural duration of one run in seconds.
    fn duration(&self) -> f32 {
        DEFAULT_DURATION
    }
}

/// Known pattern ids that can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternId {
    RingDescent,
    LongitudeWave,
    AxisIndicator,
    SpiralTrajectory,
    SphericalWave,
}

impl PatternId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RingDescent => PATTERN_NAME_RING_DESCENT,
            Self::LongitudeWave => PATTERN_NAME_LONGITUDE_WAVE,
            Self::AxisIndicator => PATTERN_NAME_AXIS_INDICATOR,
            Self::SpiralTrajectory => PATTERN_NAME_SPIRAL_TRAJECTORY,
            Self::SphericalWave => PATTERN_NAME_SPHERICAL_WAVE,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            PATTERN_NAME_RING_DESCENT => Some(Self::RingDescent),
            PATTERN_NAME_LONGITUDE_WAVE => Some(Self::LongitudeWave),
            PATTERN_NAME_AXIS_INDICATOR => Some(Self::AxisIndicator),
            PATTERN_NAME_SPIRAL_TRAJECTORY => Some(Self::SpiralTrajectory),
            PATTERN_NAME_SPHERICAL_WAVE => Some(Self::SphericalWave),
            _ => None,
        }
    }

    pub fn to_slot(self) -> PatternSlot {
        match self {
            Self::RingDescent => PatternSlot::RingDescent(RingDescentPattern::new()),
            Self::LongitudeWave => PatternSlot::LongitudeWave(LongitudeWavePattern::new()),
            Self::AxisIndicator => PatternSlot::AxisIndicator(AxisIndicatorPattern::new()),
            Self::SpiralTrajectory => {
                PatternSlot::SpiralTrajectory(SpiralTrajectoryPattern::new())
            }
            Self::SphericalWave => PatternSlot::SphericalWave(SphericalWavePattern::new()),
        }
    }

    pub const fn all() -> [Self; 5] {
        [
            Self::RingDescent,
            Self::LongitudeWave,
            Self::AxisIndicator,
            Self::SpiralTrajectory,
            Self::SphericalWave,
        ]
    }
}

/// Pattern slot - enum containing all possible patterns
#[derive(Debug, Clone)]
pub enum PatternSlot {
    /// Colored latitude rings sweeping pole to pole
    RingDescent(RingDescentPattern),
    /// Phase-shifted color waves on the meridians
    LongitudeWave(LongitudeWavePattern),
    /// +-X/Y/Z axis markers with optional grid and rotation
    AxisIndicator(AxisIndicatorPattern),
    /// Spiral path from south to north pole with a fading trail
    SpiralTrajectory(SpiralTrajectoryPattern),
    /// Concentric waves over the sphere surface
    SphericalWave(SphericalWavePattern),
}

impl PatternSlot {
    pub fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams) {
        match self {
            Self::RingDescent(pattern) => pattern.render(sphere, params),
            Self::LongitudeWave(pattern) => pattern.render(sphere, params),
            Self::AxisIndicator(pattern) => pattern.render(sphere, params),
            Self::SpiralTrajectory(pattern) => pattern.render(sphere, params),
            Self::SphericalWave(pattern) => pattern.render(sphere, params),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RingDescent(pattern) => pattern.name(),
            Self::LongitudeWave(pattern) => pattern.name(),
            Self::AxisIndicator(pattern) => pattern.name(),
            Self::SpiralTrajectory(pattern) => pattern.name(),
            Self::SphericalWave(pattern) => pattern.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::RingDescent(pattern) => pattern.description(),
            Self::LongitudeWave(pattern) => pattern.description(),
            Self::AxisIndicator(pattern) => pattern.description(),
            Self::SpiralTrajectory(pattern) => pattern.description(),
            Self::SphericalWave(pattern) => pattern.description(),
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            Self::RingDescent(pattern) => pattern.duration(),
            Self::LongitudeWave(pattern) => pattern.duration(),
            Self::AxisIndicator(pattern) => pattern.duration(),
            Self::SpiralTrajectory(pattern) => pattern.duration(),
            Self::SphericalWave(pattern) => pattern.duration(),
        }
    }

    pub fn id(&self) -> PatternId {
        match self {
            Self::RingDescent(_) => PatternId::RingDescent,
            Self::LongitudeWave(_) => PatternId::LongitudeWave,
            Self::AxisIndicator(_) => PatternId::AxisIndicator,
            Self::SpiralTrajectory(_) => PatternId::SpiralTrajectory,
            Self::SphericalWave(_) => PatternId::SphericalWave,
        }
    }
}

/// String-keyed factory: maps a pattern name to a fresh instance.
///
/// Returns `None` for unknown names instead of failing.
pub fn create_pattern(name: &str) -> Option<PatternSlot> {
    PatternId::parse_from_str(name).map(PatternId::to_slot)
}
