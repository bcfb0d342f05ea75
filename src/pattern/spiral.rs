//! Spiral trajectory pattern
//!
//! A bright head climbs a spiral path from the south pole to the north pole,
//! dragging a fading trail behind it. Turn count and trail length are the
//! pattern's tunables.

use super::{Pattern, PatternParams};
use crate::color::{rgb_from_u32, scale_color_f};
use crate::layout::lat_lon_to_uv;
use crate::sphere::LedSphereManager;

/// UV radius lit around each trail sample.
const SAMPLE_RADIUS: f32 = 0.02;

/// Progress spacing between two trail samples.
const TRAIL_SPACING: f32 = 0.01;

/// Spiral path from south to north pole with a fading trail
#[derive(Debug, Clone)]
pub struct SpiralTrajectoryPattern {
    spiral_turns: f32,
    trail_length: usize,
}

impl Default for SpiralTrajectoryPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiralTrajectoryPattern {
    pub const fn new() -> Self {
        Self {
            spiral_turns: 3.0,
            trail_length: 20,
        }
    }

    #[must_use]
    pub const fn with_turns(mut self, turns: f32) -> Self {
        self.spiral_turns = turns;
        self
    }

    #[must_use]
    pub const fn with_trail_length(mut self, length: usize) -> Self {
        self.trail_length = length;
        self
    }

    /// Spiral position at a given progress: south pole up to north pole
    /// while winding `spiral_turns` times around the axis.
    fn position_at(&self, progress: f32) -> (f32, f32) {
        let latitude = -90.0 + 180.0 * progress;
        let longitude = (progress * self.spiral_turns * 360.0).rem_euclid(360.0) - 180.0;
        (latitude, longitude)
    }
}

impl Pattern for SpiralTrajectoryPattern {
    #[allow(clippy::cast_precision_loss)]
    fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams) {
        let head = (params.progress * params.speed).clamp(0.0, 1.0);
        let color = rgb_from_u32(0x00_c8ff);

        for sample in 0..=self.trail_length {
            let at = head - sample as f32 * TRAIL_SPACING;
            if at < 0.0 {
                break;
            }

            // Head at full intensity, trail fading linearly behind it.
            let fade = 1.0 - sample as f32 / (self.trail_length + 1) as f32;
            let (latitude, longitude) = self.position_at(at);
            let (u, v) = lat_lon_to_uv(latitude, longitude);
            sphere.set_pixel_by_uv(u, v, scale_color_f(color, params.brightness * fade), SAMPLE_RADIUS);
        }
    }

    fn name(&self) -> &'static str {
        "Spiral Trajectory"
    }

    fn description(&self) -> &'static str {
        "Spiral path from south to north pole"
    }

    fn duration(&self) -> f32 {
        4.0
    }
}
