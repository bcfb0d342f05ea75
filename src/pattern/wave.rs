//! Spherical wave pattern
//!
//! Concentric waves radiate from the north pole towards the south pole.
//! The wave count tunable sets how many crests are visible at once.

use core::f32::consts::TAU;

use super::{Pattern, PatternParams};
use crate::color::{blend_colors, rgb_from_u32, scale_color_f};
use crate::sphere::LedSphereManager;

/// Latitude step between sampled rings, degrees.
const RING_STEP_DEG: f32 = 10.0;

/// Concentric waves over the sphere surface
#[derive(Debug, Clone)]
pub struct SphericalWavePattern {
    wave_count: u32,
}

impl Default for SphericalWavePattern {
    fn default() -> Self {
        Self::new()
    }
}

impl SphericalWavePattern {
    pub const fn new() -> Self {
        Self { wave_count: 3 }
    }

    #[must_use]
    pub const fn with_wave_count(mut self, count: u32) -> Self {
        self.wave_count = if count == 0 { 1 } else { count };
        self
    }
}

impl Pattern for SphericalWavePattern {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams) {
        let trough = rgb_from_u32(0x00_1450);
        let crest = rgb_from_u32(0x64_c8ff);

        let mut latitude = -80.0;
        while latitude <= 80.0 {
            // Distance from the north pole drives the radial phase.
            let radial = (90.0 - latitude) / 180.0;
            let phase =
                radial * self.wave_count as f32 * TAU - params.time * params.speed * TAU;
            let intensity = (libm::sinf(phase) + 1.0) / 2.0;

            let color = blend_colors(trough, crest, (intensity * 255.0) as u8);
            sphere.draw_latitude_line(
                latitude,
                scale_color_f(color, params.brightness),
                params.line_width.max(1),
            );
            latitude += RING_STEP_DEG;
        }
    }

    fn name(&self) -> &'static str {
        "Spherical Wave"
    }

    fn description(&self) -> &'static str {
        "Concentric waves on the sphere surface"
    }
}
