//! Longitude wave pattern
//!
//! Phase-shifted color waves flowing along twelve meridians, colored by a
//! rainbow gradient that drifts with the overall progress.

use core::f32::consts::{PI, TAU};

use super::{Pattern, PatternParams};
use crate::color::{Hsv, hsv2rgb, scale_color_f};
use crate::sphere::LedSphereManager;

/// Meridians drawn per frame (30 degree spacing).
const MERIDIAN_COUNT: u32 = 12;

/// Color waves flowing along longitude lines
#[derive(Debug, Clone)]
pub struct LongitudeWavePattern {
    wave_speed: f32,
}

impl Default for LongitudeWavePattern {
    fn default() -> Self {
        Self::new()
    }
}

impl LongitudeWavePattern {
    pub const fn new() -> Self {
        Self { wave_speed: 2.0 }
    }

    #[must_use]
    pub const fn with_wave_speed(mut self, speed: f32) -> Self {
        self.wave_speed = speed;
        self
    }
}

impl Pattern for LongitudeWavePattern {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams) {
        let wave_speed = self.wave_speed * params.speed;

        for i in 0..MERIDIAN_COUNT {
            let longitude = i as f32 * (360.0 / MERIDIAN_COUNT as f32);

            // Phase difference by meridian gives the traveling-wave look.
            let phase_shift = (longitude / 360.0) * TAU;
            let wave_phase = params.progress * wave_speed * TAU + phase_shift;
            let wave_intensity = (libm::sinf(wave_phase) + 1.0) / 2.0;

            let hue = (params.progress * 2.0 + longitude / 360.0).rem_euclid(1.0);
            let color = hsv2rgb(Hsv {
                hue: (hue * 255.0) as u8,
                sat: 255,
                val: 255,
            });

            let mut intensity = params.brightness * wave_intensity;
            if params.flicker {
                intensity *= 0.8 + 0.2 * libm::sinf(params.time * 6.0 * PI + phase_shift);
            }

            sphere.draw_longitude_line(longitude, scale_color_f(color, intensity), 1);
        }
    }

    fn name(&self) -> &'static str {
        "Longitude Wave"
    }

    fn description(&self) -> &'static str {
        "Color waves flowing along longitude lines"
    }
}
