//! Ring descent pattern
//!
//! Colored latitude rings sweep from the north pole to the south pole, each
//! ring delayed against the previous one, with an optional flicker wobble
//! and a fade-out below a configurable latitude.

use core::f32::consts::PI;

use super::{Pattern, PatternParams};
use crate::color::{Rgb, rgb_from_u32, scale_color_f};
use crate::fastmath::smoothstep;
use crate::sphere::LedSphereManager;

/// Latitude below which the rings start fading out.
const DEFAULT_FADE_START_LATITUDE: f32 = -25.0;

/// Amplitude of the flicker offset on the ring progress.
const FLICKER_PROGRESS_AMPLITUDE: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
struct Ring {
    color: Rgb,
    delay_offset: f32,
    flicker_phase: f32,
}

/// Latitude rings descending from north to south pole
#[derive(Debug, Clone)]
pub struct RingDescentPattern {
    rings: Vec<Ring>,
    fade_start_latitude: f32,
    speed: f32,
    brightness: f32,
}

impl Default for RingDescentPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl RingDescentPattern {
    pub fn new() -> Self {
        // Red, green and blue rings chasing each other pole to pole.
        let rings = vec![
            Ring {
                color: rgb_from_u32(0xff_0000),
                delay_offset: 0.0,
                flicker_phase: 0.0,
            },
            Ring {
                color: rgb_from_u32(0x00_ff00),
                delay_offset: 0.15,
                flicker_phase: PI / 3.0,
            },
            Ring {
                color: rgb_from_u32(0x0000_ff),
                delay_offset: 0.35,
                flicker_phase: 2.0 * PI / 3.0,
            },
        ];
        Self {
            rings,
            fade_start_latitude: DEFAULT_FADE_START_LATITUDE,
            speed: 1.0,
            brightness: 1.0,
        }
    }

    /// Replace the ring table with custom colors and delays.
    ///
    /// Colors and delays are paired positionally; extra entries on either
    /// side are ignored.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_rings(&mut self, colors: &[Rgb], delays: &[f32]) {
        self.rings = colors
            .iter()
            .zip(delays)
            .enumerate()
            .map(|(i, (&color, &delay_offset))| Ring {
                color,
                delay_offset,
                flicker_phase: i as f32 * PI / 3.0,
            })
            .collect();
    }

    #[must_use]
    pub fn with_fade_start_latitude(mut self, latitude_deg: f32) -> Self {
        self.fade_start_latitude = latitude_deg;
        self
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub const fn with_brightness(mut self, brightness: f32) -> Self {
        self.brightness = brightness;
        self
    }
}

impl Pattern for RingDescentPattern {
    fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams) {
        for ring in &self.rings {
            let flicker_offset = if params.flicker {
                FLICKER_PROGRESS_AMPLITUDE * libm::sinf(params.time * 6.0 * PI + ring.flicker_phase)
            } else {
                0.0
            };
            let ring_progress = params.progress - ring.delay_offset + flicker_offset;
            if ring_progress <= 0.0 || ring_progress > 1.0 {
                continue;
            }

            // North pole (+90) to south pole (-90), eased for a falling feel.
            let latitude = 90.0 - smoothstep(ring_progress) * 180.0 * self.speed * params.speed;

            let fade_start_progress = (90.0 - self.fade_start_latitude) / 180.0;
            let mut intensity = self.brightness * params.brightness;
            if ring_progress > fade_start_progress {
                let fade = (ring_progress - fade_start_progress) / (1.0 - fade_start_progress);
                intensity *= 1.0 - fade;
            }
            if params.flicker {
                intensity *= 0.8 + 0.2 * libm::sinf(params.time * 8.0 * PI + ring.flicker_phase);
            }

            let color = scale_color_f(ring.color, intensity);
            sphere.draw_latitude_line(latitude, color, params.line_width);
        }
    }

    fn name(&self) -> &'static str {
        "Ring Descent"
    }

    fn description(&self) -> &'static str {
        "Colored rings descending from north to south pole"
    }

    fn duration(&self) -> f32 {
        3.5
    }
}
