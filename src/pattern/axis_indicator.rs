//! Axis indicator pattern
//!
//! Marks the +-X/+-Y/+-Z directions on the sphere (negative poles dimmed),
//! with an optional faint lat/lon grid and an optional slow rotation around
//! the vertical axis. Used for calibration and orientation debugging.

use core::f32::consts::TAU;

use super::{Pattern, PatternParams};
use crate::color::{Rgb, rgb_from_u32, scale_color_f};
use crate::fastmath::{fast_asin, fast_atan2};
use crate::layout::{LayoutSource, lat_lon_to_uv};
use crate::sphere::LedSphereManager;

/// Alignment window for marker selection, degrees from the best LED.
const MARKER_THRESHOLD_DEG: f32 = 10.0;

/// Marker cap per direction.
const MARKERS_PER_AXIS: usize = 6;

/// UV radius of the fallback markers when no layout is loaded.
const FALLBACK_MARKER_RADIUS: f32 = 0.02;

/// Grid line intensity relative to the axis markers.
const GRID_INTENSITY: f32 = 0.15;

/// XYZ axis indicators with optional grid and rotation
#[derive(Debug, Clone)]
pub struct AxisIndicatorPattern {
    show_grid: bool,
    rotate: bool,
    rotation_speed: f32,
}

impl Default for AxisIndicatorPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisIndicatorPattern {
    pub const fn new() -> Self {
        Self {
            show_grid: true,
            rotate: false,
            rotation_speed: 0.5,
        }
    }

    #[must_use]
    pub const fn with_grid(mut self, show: bool) -> Self {
        self.show_grid = show;
        self
    }

    #[must_use]
    pub const fn with_rotation(mut self, rotate: bool, speed: f32) -> Self {
        self.rotate = rotate;
        self.rotation_speed = speed;
        self
    }

    fn draw_marker(
        sphere: &mut LedSphereManager,
        direction: [f32; 3],
        color: Rgb,
    ) {
        let ids = if let LayoutSource::Loaded(layout) = sphere.layout() {
            Some(layout.axis_leds(direction, MARKER_THRESHOLD_DEG, MARKERS_PER_AXIS))
        } else {
            None
        };
        match ids {
            Some(ids) => {
                for id in ids {
                    sphere.set_pixel(id, color);
                }
            }
            None => {
                let latitude = fast_asin(direction[1]).to_degrees();
                let longitude = fast_atan2(direction[0], direction[2]).to_degrees();
                let (u, v) = lat_lon_to_uv(latitude, longitude);
                sphere.set_pixel_by_uv(u, v, color, FALLBACK_MARKER_RADIUS);
            }
        }
    }
}

impl Pattern for AxisIndicatorPattern {
    fn render(&mut self, sphere: &mut LedSphereManager, params: &PatternParams) {
        if self.show_grid {
            let grid_color =
                scale_color_f(rgb_from_u32(0xffffff), GRID_INTENSITY * params.brightness);
            let mut latitude = -60.0;
            while latitude <= 60.0 {
                sphere.draw_latitude_line(latitude, grid_color, 1);
                latitude += 30.0;
            }
            let mut longitude = 0.0;
            while longitude < 360.0 {
                sphere.draw_longitude_line(longitude, grid_color, 1);
                longitude += 45.0;
            }
        }

        let angle = if self.rotate {
            params.progress * self.rotation_speed * params.speed * TAU
        } else {
            0.0
        };
        let (sin, cos) = (libm::sinf(angle), libm::cosf(angle));

        let axes: [([f32; 3], Rgb); 3] = [
            ([cos, 0.0, -sin], rgb_from_u32(0xff_0000)),
            ([0.0, 1.0, 0.0], rgb_from_u32(0x00_ff00)),
            ([sin, 0.0, cos], rgb_from_u32(0x0000_ff)),
        ];

        for (direction, color) in axes {
            let positive = scale_color_f(color, params.brightness);
            let negative = scale_color_f(color, params.brightness * 0.5);
            Self::draw_marker(sphere, direction, positive);
            Self::draw_marker(
                sphere,
                [-direction[0], -direction[1], -direction[2]],
                negative,
            );
        }
    }

    fn name(&self) -> &'static str {
        "Axis Indicator"
    }

    fn description(&self) -> &'static str {
        "XYZ axis markers with optional grid and rotation"
    }

    fn duration(&self) -> f32 {
        8.0
    }
}
