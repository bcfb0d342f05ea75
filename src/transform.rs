//! Orientation-driven mapping from sphere-local 3D points to UV coordinates.
//!
//! The transform applies the live orientation quaternion plus the user
//! calibration offset, then projects onto the normalized [0,1]x[0,1] sphere
//! parametrization. A dirty flag tracks whether the orientation changed
//! beyond an epsilon since the last frame, so callers can skip re-deriving
//! UV for every point when nothing moved - the dominant per-frame cost.

use core::f32::consts::{PI, TAU};

use crate::fastmath::{fast_atan2, fast_sqrt};
use crate::layout::LedPosition;

/// Minimum change in any quaternion component that marks the transform dirty.
const ORIENTATION_EPSILON: f32 = 0.001;

/// Minimum change in a calibration offset (degrees) that marks the transform dirty.
const OFFSET_EPSILON: f32 = 0.1;

/// Quaternions with a squared norm below this are treated as identity.
const MIN_NORM_SQ: f32 = 1e-6;

/// Unit rotation quaternion (w, x, y, z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    fn norm_sq(self) -> f32 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Rotate a vector by this quaternion.
    ///
    /// Uses the expanded form v' = v + 2 * q_v x (q_v x v + w * v),
    /// equivalent to q * v * q^-1 for unit quaternions.
    fn rotate(self, v: (f32, f32, f32)) -> (f32, f32, f32) {
        let (vx, vy, vz) = v;

        let c1 = cross((self.x, self.y, self.z), (vx, vy, vz));
        let t = (c1.0 + self.w * vx, c1.1 + self.w * vy, c1.2 + self.w * vz);
        let c2 = cross((self.x, self.y, self.z), t);

        (vx + 2.0 * c2.0, vy + 2.0 * c2.1, vz + 2.0 * c2.2)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn cross(a: (f32, f32, f32), b: (f32, f32, f32)) -> (f32, f32, f32) {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

/// Maps sphere-local 3D positions to UV under the current orientation.
#[derive(Debug, Clone)]
pub struct SphereCoordinateTransform {
    orientation: Quaternion,
    latitude_offset: f32,
    longitude_offset: f32,
    dirty: bool,
}

impl SphereCoordinateTransform {
    pub const fn new() -> Self {
        Self {
            orientation: Quaternion::IDENTITY,
            latitude_offset: 0.0,
            longitude_offset: 0.0,
            dirty: true,
        }
    }

    /// Update the orientation quaternion.
    ///
    /// Marks the transform dirty only when a component moved by more than
    /// the epsilon, so a noisy-but-still source does not force recomputes.
    pub fn set_orientation(&mut self, q: Quaternion) {
        let changed = (q.w - self.orientation.w).abs() > ORIENTATION_EPSILON
            || (q.x - self.orientation.x).abs() > ORIENTATION_EPSILON
            || (q.y - self.orientation.y).abs() > ORIENTATION_EPSILON
            || (q.z - self.orientation.z).abs() > ORIENTATION_EPSILON;
        self.orientation = q;
        if changed {
            self.dirty = true;
        }
    }

    /// Update the calibration offset in degrees.
    pub fn set_offset(&mut self, latitude_deg: f32, longitude_deg: f32) {
        let changed = (latitude_deg - self.latitude_offset).abs() > OFFSET_EPSILON
            || (longitude_deg - self.longitude_offset).abs() > OFFSET_EPSILON;
        self.latitude_offset = latitude_deg;
        self.longitude_offset = longitude_deg;
        if changed {
            self.dirty = true;
        }
    }

    pub const fn orientation(&self) -> Quaternion {
        self.orientation
    }

    pub const fn offset(&self) -> (f32, f32) {
        (self.latitude_offset, self.longitude_offset)
    }

    /// True when the orientation changed since the last [`clear_dirty`].
    ///
    /// [`clear_dirty`]: Self::clear_dirty
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Transform a sphere-local point to UV coordinates.
    ///
    /// u is the normalized polar angle (XZ-plane length vs. Y), v the
    /// normalized azimuth (X vs. Z). Both wrap into [0, 1).
    pub fn transform(&self, x: f32, y: f32, z: f32) -> (f32, f32) {
        let q = if self.orientation.norm_sq() < MIN_NORM_SQ {
            Quaternion::IDENTITY
        } else {
            self.orientation
        };
        let (rx, ry, rz) = q.rotate((x, y, z));

        let planar = fast_sqrt(rx * rx + rz * rz);
        let u = (fast_atan2(planar, ry) + PI) / TAU + self.latitude_offset / 360.0;
        let v = (fast_atan2(rx, rz) + PI) / TAU + self.longitude_offset / 360.0;

        (u.rem_euclid(1.0), v.rem_euclid(1.0))
    }
}

impl Default for SphereCoordinateTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-LED UV coordinates, refreshed only when the orientation moved.
///
/// Re-deriving UV for every point every frame is the dominant per-frame
/// cost; the dirty flag on the transform lets a full-sphere refresh happen
/// only on actual orientation changes.
#[derive(Debug, Clone, Default)]
pub struct UvCache {
    uv: Vec<(f32, f32)>,
}

impl UvCache {
    pub const fn new() -> Self {
        Self { uv: Vec::new() }
    }

    /// Recompute all UVs if the transform is dirty or the point set changed.
    ///
    /// Clears the dirty flag and returns whether a recompute happened.
    pub fn refresh(
        &mut self,
        transform: &mut SphereCoordinateTransform,
        positions: &[LedPosition],
    ) -> bool {
        if !transform.is_dirty() && self.uv.len() == positions.len() {
            return false;
        }
        self.uv.clear();
        self.uv.extend(
            positions
                .iter()
                .map(|led| transform.transform(led.x, led.y, led.z)),
        );
        transform.clear_dirty();
        true
    }

    pub fn get(&self, id: u16) -> Option<(f32, f32)> {
        self.uv.get(usize::from(id)).copied()
    }

    pub fn as_slice(&self) -> &[(f32, f32)] {
        &self.uv
    }

    pub fn len(&self) -> usize {
        self.uv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uv.is_empty()
    }
}
