//! Physical LED layout: table loading, derived spherical coordinates and
//! the fixed-resolution spatial grid behind all geometry queries.
//!
//! The layout table is a row-oriented CSV (`id,strip,index,x,y,z`) read once
//! at startup. A missing or malformed table never fails the system - the
//! caller falls back to [`LayoutSource::Approximate`] and every drawing
//! primitive degrades to index-proportional addressing.

use std::path::Path;

use log::{debug, warn};

use crate::fastmath::fast_sqrt;

/// Grid resolution per axis of the spatial index.
pub const SPATIAL_GRID_SIZE: usize = 32;

/// Tolerated deviation of a loaded point from the unit sphere before a warning.
const RADIUS_SANITY_EPSILON: f32 = 0.05;

/// One physical light-emitting point.
#[derive(Debug, Clone, Copy)]
pub struct LedPosition {
    pub id: u16,
    pub strip: u8,
    pub index_in_strip: u16,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Derived latitude in degrees, cached at load time.
    pub latitude: f32,
    /// Derived longitude in degrees, cached at load time.
    pub longitude: f32,
}

/// Convert degrees latitude/longitude to the sphere UV parametrization.
///
/// Shares its convention with [`SphereCoordinateTransform::transform`]:
/// u is the normalized polar angle, v the normalized azimuth.
///
/// [`SphereCoordinateTransform::transform`]: crate::transform::SphereCoordinateTransform::transform
pub fn lat_lon_to_uv(latitude_deg: f32, longitude_deg: f32) -> (f32, f32) {
    let u = (270.0 - latitude_deg) / 360.0;
    let v = (longitude_deg + 180.0) / 360.0;
    (u, v)
}

/// Inverse of [`lat_lon_to_uv`].
pub fn uv_to_lat_lon(u: f32, v: f32) -> (f32, f32) {
    let latitude = (270.0 - u * 360.0).clamp(-90.0, 90.0);
    let longitude = v * 360.0 - 180.0;
    (latitude, longitude)
}

/// Distance between two UV points with the longitude seam wrapped at 0/1.
pub fn wrapped_uv_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let du = (a.0 - b.0).abs();
    let mut dv = (a.1 - b.1).abs();
    if dv > 0.5 {
        dv = 1.0 - dv;
    }
    fast_sqrt(du * du + dv * dv)
}

/// Signed angular difference in degrees, wrapped into [-180, 180).
fn angle_diff_deg(a: f32, b: f32) -> f32 {
    (a - b + 540.0).rem_euclid(360.0) - 180.0
}

/// Loaded LED layout with its spatial grid index.
///
/// Immutable after construction; positions are indexed by LED id.
#[derive(Debug, Clone)]
pub struct LedLayout {
    leds: Vec<LedPosition>,
    grid: Vec<Vec<u16>>,
    lat_range: (f32, f32),
    lon_range: (f32, f32),
}

impl LedLayout {
    /// Load a layout table from a file.
    ///
    /// Returns `None` when the file is absent or malformed - never panics.
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_csv(&text),
            Err(err) => {
                warn!("layout table {} not readable: {err}", path.display());
                None
            }
        }
    }

    /// Parse a layout table from CSV text (`id,strip,index,x,y,z` rows).
    ///
    /// A header row is tolerated. Any malformed row, duplicate id or gap in
    /// the 0..N-1 id range rejects the whole table.
    pub fn from_csv(text: &str) -> Option<Self> {
        let mut rows: Vec<LedPosition> = Vec::new();
        let mut first_content_line = true;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Header row: first content line whose id field is not numeric.
            let is_header = first_content_line
                && line
                    .split(',')
                    .next()
                    .is_some_and(|field| field.trim().parse::<u16>().is_err());
            first_content_line = false;
            if is_header {
                continue;
            }

            match parse_row(line) {
                Some(led) => rows.push(led),
                None => {
                    warn!("layout table rejected: malformed row {}: {line}", line_no + 1);
                    return None;
                }
            }
        }

        if rows.is_empty() {
            warn!("layout table rejected: no rows");
            return None;
        }

        // Ids must form the dense range 0..N-1.
        let count = rows.len();
        let mut seen = vec![false; count];
        for led in &rows {
            let id = usize::from(led.id);
            if id >= count || seen[id] {
                warn!("layout table rejected: id {} out of range or duplicated", led.id);
                return None;
            }
            seen[id] = true;
        }
        rows.sort_unstable_by_key(|led| led.id);

        let mut layout = Self {
            leds: rows,
            grid: vec![Vec::new(); SPATIAL_GRID_SIZE * SPATIAL_GRID_SIZE],
            lat_range: (0.0, 0.0),
            lon_range: (0.0, 0.0),
        };
        layout.build_grid();
        debug!("layout loaded: {count} LEDs");
        Some(layout)
    }

    fn build_grid(&mut self) {
        let mut lat_range = (f32::MAX, f32::MIN);
        let mut lon_range = (f32::MAX, f32::MIN);
        for led in &self.leds {
            lat_range.0 = lat_range.0.min(led.latitude);
            lat_range.1 = lat_range.1.max(led.latitude);
            lon_range.0 = lon_range.0.min(led.longitude);
            lon_range.1 = lon_range.1.max(led.longitude);
        }
        self.lat_range = lat_range;
        self.lon_range = lon_range;

        for i in 0..self.leds.len() {
            let (row, col) = self.bucket_of(self.leds[i].latitude, self.leds[i].longitude);
            #[allow(clippy::cast_possible_truncation)]
            self.grid[row * SPATIAL_GRID_SIZE + col].push(i as u16);
        }
    }

    /// Bucket coordinates for a lat/lon pair.
    ///
    /// The same normalization serves index construction and every query.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn bucket_of(&self, latitude: f32, longitude: f32) -> (usize, usize) {
        let last = (SPATIAL_GRID_SIZE - 1) as f32;
        let lat_span = self.lat_range.1 - self.lat_range.0;
        let lon_span = self.lon_range.1 - self.lon_range.0;

        let row = if lat_span > 0.0 {
            ((latitude - self.lat_range.0) / lat_span * last).clamp(0.0, last) as usize
        } else {
            0
        };
        let col = if lon_span > 0.0 {
            ((longitude - self.lon_range.0) / lon_span * last).clamp(0.0, last) as usize
        } else {
            0
        };
        (row, col)
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }

    pub fn get(&self, id: u16) -> Option<&LedPosition> {
        self.leds.get(usize::from(id))
    }

    pub fn positions(&self) -> &[LedPosition] {
        &self.leds
    }

    /// Nearest LED to a UV point, or `None` when the neighborhood is empty.
    ///
    /// Searches the target bucket plus its 8 neighbors and minimizes the
    /// wrapped UV distance.
    pub fn find_closest(&self, u: f32, v: f32) -> Option<u16> {
        let (latitude, longitude) = uv_to_lat_lon(u, v);
        let (row, col) = self.bucket_of(latitude, longitude);

        let mut best: Option<(u16, f32)> = None;
        for dr in -1i32..=1 {
            for dc in -1i32..=1 {
                let Some(bucket) = self.neighbor_bucket(row, col, dr, dc) else {
                    continue;
                };
                for &idx in bucket {
                    let led = &self.leds[usize::from(idx)];
                    let led_uv = lat_lon_to_uv(led.latitude, led.longitude);
                    let distance = wrapped_uv_distance((u, v), led_uv);
                    if best.is_none_or(|(_, d)| distance < d) {
                        best = Some((led.id, distance));
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }

    fn neighbor_bucket(&self, row: usize, col: usize, dr: i32, dc: i32) -> Option<&Vec<u16>> {
        let r = row.checked_add_signed(dr as isize)?;
        let c = col.checked_add_signed(dc as isize)?;
        if r >= SPATIAL_GRID_SIZE || c >= SPATIAL_GRID_SIZE {
            return None;
        }
        Some(&self.grid[r * SPATIAL_GRID_SIZE + c])
    }

    /// All LEDs within `radius` (UV units) of a UV point.
    pub fn find_in_radius(&self, u: f32, v: f32, radius: f32) -> Vec<u16> {
        if self.leds.is_empty() || radius <= 0.0 {
            return Vec::new();
        }

        let (latitude, longitude) = uv_to_lat_lon(u, v);
        let extent_deg = radius * 360.0;
        let (row_min, col_min) =
            self.bucket_of(latitude - extent_deg, longitude - extent_deg);
        let (row_max, col_max) =
            self.bucket_of(latitude + extent_deg, longitude + extent_deg);

        let mut result = Vec::new();
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                for &idx in &self.grid[row * SPATIAL_GRID_SIZE + col] {
                    let led = &self.leds[usize::from(idx)];
                    let led_uv = lat_lon_to_uv(led.latitude, led.longitude);
                    if wrapped_uv_distance((u, v), led_uv) <= radius {
                        result.push(led.id);
                    }
                }
            }
        }
        result
    }

    /// LEDs whose cached latitude lies within `tolerance_deg` of the target,
    /// ordered by longitude.
    pub fn latitude_band(&self, latitude_deg: f32, tolerance_deg: f32) -> Vec<u16> {
        if self.leds.is_empty() {
            return Vec::new();
        }

        let (row_min, _) = self.bucket_of(latitude_deg - tolerance_deg, self.lon_range.0);
        let (row_max, _) = self.bucket_of(latitude_deg + tolerance_deg, self.lon_range.0);

        let mut result: Vec<u16> = Vec::new();
        for row in row_min..=row_max {
            for col in 0..SPATIAL_GRID_SIZE {
                for &idx in &self.grid[row * SPATIAL_GRID_SIZE + col] {
                    let led = &self.leds[usize::from(idx)];
                    if (led.latitude - latitude_deg).abs() <= tolerance_deg {
                        result.push(led.id);
                    }
                }
            }
        }
        result.sort_by(|&a, &b| {
            let la = self.leds[usize::from(a)].longitude;
            let lb = self.leds[usize::from(b)].longitude;
            la.total_cmp(&lb)
        });
        result
    }

    /// LEDs whose cached longitude lies within `tolerance_deg` of the target
    /// (wrapped at +-180), ordered by latitude.
    pub fn longitude_band(&self, longitude_deg: f32, tolerance_deg: f32) -> Vec<u16> {
        if self.leds.is_empty() {
            return Vec::new();
        }

        let target = angle_diff_deg(longitude_deg, 0.0);
        // Near the seam the bucket range is meaningless; scan every column.
        let wraps = target - tolerance_deg < self.lon_range.0
            || target + tolerance_deg > self.lon_range.1;
        let (col_min, col_max) = if wraps {
            (0, SPATIAL_GRID_SIZE - 1)
        } else {
            let (_, lo) = self.bucket_of(self.lat_range.0, target - tolerance_deg);
            let (_, hi) = self.bucket_of(self.lat_range.0, target + tolerance_deg);
            (lo, hi)
        };

        let mut result: Vec<u16> = Vec::new();
        for row in 0..SPATIAL_GRID_SIZE {
            for col in col_min..=col_max {
                for &idx in &self.grid[row * SPATIAL_GRID_SIZE + col] {
                    let led = &self.leds[usize::from(idx)];
                    if angle_diff_deg(led.longitude, target).abs() <= tolerance_deg {
                        result.push(led.id);
                    }
                }
            }
        }
        result.sort_by(|&a, &b| {
            let la = self.leds[usize::from(a)].latitude;
            let lb = self.leds[usize::from(b)].latitude;
            la.total_cmp(&lb)
        });
        result
    }

    /// LEDs best aligned with a direction vector, ranked by dot product.
    ///
    /// Keeps entries within `threshold_deg` of the best alignment, capped at
    /// `max`. Recomputed on demand; nothing is cached.
    pub fn axis_leds(&self, direction: [f32; 3], threshold_deg: f32, max: usize) -> Vec<u16> {
        if self.leds.is_empty() || max == 0 {
            return Vec::new();
        }

        let norm = fast_sqrt(
            direction[0] * direction[0]
                + direction[1] * direction[1]
                + direction[2] * direction[2],
        );
        if norm <= 0.0 {
            return Vec::new();
        }
        let dir = [direction[0] / norm, direction[1] / norm, direction[2] / norm];

        let mut ranked: Vec<(u16, f32)> = self
            .leds
            .iter()
            .map(|led| {
                let dot = (led.x * dir[0] + led.y * dir[1] + led.z * dir[2]).clamp(-1.0, 1.0);
                let angle = libm::acosf(dot).to_degrees();
                (led.id, angle)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = ranked[0].1;
        ranked
            .into_iter()
            .take(max)
            .take_while(|&(_, angle)| angle <= best + threshold_deg)
            .map(|(id, _)| id)
            .collect()
    }
}

fn parse_row(line: &str) -> Option<LedPosition> {
    let mut fields = line.split(',').map(str::trim);

    let id = fields.next()?.parse::<u16>().ok()?;
    let strip = fields.next()?.parse::<u8>().ok()?;
    let index_in_strip = fields.next()?.parse::<u16>().ok()?;
    let x = fields.next()?.parse::<f32>().ok()?;
    let y = fields.next()?.parse::<f32>().ok()?;
    let z = fields.next()?.parse::<f32>().ok()?;
    if fields.next().is_some() {
        return None;
    }

    let radius = libm::sqrtf(x * x + y * y + z * z);
    if radius <= 0.0 {
        return None;
    }
    if (radius - 1.0).abs() > RADIUS_SANITY_EPSILON {
        warn!("LED {id} is {radius:.3} from the origin, expected unit sphere");
    }

    let latitude = libm::asinf((y / radius).clamp(-1.0, 1.0)).to_degrees();
    let longitude = libm::atan2f(x, z).to_degrees();

    Some(LedPosition {
        id,
        strip,
        index_in_strip,
        x,
        y,
        z,
        latitude,
        longitude,
    })
}

/// Geometry source selected once at startup.
///
/// Every draw primitive branches on this tag instead of null-checking:
/// `Loaded` uses real spatial queries, `Approximate` degrades to
/// index-proportional addressing so the device always shows *some* pattern.
#[derive(Debug, Clone)]
pub enum LayoutSource {
    Loaded(LedLayout),
    Approximate { count: usize },
}

impl LayoutSource {
    pub fn led_count(&self) -> usize {
        match self {
            Self::Loaded(layout) => layout.len(),
            Self::Approximate { count } => *count,
        }
    }
}
