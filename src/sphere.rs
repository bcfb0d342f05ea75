//! Framebuffer ownership and draw primitives for the physical sphere.
//!
//! [`LedSphereManager`] is the single serialization point to hardware: it
//! owns the pixel framebuffer, maps draw requests through the layout
//! geometry (or its proportional fallback) and flushes to the registered
//! output segments only in [`show`].
//!
//! Failure semantics are a hard real-time requirement: an invalid id or an
//! uninitialized buffer is a logged no-op, never an out-of-bounds access and
//! never a halted frame loop.
//!
//! [`show`]: LedSphereManager::show

use log::{debug, info, warn};

use crate::OutputDriver;
use crate::color::Rgb;
use crate::layout::{LayoutSource, LedLayout, uv_to_lat_lon};

/// Tolerance in degrees contributed by one unit of line width.
const TOLERANCE_DEG_PER_WIDTH: f32 = 2.0;

/// Axis marker colors: +X red, +Y green, +Z blue.
const AXIS_MARKERS: [([f32; 3], Rgb); 3] = [
    ([1.0, 0.0, 0.0], Rgb { r: 255, g: 0, b: 0 }),
    ([0.0, 1.0, 0.0], Rgb { r: 0, g: 255, b: 0 }),
    ([0.0, 0.0, 1.0], Rgb { r: 0, g: 0, b: 255 }),
];

/// One physical output segment: a strip length plus its driver.
pub struct StripOutput {
    pub len: usize,
    pub driver: Box<dyn OutputDriver + Send>,
}

impl StripOutput {
    pub fn new(len: usize, driver: impl OutputDriver + Send + 'static) -> Self {
        Self {
            len,
            driver: Box::new(driver),
        }
    }
}

struct Segment {
    offset: usize,
    len: usize,
    driver: Box<dyn OutputDriver + Send>,
}

/// Owns the framebuffer and every write path to the physical sphere.
pub struct LedSphereManager {
    frame: Vec<Rgb>,
    segments: Vec<Segment>,
    layout: LayoutSource,
}

impl LedSphereManager {
    pub fn new() -> Self {
        Self {
            frame: Vec::new(),
            segments: Vec::new(),
            layout: LayoutSource::Approximate { count: 0 },
        }
    }

    /// Allocate the framebuffer and register the physical output segments.
    ///
    /// The framebuffer is sized to the sum of the strip lengths; each strip
    /// flushes from its offset into the shared buffer. Returns `false` on an
    /// empty configuration or allocation failure - the caller must not
    /// proceed to drawing.
    pub fn initialize_hardware(&mut self, strips: Vec<StripOutput>) -> bool {
        let total: usize = strips.iter().map(|strip| strip.len).sum();
        if total == 0 {
            warn!("hardware init rejected: no LEDs configured");
            return false;
        }

        let mut frame: Vec<Rgb> = Vec::new();
        if frame.try_reserve_exact(total).is_err() {
            warn!("hardware init failed: cannot allocate {total}-pixel framebuffer");
            return false;
        }
        frame.resize(total, Rgb::default());

        let mut segments = Vec::with_capacity(strips.len());
        let mut offset = 0;
        for strip in strips {
            segments.push(Segment {
                offset,
                len: strip.len,
                driver: strip.driver,
            });
            offset += strip.len;
        }

        self.frame = frame;
        self.segments = segments;
        if self.layout.led_count() == 0 {
            self.layout = LayoutSource::Approximate { count: total };
        }
        info!("hardware initialized: {total} LEDs in {} strips", self.segments.len());
        true
    }

    /// Attach a geometry source.
    ///
    /// A loaded layout whose LED count disagrees with the framebuffer is
    /// rejected in favor of the approximate fallback.
    pub fn attach_layout(&mut self, source: LayoutSource) {
        if let LayoutSource::Loaded(layout) = &source {
            if !self.frame.is_empty() && layout.len() != self.frame.len() {
                warn!(
                    "layout has {} LEDs but framebuffer has {}, using approximate geometry",
                    layout.len(),
                    self.frame.len()
                );
                self.layout = LayoutSource::Approximate {
                    count: self.frame.len(),
                };
                return;
            }
        }
        self.layout = source;
    }

    /// Load the layout table from a file, falling back to approximate
    /// geometry when it is absent or malformed.
    pub fn load_layout(&mut self, path: impl AsRef<std::path::Path>) -> bool {
        match LedLayout::load(path) {
            Some(layout) => {
                self.attach_layout(LayoutSource::Loaded(layout));
                matches!(self.layout, LayoutSource::Loaded(_))
            }
            None => {
                warn!("layout unavailable, drawing with approximate geometry");
                self.layout = LayoutSource::Approximate {
                    count: self.frame.len(),
                };
                false
            }
        }
    }

    pub fn layout(&self) -> &LayoutSource {
        &self.layout
    }

    pub fn led_count(&self) -> usize {
        self.frame.len()
    }

    pub fn is_initialized(&self) -> bool {
        !self.frame.is_empty()
    }

    /// Current framebuffer contents.
    pub fn pixels(&self) -> &[Rgb] {
        &self.frame
    }

    /// Set one pixel by LED id. Out-of-range ids are logged no-ops.
    pub fn set_pixel(&mut self, id: u16, color: Rgb) {
        match self.frame.get_mut(usize::from(id)) {
            Some(pixel) => *pixel = color,
            None => debug!("set_pixel ignored: id {id} out of range"),
        }
    }

    /// Set the pixel nearest a UV point plus its radius neighborhood.
    ///
    /// Without a loaded layout this degrades to an index-proportional band.
    pub fn set_pixel_by_uv(&mut self, u: f32, v: f32, color: Rgb, radius: f32) {
        if !self.is_initialized() {
            debug!("set_pixel_by_uv ignored: framebuffer not initialized");
            return;
        }

        let ids = match &self.layout {
            LayoutSource::Loaded(layout) => {
                let mut ids = layout.find_in_radius(u, v, radius);
                if let Some(closest) = layout.find_closest(u, v) {
                    if !ids.contains(&closest) {
                        ids.push(closest);
                    }
                }
                Some(ids)
            }
            LayoutSource::Approximate { .. } => None,
        };

        match ids {
            Some(ids) => self.paint_ids(&ids, color),
            None => {
                let (latitude, _) = uv_to_lat_lon(u, v);
                self.paint_proportional((90.0 - latitude) / 180.0, radius * 2.0, color);
            }
        }
    }

    /// Set every pixel off. Does not flush.
    pub fn clear(&mut self) {
        self.frame.fill(Rgb::default());
    }

    /// Color the LEDs whose cached latitude falls in the width-scaled band.
    ///
    /// Later calls overwrite earlier ones; there is no blending.
    pub fn draw_latitude_line(&mut self, latitude_deg: f32, color: Rgb, width: u8) {
        if !self.is_initialized() {
            debug!("draw_latitude_line ignored: framebuffer not initialized");
            return;
        }
        let tolerance = f32::from(width.max(1)) * TOLERANCE_DEG_PER_WIDTH;

        let ids = match &self.layout {
            LayoutSource::Loaded(layout) => Some(layout.latitude_band(latitude_deg, tolerance)),
            LayoutSource::Approximate { .. } => None,
        };
        match ids {
            Some(ids) => self.paint_ids(&ids, color),
            None => self.paint_proportional(
                (90.0 - latitude_deg.clamp(-90.0, 90.0)) / 180.0,
                tolerance / 180.0,
                color,
            ),
        }
    }

    /// Color the LEDs whose cached longitude falls in the width-scaled band.
    pub fn draw_longitude_line(&mut self, longitude_deg: f32, color: Rgb, width: u8) {
        if !self.is_initialized() {
            debug!("draw_longitude_line ignored: framebuffer not initialized");
            return;
        }
        let tolerance = f32::from(width.max(1)) * TOLERANCE_DEG_PER_WIDTH;

        let ids = match &self.layout {
            LayoutSource::Loaded(layout) => Some(layout.longitude_band(longitude_deg, tolerance)),
            LayoutSource::Approximate { .. } => None,
        };
        match ids {
            Some(ids) => self.paint_ids(&ids, color),
            None => {
                let wrapped = (longitude_deg + 180.0).rem_euclid(360.0);
                self.paint_proportional(wrapped / 360.0, tolerance / 360.0, color);
            }
        }
    }

    /// Mark the three principal axes: +X red, +Y green, +Z blue.
    ///
    /// LEDs are ranked by dot-product alignment per axis; entries within
    /// `threshold_deg` of the best alignment are kept, capped at
    /// `max_per_axis`. Recomputed on demand, never cached.
    pub fn draw_axis_markers(&mut self, threshold_deg: f32, max_per_axis: usize) {
        if !self.is_initialized() {
            debug!("draw_axis_markers ignored: framebuffer not initialized");
            return;
        }

        for (direction, color) in AXIS_MARKERS {
            let ids = match &self.layout {
                LayoutSource::Loaded(layout) => {
                    Some(layout.axis_leds(direction, threshold_deg, max_per_axis))
                }
                LayoutSource::Approximate { .. } => None,
            };
            match ids {
                Some(ids) => self.paint_ids(&ids, color),
                None => {
                    // Coarse fallback: one short band per axis.
                    #[allow(clippy::cast_precision_loss)]
                    let half = (max_per_axis as f32 / self.frame.len() as f32) / 2.0;
                    let center = match direction {
                        [x, _, _] if x > 0.0 => 0.25,
                        [_, y, _] if y > 0.0 => 0.5,
                        _ => 0.75,
                    };
                    self.paint_proportional(center, half, color);
                }
            }
        }
    }

    /// Flush the framebuffer to every registered output segment.
    ///
    /// This is the only point where pixels reach hardware.
    pub fn show(&mut self) {
        for segment in &mut self.segments {
            let end = segment.offset + segment.len;
            segment.driver.write(&self.frame[segment.offset..end]);
        }
    }

    fn paint_ids(&mut self, ids: &[u16], color: Rgb) {
        for &id in ids {
            self.set_pixel(id, color);
        }
    }

    /// Index-proportional fallback band: `center` in [0,1] maps across the
    /// whole framebuffer, `half_width` widens it symmetrically.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn paint_proportional(&mut self, center: f32, half_width: f32, color: Rgb) {
        if self.frame.is_empty() {
            return;
        }
        let last = (self.frame.len() - 1) as f32;
        let center = center.clamp(0.0, 1.0);
        let lo = (((center - half_width).max(0.0)) * last).round() as usize;
        let hi = (((center + half_width).min(1.0)) * last).round() as usize;
        for pixel in &mut self.frame[lo..=hi] {
            *pixel = color;
        }
    }
}

impl Default for LedSphereManager {
    fn default() -> Self {
        Self::new()
    }
}
