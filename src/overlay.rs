//! Boot-time procedural overlay.
//!
//! Runs an animated pattern on a dedicated render thread while a slow
//! blocking operation executes concurrently on the caller's thread, masking
//! its latency. The sphere manager moves *into* the render thread for the
//! overlay's lifetime (only that context ever drives it) and returns through
//! the handoff slot on stop; the shared progress cell is the only other
//! state crossing the boundary.
//!
//! The overlay is a best-effort UX feature: a failed thread spawn leaves the
//! manager retrievable and must never block the critical boot path.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::color::{Rgb, fade_to_black, rgb_from_u32, scale_color_f};
use crate::handoff::Handoff;
use crate::pacing::{DEFAULT_FPS, FramePacer, WatchdogFeed};
use crate::progress::SharedProgress;
use crate::sphere::LedSphereManager;

/// Hard ceiling on how long a stop request may wait for the render thread.
pub const STOP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Poll step of the bounded stop wait.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Built-in overlay animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPattern {
    /// Progress ring climbing from the south pole to the north pole
    BootProgress,
    /// Rotating RGB meridians with an equator progress ring
    RotatingAxis,
    /// Phase-shifted pulse across multiple latitude rings
    PulsingSphere,
    /// Three-armed spiral growing with progress
    LoadingSpiral,
}

impl OverlayPattern {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BootProgress => "boot_progress",
            Self::RotatingAxis => "rotating_axis",
            Self::PulsingSphere => "pulsing_sphere",
            Self::LoadingSpiral => "loading_spiral",
        }
    }

    /// Draw one frame at the given progress and elapsed time.
    fn render(self, sphere: &mut LedSphereManager, progress: f32, time_s: f32, brightness: f32) {
        sphere.clear();
        match self {
            Self::BootProgress => render_boot_progress(sphere, progress, time_s, brightness),
            Self::RotatingAxis => render_rotating_axis(sphere, progress, time_s, brightness),
            Self::PulsingSphere => render_pulsing_sphere(sphere, progress, time_s, brightness),
            Self::LoadingSpiral => render_loading_spiral(sphere, progress, time_s, brightness),
        }
    }
}

/// Configuration for the boot overlay.
#[derive(Debug, Clone, Copy)]
pub struct OverlayConfig {
    pub pattern: OverlayPattern,
    /// Brightness multiplier [0.0 - 1.0]
    pub brightness: f32,
    pub target_fps: u32,
    /// Stop automatically when progress reaches 1.0
    pub auto_stop: bool,
    /// Liveness hook fed once per frame
    pub watchdog: Option<WatchdogFeed>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            pattern: OverlayPattern::BootProgress,
            brightness: 0.3,
            target_fps: DEFAULT_FPS,
            auto_stop: true,
            watchdog: None,
        }
    }
}

/// Animated overlay masking a slow boot-time operation.
pub struct BootOverlay {
    progress: Arc<SharedProgress>,
    handoff: Arc<Handoff<LedSphereManager>>,
    worker: Option<JoinHandle<()>>,
}

impl BootOverlay {
    pub fn new() -> Self {
        Self {
            progress: Arc::new(SharedProgress::new()),
            handoff: Arc::new(Handoff::new()),
            worker: None,
        }
    }

    /// True while the render thread is running.
    pub fn is_active(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Start the overlay, moving the sphere manager into the render thread.
    ///
    /// `expected_duration` drives the autonomous time-based progress used
    /// when the heavy task reports nothing. Returns `false` when the thread
    /// could not be spawned; the manager is then retrievable via [`stop`].
    ///
    /// [`stop`]: Self::stop
    pub fn start(
        &mut self,
        sphere: LedSphereManager,
        config: OverlayConfig,
        expected_duration: Duration,
    ) -> bool {
        if self.is_active() {
            warn!("overlay already running, stopping previous run");
            drop(self.stop());
        }
        if self.handoff.take().is_some() {
            warn!("discarding sphere manager left over from a previous run");
        }

        self.progress.reset();
        if self.handoff.put(sphere).is_err() {
            return false;
        }

        let progress = Arc::clone(&self.progress);
        let handoff = Arc::clone(&self.handoff);
        let spawned = thread::Builder::new()
            .name("boot-overlay".into())
            .spawn(move || overlay_loop(&progress, &handoff, config, expected_duration));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!(
                    "overlay started: {} for {}ms",
                    config.pattern.as_str(),
                    expected_duration.as_millis()
                );
                true
            }
            Err(err) => {
                warn!("overlay thread spawn failed: {err}; continuing without overlay");
                false
            }
        }
    }

    /// Forward heavy-task progress to the render loop. Safe from any thread.
    pub fn update_progress(&self, progress: f32) {
        self.progress.update(progress);
    }

    /// Stop the overlay and recover the sphere manager.
    ///
    /// Requests a cooperative stop, honored within one frame budget, then
    /// waits up to [`STOP_TIMEOUT`]. On timeout the render thread is
    /// detached and `None` is returned - this call never blocks
    /// indefinitely.
    pub fn stop(&mut self) -> Option<LedSphereManager> {
        self.progress.request_stop();

        let Some(worker) = self.worker.take() else {
            return self.handoff.take();
        };

        let mut manager = self.handoff.take_within(STOP_TIMEOUT, STOP_POLL_INTERVAL);
        if manager.is_some() || worker.is_finished() {
            let _ = worker.join();
            manager = manager.or_else(|| self.handoff.take());
        } else {
            warn!(
                "overlay did not stop within {}ms, detaching render thread",
                STOP_TIMEOUT.as_millis()
            );
        }
        manager
    }
}

impl Default for BootOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BootOverlay {
    fn drop(&mut self) {
        if self.worker.is_some() {
            drop(self.stop());
        }
    }
}

/// Render loop body running on the dedicated thread.
#[allow(clippy::cast_precision_loss)]
fn overlay_loop(
    progress: &SharedProgress,
    handoff: &Handoff<LedSphereManager>,
    config: OverlayConfig,
    expected_duration: Duration,
) {
    // The slot can already be empty if a stop raced the spawn.
    let Some(mut sphere) = handoff.take() else {
        return;
    };

    let start = Instant::now();
    let mut pacer = FramePacer::new(config.target_fps);
    let mut frames: u32 = 0;

    loop {
        let snapshot = progress.snapshot();
        if snapshot.stop_requested {
            break;
        }

        let mut current = snapshot.progress;
        if config.auto_stop && expected_duration.as_millis() > 0 {
            let elapsed = Instant::now().duration_since(start);
            let time_based = elapsed.as_millis() as f32 / expected_duration.as_millis() as f32;
            current = current.max(time_based.min(1.0));
        }
        if config.auto_stop && current >= 1.0 {
            info!("overlay auto-stop at completion");
            break;
        }

        let time_s = Instant::now().duration_since(start).as_millis() as f32 / 1000.0;
        config.pattern.render(&mut sphere, current, time_s, config.brightness);
        sphere.show();
        frames += 1;

        if let Some(feed) = config.watchdog {
            feed();
        }

        let sleep = pacer.tick(Instant::now());
        if sleep.as_millis() > 0 {
            thread::sleep(StdDuration::from_millis(sleep.as_millis()));
        }
    }

    info!("overlay ended after {frames} frames");
    if handoff.put(sphere).is_err() {
        warn!("overlay could not return the sphere manager");
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_boot_progress(sphere: &mut LedSphereManager, progress: f32, time_s: f32, brightness: f32) {
    // Progress ring climbing south pole to north pole, blue shifting green.
    let latitude = -90.0 + 180.0 * progress;
    let color = scale_color_f(
        Rgb {
            r: 0,
            g: (progress * 255.0) as u8,
            b: ((1.0 - progress) * 255.0) as u8,
        },
        brightness,
    );
    sphere.draw_latitude_line(latitude, color, 3);

    // Slowly orbiting decoration rings around the main ring.
    let rotation = time_s * 100.0;
    for i in 0..3u8 {
        let phase = (rotation + f32::from(i) * 120.0).to_radians();
        let decor_latitude = latitude + 15.0 * libm::sinf(phase);
        let decor = scale_color_f(rgb_from_u32(0x64_6464), brightness);
        sphere.draw_latitude_line(decor_latitude, decor, 1);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_rotating_axis(sphere: &mut LedSphereManager, progress: f32, time_s: f32, brightness: f32) {
    // One full revolution per second.
    let rotation = time_s * 360.0;
    sphere.draw_longitude_line(rotation, scale_color_f(rgb_from_u32(0xff_0000), brightness), 2);
    sphere.draw_longitude_line(
        rotation + 120.0,
        scale_color_f(rgb_from_u32(0x00_ff00), brightness),
        2,
    );
    sphere.draw_longitude_line(
        rotation + 240.0,
        scale_color_f(rgb_from_u32(0x0000_ff), brightness),
        2,
    );

    // Equator ring widens and brightens with progress.
    let ring = scale_color_f(rgb_from_u32(0xffff_00), brightness * progress);
    sphere.draw_latitude_line(0.0, ring, (progress * 5.0) as u8);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_pulsing_sphere(sphere: &mut LedSphereManager, progress: f32, time_s: f32, brightness: f32) {
    let pulse = libm::sinf(time_s * 10.0) * 0.5 + 0.5;
    let level = pulse * brightness * (0.5 + 0.5 * progress);
    let base = Rgb {
        r: (255.0 * level * (1.0 - progress)) as u8,
        g: (255.0 * level * progress) as u8,
        b: (255.0 * level * 0.5) as u8,
    };

    let mut latitude = -60.0;
    while latitude <= 60.0 {
        let phase_shift = latitude * 0.1;
        let ring_pulse = libm::sinf((time_s * 1000.0 + phase_shift) * 0.01) * 0.5 + 0.5;
        let faded = fade_to_black(base, (255.0 * (1.0 - ring_pulse)) as u8);
        sphere.draw_latitude_line(latitude, faded, 2);
        latitude += 30.0;
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_loading_spiral(sphere: &mut LedSphereManager, progress: f32, time_s: f32, brightness: f32) {
    let rotation = time_s * 360.0;
    let arms = [
        rgb_from_u32(0xff_0000),
        rgb_from_u32(0x00_ff00),
        rgb_from_u32(0x0000_ff),
    ];

    // Each arm grows toward the north pole as progress advances.
    let max_latitude = -90.0 + 180.0 * progress;
    for (arm, color) in arms.into_iter().enumerate() {
        let arm_offset = arm as f32 * 120.0;
        let mut latitude = -90.0;
        while latitude <= max_latitude {
            let longitude = rotation + arm_offset + (latitude + 90.0) * 2.0;
            let fade = (latitude + 90.0) / 180.0;
            sphere.draw_longitude_line(longitude, scale_color_f(color, brightness * fade), 1);
            latitude += 10.0;
        }
    }
}
