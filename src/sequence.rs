//! Procedural opening sequence.
//!
//! A five-phase animated startup sequence driven purely by thresholds on a
//! single total-progress value - either synchronized from a concurrently
//! running heavy task or derived from elapsed time as a self-terminating
//! fallback. The render loop runs on its own thread with the same handoff
//! and shared-progress discipline as the boot overlay.
//!
//! Phase notifications fire in strictly increasing phase order exactly once
//! per phase: progress is clamped, thresholds are disjoint, and a latch
//! walks intermediate phases on large jumps while ignoring backward jitter.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::color::{Rgb, fade_to_black, rgb_from_u32, scale_color_f};
use crate::handoff::Handoff;
use crate::overlay::STOP_TIMEOUT;
use crate::pacing::{DEFAULT_FPS, FramePacer, WatchdogFeed};
use crate::progress::SharedProgress;
use crate::sphere::LedSphereManager;

/// Poll step of the bounded stop wait.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Ordered phases of the opening sequence.
///
/// Transitions are driven purely by total progress against these disjoint
/// threshold windows; the sequence never cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SequencePhase {
    /// [0.0, 0.2): expanding splash rings
    BootSplash,
    /// [0.2, 0.4): diagnostic scan sweep
    SystemCheck,
    /// [0.4, 0.6): wireframe sphere build-up
    SphereEmerge,
    /// [0.6, 0.8): rotating axis alignment
    AxisCalibrate,
    /// [0.8, 1.0]: completion pulse
    ReadyPulse,
}

impl SequencePhase {
    /// Phase owning the given total progress.
    pub fn from_progress(progress: f32) -> Self {
        if progress < 0.2 {
            Self::BootSplash
        } else if progress < 0.4 {
            Self::SystemCheck
        } else if progress < 0.6 {
            Self::SphereEmerge
        } else if progress < 0.8 {
            Self::AxisCalibrate
        } else {
            Self::ReadyPulse
        }
    }

    /// Progress window [start, end) of this phase.
    pub const fn bounds(self) -> (f32, f32) {
        match self {
            Self::BootSplash => (0.0, 0.2),
            Self::SystemCheck => (0.2, 0.4),
            Self::SphereEmerge => (0.4, 0.6),
            Self::AxisCalibrate => (0.6, 0.8),
            Self::ReadyPulse => (0.8, 1.0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::BootSplash => "Boot Splash",
            Self::SystemCheck => "System Check",
            Self::SphereEmerge => "Sphere Emerge",
            Self::AxisCalibrate => "Axis Calibrate",
            Self::ReadyPulse => "Ready Pulse",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::BootSplash => Some(Self::SystemCheck),
            Self::SystemCheck => Some(Self::SphereEmerge),
            Self::SphereEmerge => Some(Self::AxisCalibrate),
            Self::AxisCalibrate => Some(Self::ReadyPulse),
            Self::ReadyPulse => None,
        }
    }
}

/// Configuration for the opening sequence.
#[derive(Debug, Clone, Copy)]
pub struct SequenceConfig {
    /// Target duration of the full sequence (time-based progress only).
    pub total_duration: Duration,
    /// Follow externally synchronized progress instead of elapsed time.
    pub sync_with_heavy_task: bool,
    /// Brightness multiplier [0.0 - 1.0]
    pub brightness: f32,
    pub target_fps: u32,
    /// Liveness hook fed once per frame
    pub watchdog: Option<WatchdogFeed>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            total_duration: Duration::from_millis(3000),
            sync_with_heavy_task: true,
            brightness: 0.8,
            target_fps: DEFAULT_FPS,
            watchdog: None,
        }
    }
}

/// Optional notification hooks, invoked from the render thread.
#[derive(Default)]
pub struct PhaseCallbacks {
    pub on_phase_start: Option<Box<dyn Fn(SequencePhase) + Send>>,
    pub on_phase_progress: Option<Box<dyn Fn(SequencePhase, f32) + Send>>,
    pub on_phase_complete: Option<Box<dyn Fn(SequencePhase) + Send>>,
    pub on_sequence_complete: Option<Box<dyn Fn() + Send>>,
}

/// Animated opening sequence synchronized with a heavy boot task.
pub struct OpeningSequence {
    progress: Arc<SharedProgress>,
    handoff: Arc<Handoff<LedSphereManager>>,
    worker: Option<JoinHandle<()>>,
}

impl OpeningSequence {
    pub fn new() -> Self {
        Self {
            progress: Arc::new(SharedProgress::new()),
            handoff: Arc::new(Handoff::new()),
            worker: None,
        }
    }

    /// True while the render thread is running.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Start the sequence, moving the sphere manager into the render thread.
    ///
    /// Returns `false` when the thread could not be spawned; boot proceeds
    /// without the animation and the manager is retrievable via [`stop`].
    ///
    /// [`stop`]: Self::stop
    pub fn start(
        &mut self,
        sphere: LedSphereManager,
        config: SequenceConfig,
        callbacks: PhaseCallbacks,
    ) -> bool {
        if self.is_running() {
            warn!("opening sequence already running, stopping previous run");
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
            .name("opening-sequence".into())
            .spawn(move || sequence_loop(&progress, &handoff, config, &callbacks));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!(
                    "opening sequence started: {}ms target at {} fps",
                    config.total_duration.as_millis(),
                    config.target_fps
                );
                true
            }
            Err(err) => {
                warn!("sequence thread spawn failed: {err}; booting without opening");
                false
            }
        }
    }

    /// Forward heavy-task progress into the sequence. Safe from any thread.
    pub fn sync_external_progress(&self, progress: f32) {
        self.progress.update(progress);
    }

    /// Stop the sequence and recover the sphere manager.
    ///
    /// Bounded by [`STOP_TIMEOUT`]; on timeout the render thread is
    /// detached and `None` is returned.
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
                "opening sequence did not stop within {}ms, detaching render thread",
                STOP_TIMEOUT.as_millis()
            );
        }
        manager
    }
}

impl Default for OpeningSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OpeningSequence {
    fn drop(&mut self) {
        if self.worker.is_some() {
            drop(self.stop());
        }
    }
}

/// Render loop body running on the dedicated thread.
#[allow(clippy::cast_precision_loss)]
fn sequence_loop(
    progress: &SharedProgress,
    handoff: &Handoff<LedSphereManager>,
    config: SequenceConfig,
    callbacks: &PhaseCallbacks,
) {
    let Some(mut sphere) = handoff.take() else {
        return;
    };

    let start = Instant::now();
    let mut pacer = FramePacer::new(config.target_fps);
    let mut phase = SequencePhase::BootSplash;
    let mut frames: u32 = 0;
    let mut completed = false;

    if let Some(on_start) = &callbacks.on_phase_start {
        on_start(phase);
    }

    loop {
        let snapshot = progress.snapshot();

        let elapsed = Instant::now().duration_since(start);
        let total = if config.sync_with_heavy_task {
            snapshot.progress
        } else {
            let target = config.total_duration.as_millis().max(1);
            (elapsed.as_millis() as f32 / target as f32).min(1.0)
        };

        // Phase latch: walk forward through every crossed threshold, never
        // backward, so notifications stay ordered and fire exactly once.
        let target_phase = SequencePhase::from_progress(total);
        while phase < target_phase {
            if let Some(on_complete) = &callbacks.on_phase_complete {
                on_complete(phase);
            }
            let Some(next) = phase.next() else {
                break;
            };
            phase = next;
            if let Some(on_start) = &callbacks.on_phase_start {
                on_start(phase);
            }
        }

        let (phase_start, phase_end) = phase.bounds();
        let phase_progress = ((total - phase_start) / (phase_end - phase_start)).clamp(0.0, 1.0);

        let time_s = elapsed.as_millis() as f32 / 1000.0;
        sphere.clear();
        match phase {
            SequencePhase::BootSplash => {
                render_boot_splash(&mut sphere, phase_progress, time_s, config.brightness);
            }
            SequencePhase::SystemCheck => {
                render_system_check(&mut sphere, phase_progress, config.brightness);
            }
            SequencePhase::SphereEmerge => {
                render_sphere_emerge(&mut sphere, phase_progress, config.brightness);
            }
            SequencePhase::AxisCalibrate => {
                render_axis_calibrate(&mut sphere, phase_progress, config.brightness);
            }
            SequencePhase::ReadyPulse => {
                render_ready_pulse(&mut sphere, phase_progress, time_s, config.brightness);
            }
        }
        sphere.show();
        frames += 1;

        if let Some(on_progress) = &callbacks.on_phase_progress {
            on_progress(phase, phase_progress);
        }

        // Completion wins over a stop request that races the final
        // progress report, so on_sequence_complete cannot be starved.
        if total >= 1.0 {
            completed = true;
            if let Some(on_complete) = &callbacks.on_sequence_complete {
                on_complete();
            }
            info!("opening sequence completed normally");
            break;
        }
        if snapshot.stop_requested {
            break;
        }

        if let Some(feed) = config.watchdog {
            feed();
        }

        let sleep = pacer.tick(Instant::now());
        if sleep.as_millis() > 0 {
            thread::sleep(StdDuration::from_millis(sleep.as_millis()));
        }
    }

    info!(
        "opening sequence ended after {frames} frames (completed: {completed})"
    );
    if handoff.put(sphere).is_err() {
        warn!("opening sequence could not return the sphere manager");
    }
}

/// Phase 1: splash rings expanding from the equator plus slow spokes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_boot_splash(sphere: &mut LedSphereManager, phase_progress: f32, time_s: f32, brightness: f32) {
    let ring_reach = phase_progress * 90.0;
    for ring in 0..3u8 {
        let radius = ring_reach - f32::from(ring) * 15.0;
        if radius <= 0.0 {
            continue;
        }
        let intensity = (1.0 - f32::from(ring) * 0.2) * brightness;
        let gold = scale_color_f(rgb_from_u32(0xffc8_32), intensity);
        sphere.draw_latitude_line(0.0, gold, (radius / 30.0) as u8);
    }

    for spoke in 0..4u8 {
        let angle = f32::from(spoke) * 90.0 + time_s * 100.0;
        let blue = scale_color_f(rgb_from_u32(0x6496_ff), brightness);
        sphere.draw_longitude_line(angle, blue, (2.0 * phase_progress) as u8);
    }
}

/// Phase 2: diagnostic scan line sweeping pole to pole with a fading trail
/// and completed-section meridians.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_system_check(sphere: &mut LedSphereManager, phase_progress: f32, brightness: f32) {
    let scan_latitude = -90.0 + 180.0 * phase_progress;
    let scan = scale_color_f(rgb_from_u32(0x00_ff64), brightness);
    sphere.draw_latitude_line(scan_latitude, scan, 3);

    for trail in 1..=5u8 {
        let trail_latitude = scan_latitude - f32::from(trail) * 10.0;
        if trail_latitude >= -90.0 {
            let faded = fade_to_black(scan, trail * 50);
            sphere.draw_latitude_line(trail_latitude, faded, 1);
        }
    }

    let completed_sections = (phase_progress * 12.0) as u8;
    for section in 0..completed_sections {
        let longitude = f32::from(section) * 30.0;
        let check = scale_color_f(rgb_from_u32(0x00_c800), brightness);
        sphere.draw_longitude_line(longitude, check, 1);
    }
}

/// Phase 3: wireframe sphere building up line by line.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_sphere_emerge(sphere: &mut LedSphereManager, phase_progress: f32, brightness: f32) {
    const MAX_LAT_LINES: f32 = 9.0;
    const MAX_LON_LINES: f32 = 12.0;

    let visible_lat = (phase_progress * MAX_LAT_LINES) as u8;
    for line in 0..visible_lat {
        let latitude = -80.0 + f32::from(line) * 20.0;
        let intensity = (1.0 - f32::from(line) * 0.1) * brightness;
        let blue = scale_color_f(rgb_from_u32(0x6464_ff), intensity);
        sphere.draw_latitude_line(latitude, blue, 2);
    }

    let visible_lon = (phase_progress * MAX_LON_LINES) as u8;
    for line in 0..visible_lon {
        let longitude = f32::from(line) * 30.0;
        let red = scale_color_f(rgb_from_u32(0xff_6464), brightness);
        sphere.draw_longitude_line(longitude, red, 1);
    }
}

/// Phase 4: three rotating meridians aligning, equator flash at the end.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_axis_calibrate(sphere: &mut LedSphereManager, phase_progress: f32, brightness: f32) {
    let rotation = phase_progress * 360.0;
    sphere.draw_longitude_line(rotation, scale_color_f(rgb_from_u32(0xff_0000), brightness), 3);
    sphere.draw_longitude_line(
        rotation + 120.0,
        scale_color_f(rgb_from_u32(0x00_ff00), brightness),
        3,
    );
    sphere.draw_longitude_line(
        rotation + 240.0,
        scale_color_f(rgb_from_u32(0x0000_ff), brightness),
        3,
    );

    if phase_progress > 0.8 {
        let reach = (phase_progress - 0.8) / 0.2;
        let white = scale_color_f(rgb_from_u32(0xffff_ff), reach * brightness);
        sphere.draw_latitude_line(0.0, white, (4.0 * reach) as u8);
    }
}

/// Phase 5: accelerating green pulse, full lattice at the very end.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_ready_pulse(sphere: &mut LedSphereManager, phase_progress: f32, time_s: f32, brightness: f32) {
    let pulse_frequency = 2.0 + phase_progress * 2.0;
    let pulse = libm::sinf(time_s * 10.0 * pulse_frequency) * 0.5 + 0.5;
    let ready = scale_color_f(
        Rgb {
            r: 100,
            g: 255,
            b: 100,
        },
        pulse * brightness,
    );

    let mut latitude = -60.0;
    while latitude <= 60.0 {
        sphere.draw_latitude_line(latitude, ready, 3);
        latitude += 20.0;
    }

    if phase_progress > 0.9 {
        let done = scale_color_f(rgb_from_u32(0xc8ff_c8), brightness);
        let mut lat = -80.0;
        while lat <= 80.0 {
            sphere.draw_latitude_line(lat, done, 2);
            lat += 20.0;
        }
        let mut lon = 0.0;
        while lon < 360.0 {
            sphere.draw_longitude_line(lon, done, 1);
            lon += 30.0;
        }
    }
}
