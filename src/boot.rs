//! Startup orchestration.
//!
//! [`SynchronizedBoot`] pairs a blocking heavy task with the opening
//! sequence: the task runs on the caller's thread and reports progress
//! through a callback, the animation follows on its own thread, and both
//! finish together. [`FastBootOrchestrator`] sequences the coarser
//! critical/functional/enhanced startup stages around it.

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::pacing::WatchdogFeed;
use crate::sequence::{OpeningSequence, PhaseCallbacks, SequenceConfig};
use crate::sphere::LedSphereManager;

/// Configuration for a synchronized boot run.
#[derive(Debug, Clone, Copy)]
pub struct BootConfig {
    pub task_name: &'static str,
    /// Expected duration of the heavy task, drives the animation target.
    pub estimated_duration: Duration,
    pub brightness: f32,
    pub target_fps: u32,
    /// Liveness hook passed through to the sequence render loop
    pub watchdog: Option<WatchdogFeed>,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            task_name: "storage-init",
            estimated_duration: Duration::from_millis(3000),
            brightness: 0.8,
            target_fps: 30,
            watchdog: None,
        }
    }
}

/// Outcome of a synchronized boot run.
#[derive(Debug, Clone, Copy)]
pub struct BootReport {
    pub task_ok: bool,
    pub opening_ok: bool,
    pub elapsed: Duration,
}

/// Runs a heavy task with the opening sequence synchronized to it.
pub struct SynchronizedBoot {
    sequence: OpeningSequence,
}

impl SynchronizedBoot {
    pub fn new() -> Self {
        Self {
            sequence: OpeningSequence::new(),
        }
    }

    /// Execute the heavy task while the opening sequence renders.
    ///
    /// The task runs on the calling thread and receives a progress sink to
    /// invoke with values in [0, 1]. A sequence that fails to start is
    /// logged and boot continues without the animation. Returns the report
    /// plus the sphere manager, which is `None` only if the render thread
    /// had to be detached on timeout.
    pub fn execute<F>(
        &mut self,
        sphere: LedSphereManager,
        task: F,
        config: &BootConfig,
        callbacks: PhaseCallbacks,
    ) -> (BootReport, Option<LedSphereManager>)
    where
        F: FnOnce(&dyn Fn(f32)) -> bool,
    {
        info!(
            "synchronized boot: {} ({}ms estimated)",
            config.task_name,
            config.estimated_duration.as_millis()
        );
        let started_at = Instant::now();

        let sequence_config = SequenceConfig {
            total_duration: config.estimated_duration,
            sync_with_heavy_task: true,
            brightness: config.brightness,
            target_fps: config.target_fps,
            watchdog: config.watchdog,
        };
        let opening_ok = self.sequence.start(sphere, sequence_config, callbacks);
        if !opening_ok {
            warn!("opening sequence unavailable, running {} bare", config.task_name);
        }

        let sequence = &self.sequence;
        let progress_sink = |progress: f32| sequence.sync_external_progress(progress);
        let task_ok = task(&progress_sink);
        // Make sure the animation sees completion even if the task never
        // reported 1.0 itself.
        if task_ok {
            progress_sink(1.0);
        }

        let manager = self.sequence.stop();
        let elapsed = Instant::now().duration_since(started_at);

        info!(
            "synchronized boot done: task={} opening={} in {}ms",
            task_ok,
            opening_ok,
            elapsed.as_millis()
        );
        (
            BootReport {
                task_ok,
                opening_ok,
                elapsed,
            },
            manager,
        )
    }
}

impl Default for SynchronizedBoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Hooks for the minimal boot flow.
#[derive(Default)]
pub struct BootCallbacks {
    /// Invoked once storage is usable.
    pub on_storage_ready: Option<Box<dyn FnMut()>>,
    /// Fatal when it returns `false`.
    pub stage_assets: Option<Box<dyn FnMut() -> bool>>,
}

/// Minimal boot flow: storage, then configuration, then assets.
///
/// The staged alternative is [`FastBootOrchestrator`].
pub struct BootOrchestrator {
    callbacks: BootCallbacks,
    loaded_config: bool,
}

impl BootOrchestrator {
    pub fn new(callbacks: BootCallbacks) -> Self {
        Self {
            callbacks,
            loaded_config: false,
        }
    }

    /// Bring up storage and configuration.
    ///
    /// `storage_begin` is fatal; a failed `load_config` continues with
    /// defaults and is reported through [`has_loaded_config`].
    ///
    /// [`has_loaded_config`]: Self::has_loaded_config
    pub fn run(
        &mut self,
        storage_begin: impl FnOnce() -> bool,
        load_config: impl FnOnce() -> bool,
    ) -> bool {
        self.loaded_config = false;

        if !storage_begin() {
            return false;
        }
        if let Some(hook) = &mut self.callbacks.on_storage_ready {
            hook();
        }

        let has_config = load_config();

        if let Some(stage) = &mut self.callbacks.stage_assets {
            if !stage() {
                return false;
            }
        }

        self.loaded_config = has_config;
        true
    }

    pub const fn has_loaded_config(&self) -> bool {
        self.loaded_config
    }
}

/// Injected startup services, all optional.
///
/// `None` entries are skipped. Fatal services abort the boot when they
/// return `false`; non-fatal ones degrade with a warning.
#[derive(Default)]
pub struct BootServices {
    /// Fatal: base hardware bring-up.
    pub initialize_hardware: Option<Box<dyn FnMut() -> bool>>,
    /// Non-fatal: minimal configuration load, defaults on failure.
    pub load_minimal_config: Option<Box<dyn FnMut() -> bool>>,
    /// Fatal: LED subsystem bring-up.
    pub initialize_led_system: Option<Box<dyn FnMut() -> bool>>,
    /// Non-fatal: orientation source bring-up.
    pub initialize_orientation: Option<Box<dyn FnMut() -> bool>>,
    /// Fatal: first pattern on the sphere.
    pub start_patterns: Option<Box<dyn FnMut() -> bool>>,
    /// Non-fatal: deferred asset staging.
    pub stage_assets: Option<Box<dyn FnMut() -> bool>>,
    /// Non-fatal: communication bring-up.
    pub initialize_communication: Option<Box<dyn FnMut() -> bool>>,
}

/// Per-stage completion hooks.
#[derive(Default)]
pub struct StageCallbacks {
    pub on_critical_complete: Option<Box<dyn FnMut()>>,
    pub on_functional_complete: Option<Box<dyn FnMut()>>,
    pub on_enhanced_complete: Option<Box<dyn FnMut()>>,
}

/// Coarse startup stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    /// Minimum viable device
    Critical,
    /// Basic functionality available
    Functional,
    /// Quality features loaded
    Enhanced,
}

/// Staged boot: critical first, functional next, enhancements last.
pub struct FastBootOrchestrator {
    services: BootServices,
    callbacks: StageCallbacks,
    stage: BootStage,
    enhanced_complete: bool,
    watchdog: Option<WatchdogFeed>,
}

impl FastBootOrchestrator {
    pub fn new(services: BootServices, callbacks: StageCallbacks) -> Self {
        Self {
            services,
            callbacks,
            stage: BootStage::Critical,
            enhanced_complete: false,
            watchdog: None,
        }
    }

    #[must_use]
    pub fn with_watchdog(mut self, watchdog: WatchdogFeed) -> Self {
        self.watchdog = Some(watchdog);
        self
    }

    pub const fn stage(&self) -> BootStage {
        self.stage
    }

    /// Coarse total boot progress for status displays.
    pub const fn boot_progress(&self) -> f32 {
        match self.stage {
            BootStage::Critical => 0.2,
            BootStage::Functional => 0.6,
            BootStage::Enhanced => {
                if self.enhanced_complete {
                    1.0
                } else {
                    0.8
                }
            }
        }
    }

    /// Run all three stages in order.
    ///
    /// Returns `false` as soon as a fatal service fails.
    pub fn run(&mut self) -> bool {
        let boot_start = Instant::now();

        if !self.run_critical() {
            warn!("critical boot stage failed");
            return false;
        }
        if let Some(hook) = &mut self.callbacks.on_critical_complete {
            hook();
        }

        self.stage = BootStage::Functional;
        if !self.run_functional() {
            warn!("functional boot stage failed");
            return false;
        }
        if let Some(hook) = &mut self.callbacks.on_functional_complete {
            hook();
        }

        self.stage = BootStage::Enhanced;
        self.run_enhanced();
        if let Some(hook) = &mut self.callbacks.on_enhanced_complete {
            hook();
        }

        info!(
            "fast boot complete in {}ms",
            Instant::now().duration_since(boot_start).as_millis()
        );
        true
    }

    fn run_critical(&mut self) -> bool {
        if let Some(service) = &mut self.services.initialize_hardware {
            if !service() {
                return false;
            }
        }
        if let Some(service) = &mut self.services.load_minimal_config {
            if !service() {
                warn!("minimal config load failed, continuing with defaults");
            }
        }
        self.feed_watchdog();
        true
    }

    fn run_functional(&mut self) -> bool {
        if let Some(service) = &mut self.services.initialize_led_system {
            if !service() {
                return false;
            }
        }
        if let Some(service) = &mut self.services.initialize_orientation {
            if !service() {
                warn!("orientation source unavailable, continuing without it");
            }
        }
        if let Some(service) = &mut self.services.start_patterns {
            if !service() {
                return false;
            }
        }
        self.feed_watchdog();
        true
    }

    fn run_enhanced(&mut self) {
        if let Some(service) = &mut self.services.stage_assets {
            if !service() {
                warn!("asset staging failed, continuing without staged assets");
            }
        }
        if let Some(service) = &mut self.services.initialize_communication {
            if !service() {
                warn!("communication bring-up failed, continuing offline");
            }
        }
        self.feed_watchdog();
        self.enhanced_complete = true;
    }

    fn feed_watchdog(&self) {
        if let Some(feed) = self.watchdog {
            feed();
        }
    }
}
