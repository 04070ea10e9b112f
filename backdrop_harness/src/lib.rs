// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic replay and FPS grading for backdrop sessions.
//!
//! Everything here runs on a virtual clock. A [`FrameScript`] describes frame
//! pacing as a sequence of steady segments, a [`SyntheticDevice`] stands in
//! for the browser during capability detection, and a [`ScriptedSurface`]
//! records what the session asked of the render surface. [`Replay`] wires
//! them into a [`BackgroundSession`]; [`replay_controller`] drives a bare
//! [`TierController`] with raw readings.
//!
//! [`FpsHistory`] keeps the last `N` readings for HUDs and grades them
//! against the tier thresholds. It is also a [`TraceSink`], so it can sit
//! behind the session's tracer.

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use backdrop_core::benchmark::{StartupBenchmark, combine, quick_reject};
use backdrop_core::capability::{ContextError, DeviceInfo, Detection, WebGlVersion, detect};
use backdrop_core::config::{FpsThresholds, PerformanceConfig};
use backdrop_core::controller::{FpsVerdict, TierController};
use backdrop_core::notify::{PerformanceUpdate, TierListener};
use backdrop_core::session::BackgroundSession;
use backdrop_core::shell::SurfacePhase;
use backdrop_core::surface::{RenderFailure, RenderSurface};
use backdrop_core::tier::Tier;
use backdrop_core::time::{Duration, HostTime};
use backdrop_core::trace::{FpsSampleEvent, TraceSink, Tracer};

// ---------------------------------------------------------------------------
// Frame scripts
// ---------------------------------------------------------------------------

/// A stretch of constant frame pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Time between consecutive frames.
    pub frame_interval: Duration,
    /// How long the segment lasts.
    pub length: Duration,
}

/// Frame pacing over time, as consecutive [`Segment`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameScript {
    segments: Vec<Segment>,
}

impl FrameScript {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment with frames every `frame_interval` for `length`.
    ///
    /// A zero interval is raised to one tick.
    #[must_use]
    pub fn steady(mut self, frame_interval: Duration, length: Duration) -> Self {
        self.segments.push(Segment {
            frame_interval: frame_interval.max(Duration(1)),
            length,
        });
        self
    }

    /// Appends a segment running at `rate` frames per second.
    #[must_use]
    pub fn fps(self, rate: u32, length: Duration) -> Self {
        self.steady(Duration::per_second(rate), length)
    }

    /// The segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of segment lengths.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.segments
            .iter()
            .fold(Duration::ZERO, |acc, s| acc + s.length)
    }

    /// Frame timestamps starting at `start`.
    ///
    /// The first frame of the script lands on `start`. A segment keeps
    /// emitting while the next timestamp is before its end, then pacing
    /// switches to the following segment without resetting the clock.
    #[must_use]
    pub fn timestamps(&self, start: HostTime) -> Timestamps<'_> {
        let segment_end = self
            .segments
            .first()
            .map_or(start, |s| start.saturating_add(s.length));
        Timestamps {
            segments: &self.segments,
            index: 0,
            next: start,
            segment_end,
        }
    }
}

/// Iterator returned by [`FrameScript::timestamps`].
#[derive(Clone, Debug)]
pub struct Timestamps<'a> {
    segments: &'a [Segment],
    index: usize,
    next: HostTime,
    segment_end: HostTime,
}

impl Iterator for Timestamps<'_> {
    type Item = HostTime;

    fn next(&mut self) -> Option<HostTime> {
        loop {
            let segment = self.segments.get(self.index)?;
            if self.next < self.segment_end {
                let t = self.next;
                self.next = t.saturating_add(segment.frame_interval);
                return Some(t);
            }
            self.index += 1;
            if let Some(following) = self.segments.get(self.index) {
                self.segment_end = self.segment_end.saturating_add(following.length);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic device
// ---------------------------------------------------------------------------

/// A [`DeviceInfo`] with fixed answers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticDevice {
    /// Reported as a phone or tablet.
    pub mobile: bool,
    /// Reported logical cores.
    pub cores: Option<u32>,
    /// Reported memory hint in GB.
    pub memory_gb: Option<f64>,
    /// Outcome of the context probe.
    pub context: Result<WebGlVersion, ContextError>,
}

impl SyntheticDevice {
    /// Eight-core desktop with WebGL2.
    pub const DESKTOP: Self = Self {
        mobile: false,
        cores: Some(8),
        memory_gb: Some(8.0),
        context: Ok(WebGlVersion::V2),
    };

    /// Four-core desktop with WebGL2.
    pub const LAPTOP: Self = Self {
        mobile: false,
        cores: Some(4),
        memory_gb: Some(4.0),
        context: Ok(WebGlVersion::V2),
    };

    /// Eight-core phone with WebGL2.
    pub const PHONE: Self = Self {
        mobile: true,
        cores: Some(8),
        memory_gb: Some(4.0),
        context: Ok(WebGlVersion::V2),
    };

    /// Dual-core phone with WebGL 1 and little memory.
    pub const BUDGET_PHONE: Self = Self {
        mobile: true,
        cores: Some(2),
        memory_gb: Some(1.0),
        context: Ok(WebGlVersion::V1),
    };

    /// A browser without WebGL.
    pub const NO_WEBGL: Self = Self {
        mobile: false,
        cores: Some(8),
        memory_gb: None,
        context: Err(ContextError::NotSupported),
    };
}

impl DeviceInfo for SyntheticDevice {
    fn is_mobile(&self) -> bool {
        self.mobile
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        self.cores
    }

    fn device_memory_gb(&self) -> Option<f64> {
        self.memory_gb
    }

    fn probe_context(&mut self) -> Result<WebGlVersion, ContextError> {
        self.context
    }
}

// ---------------------------------------------------------------------------
// Scripted surface
// ---------------------------------------------------------------------------

/// An in-memory [`RenderSurface`] that records every call and can be told
/// to fail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptedSurface {
    /// Tier of each successful mount, in order.
    pub mounts: Vec<Tier>,
    /// Tier of each in-place tier change, in order.
    pub retiers: Vec<Tier>,
    /// Number of unmounts.
    pub unmounts: u32,
    /// Frames drawn over the whole replay.
    pub frames: u64,
    /// Frames drawn since the last mount.
    pub frames_since_mount: u64,
    /// Fail every mount with this error.
    pub fail_mount: Option<RenderFailure>,
    /// Fail the given frame (1-based, counted over the whole replay).
    pub fail_on_frame: Option<(u64, RenderFailure)>,
}

impl ScriptedSurface {
    /// A surface whose mounts always fail.
    #[must_use]
    pub fn failing_mount(failure: RenderFailure) -> Self {
        Self {
            fail_mount: Some(failure),
            ..Self::default()
        }
    }

    /// A surface that fails at frame `frame`.
    #[must_use]
    pub fn failing_at(frame: u64, failure: RenderFailure) -> Self {
        Self {
            fail_on_frame: Some((frame, failure)),
            ..Self::default()
        }
    }
}

impl RenderSurface for ScriptedSurface {
    fn mount(&mut self, tier: Tier) -> Result<(), RenderFailure> {
        if let Some(failure) = self.fail_mount {
            return Err(failure);
        }
        self.mounts.push(tier);
        self.frames_since_mount = 0;
        Ok(())
    }

    fn set_tier(&mut self, tier: Tier) -> Result<(), RenderFailure> {
        self.retiers.push(tier);
        Ok(())
    }

    fn render_frame(&mut self, _now: HostTime, _tier: Tier) -> Result<(), RenderFailure> {
        self.frames += 1;
        if let Some((frame, failure)) = self.fail_on_frame
            && frame == self.frames
        {
            return Err(failure);
        }
        self.frames_since_mount += 1;
        Ok(())
    }

    fn unmount(&mut self) {
        self.unmounts += 1;
        self.frames_since_mount = 0;
    }
}

/// A [`TierListener`] that keeps every update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateLog {
    /// Tiers in the order they were sent.
    pub tiers: Vec<Tier>,
}

impl TierListener for UpdateLog {
    fn on_performance_update(&mut self, update: PerformanceUpdate) {
        self.tiers.push(update.level);
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// A [`BackgroundSession`] on a virtual clock.
///
/// After every frame the replay reports the surface ready once it has drawn
/// a frame since mounting, the way a browser backend does.
#[derive(Debug)]
pub struct Replay {
    session: BackgroundSession<ScriptedSurface, UpdateLog>,
    clock: HostTime,
}

impl Replay {
    /// Detects `device` and mounts a session at `start`.
    pub fn mount<D: DeviceInfo + ?Sized>(
        device: &mut D,
        config: PerformanceConfig,
        surface: ScriptedSurface,
        start: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Self {
        let detection = detect(device, &config.device);
        Self::mount_detected(detection, config, surface, start, tracer)
    }

    /// Mounts a session from an existing detection.
    pub fn mount_detected(
        detection: Detection,
        config: PerformanceConfig,
        surface: ScriptedSurface,
        start: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Self {
        let session = BackgroundSession::mount(
            detection,
            config,
            surface,
            UpdateLog::default(),
            start,
            tracer,
        );
        Self {
            session,
            clock: start,
        }
    }

    /// Plays `script` from the current clock, then advances the clock by the
    /// script's total length.
    pub fn run(&mut self, script: &FrameScript, tracer: &mut Tracer<'_>) {
        let start = self.clock;
        for now in script.timestamps(start) {
            self.step(now, tracer);
        }
        self.clock = start.saturating_add(script.total());
    }

    /// Delivers one frame at `now`.
    pub fn step(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.session.on_frame(now, tracer);
        if self.session.shell().phase() == SurfacePhase::Entering
            && self.session.surface().frames_since_mount > 0
        {
            self.session.surface_ready(now, tracer);
        }
        self.clock = self.clock.max(now);
    }

    /// The replay clock.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.clock
    }

    /// The session under test.
    #[must_use]
    pub fn session(&self) -> &BackgroundSession<ScriptedSurface, UpdateLog> {
        &self.session
    }

    /// Mutable access, for unmounting or loading toggles.
    pub fn session_mut(&mut self) -> &mut BackgroundSession<ScriptedSurface, UpdateLog> {
        &mut self.session
    }

    /// Tier updates the host page received.
    #[must_use]
    pub fn updates(&self) -> &[Tier] {
        &self.session.notifier().listener().tiers
    }
}

/// Feeds `(time, fps)` readings to a fresh controller, polling its retry
/// timer before each one, and returns every verdict.
///
/// Retry promotions that fire between readings are returned as
/// [`FpsVerdict::Applied`] entries ahead of the reading that observed them.
#[must_use]
pub fn replay_controller(
    config: PerformanceConfig,
    initial: Tier,
    readings: &[(HostTime, f64)],
) -> Vec<FpsVerdict> {
    let mut controller = TierController::new(config, initial, initial != Tier::Gradient);
    let mut verdicts = Vec::with_capacity(readings.len());
    for &(now, fps) in readings {
        if let Some(change) = controller.poll(now) {
            verdicts.push(FpsVerdict::Applied(change));
        }
        verdicts.push(controller.report_fps(fps, now));
    }
    verdicts
}

/// Runs the startup benchmark over `script` and combines it with the
/// capability probe.
///
/// Devices rejected by [`quick_reject`] skip the measurement. A script that
/// ends before the measurement window closes leaves the probe's tier as is.
#[must_use]
pub fn measure_startup<D: DeviceInfo + ?Sized>(
    device: &mut D,
    config: &PerformanceConfig,
    script: &FrameScript,
    start: HostTime,
) -> Detection {
    let mut detection = detect(device, &config.device);
    if let Some(tier) = quick_reject(&detection.signals, &config.device) {
        detection.tier = combine(detection.tier, tier);
        return detection;
    }
    let mut bench = StartupBenchmark::start(config, start);
    let result = script
        .timestamps(start)
        .find_map(|now| bench.on_frame(now));
    if let Some(result) = result {
        detection.tier = combine(detection.tier, result.tier);
    }
    detection
}

// ---------------------------------------------------------------------------
// FPS history
// ---------------------------------------------------------------------------

/// Letter grade for sustained frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmoothnessGrade {
    /// Qualifies for the high tier.
    A,
    /// Qualifies for medium.
    B,
    /// Above the soft floor.
    C,
    /// Below the soft floor.
    D,
}

impl SmoothnessGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Grades a frame rate against the tier thresholds.
    #[must_use]
    pub fn for_fps(fps: f64, thresholds: &FpsThresholds) -> Self {
        if fps >= thresholds.high {
            Self::A
        } else if fps >= thresholds.medium {
            Self::B
        } else if fps >= thresholds.min_acceptable {
            Self::C
        } else {
            Self::D
        }
    }
}

/// Rolling history of the last `N` FPS readings.
#[derive(Debug)]
pub struct FpsHistory<const N: usize> {
    readings: [f64; N],
    cursor: usize,
    len: usize,
    total: u64,
}

impl<const N: usize> Default for FpsHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FpsHistory<N> {
    /// An empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            readings: [0.0; N],
            cursor: 0,
            len: 0,
            total: 0,
        }
    }

    /// Records one reading, dropping the oldest once full.
    pub fn push(&mut self, fps: f64) {
        self.total = self.total.saturating_add(1);
        if N == 0 {
            return;
        }
        self.readings[self.cursor] = fps;
        self.cursor = (self.cursor + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    /// Readings held, at most `N`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// No readings yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Readings ever pushed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Held readings, oldest first.
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        let start = (self.cursor + N - self.len) % N.max(1);
        (0..self.len).map(move |i| self.readings[(start + i) % N])
    }

    /// The most recent reading.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.readings().last()
    }

    /// Mean of the held readings.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        Some(self.readings().sum::<f64>() / self.len as f64)
    }

    /// Grades the mean reading; `None` while empty.
    #[must_use]
    pub fn grade(&self, thresholds: &FpsThresholds) -> Option<SmoothnessGrade> {
        self.mean()
            .map(|mean| SmoothnessGrade::for_fps(mean, thresholds))
    }

    /// Returns an ASCII sparkline over the held readings, oldest first.
    #[must_use]
    pub fn sparkline_ascii(&self, min_fps: f64, max_fps: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let span = (max_fps - min_fps).max(f64::EPSILON);
        self.readings()
            .map(|fps| {
                let t = (fps.clamp(min_fps, max_fps) - min_fps) / span;
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "index is clamped to ASCII level count"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                LEVELS[level.min(LEVELS.len() - 1)] as char
            })
            .collect()
    }
}

impl<const N: usize> TraceSink for FpsHistory<N> {
    fn on_fps_sample(&mut self, e: &FpsSampleEvent) {
        self.push(e.fps);
    }
}
