// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the adaptive controller.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! session emits: detection, FPS readings, tier changes, visibility changes,
//! render failures and retry timer activity. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::capability::{CapabilitySignals, Detection};
use crate::controller::{ChangeCause, FpsVerdict, TierChange};
use crate::shell::{SurfacePhase, VisibilityState};
use crate::surface::RenderFailure;
use crate::tier::Tier;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once at mount with the detection result.
#[derive(Clone, Copy, Debug)]
pub struct CapabilityEvent {
    /// Mount time.
    pub now: HostTime,
    /// Initial tier.
    pub tier: Tier,
    /// Signals the tier was derived from.
    pub signals: CapabilitySignals,
}

impl CapabilityEvent {
    /// Creates the event from a [`Detection`].
    #[must_use]
    pub fn new(now: HostTime, detection: &Detection) -> Self {
        Self {
            now,
            tier: detection.tier,
            signals: detection.signals,
        }
    }
}

/// Emitted for every FPS reading the sampler produces.
#[derive(Clone, Copy, Debug)]
pub struct FpsSampleEvent {
    /// When the reading was taken.
    pub now: HostTime,
    /// Measured frames per second.
    pub fps: f64,
    /// Tier the reading was taken at.
    pub tier: Tier,
    /// What the controller made of it.
    pub verdict: FpsVerdict,
}

/// Emitted for every applied tier change.
#[derive(Clone, Copy, Debug)]
pub struct TierChangeEvent {
    /// When the change was applied.
    pub at: HostTime,
    /// Previous tier.
    pub from: Tier,
    /// New tier.
    pub to: Tier,
    /// Trigger.
    pub cause: ChangeCause,
    /// Attempt counter after the change.
    pub attempts: u32,
}

impl TierChangeEvent {
    /// Creates the event from a [`TierChange`] and the controller's attempt
    /// counter.
    #[must_use]
    pub fn new(change: &TierChange, attempts: u32) -> Self {
        Self {
            at: change.at,
            from: change.from,
            to: change.to,
            cause: change.cause,
            attempts,
        }
    }
}

/// Emitted when the shell's visibility output changes.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityEvent {
    /// When the change happened.
    pub now: HostTime,
    /// New phase.
    pub phase: SurfacePhase,
    /// New visibility.
    pub state: VisibilityState,
}

/// Emitted when the render surface reports a failure.
#[derive(Clone, Copy, Debug)]
pub struct RenderFailureEvent {
    /// When the failure was reported.
    pub now: HostTime,
    /// Tier that was active.
    pub tier: Tier,
    /// What failed.
    pub failure: RenderFailure,
}

/// Retry timer activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryKind {
    /// A retry was scheduled.
    Armed,
    /// The retry fired and the tier stepped up.
    Fired,
    /// A pending retry was dropped.
    Cancelled,
}

impl RetryKind {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Armed => "armed",
            Self::Fired => "fired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Emitted on retry timer activity.
#[derive(Clone, Copy, Debug)]
pub struct RetryEvent {
    /// When it happened.
    pub now: HostTime,
    /// What happened.
    pub kind: RetryKind,
    /// The retry deadline, when one is pending.
    pub deadline: Option<HostTime>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the session.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once at mount.
    fn on_capability(&mut self, e: &CapabilityEvent) {
        _ = e;
    }

    /// Called for each FPS reading.
    fn on_fps_sample(&mut self, e: &FpsSampleEvent) {
        _ = e;
    }

    /// Called for each applied tier change.
    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        _ = e;
    }

    /// Called when visibility changes.
    fn on_visibility(&mut self, e: &VisibilityEvent) {
        _ = e;
    }

    /// Called when the render surface fails.
    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        _ = e;
    }

    /// Called on retry timer activity.
    fn on_retry(&mut self, e: &RetryEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CapabilityEvent`].
    #[inline]
    pub fn capability(&mut self, e: &CapabilityEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_capability(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`FpsSampleEvent`].
    #[inline]
    pub fn fps_sample(&mut self, e: &FpsSampleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fps_sample(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TierChangeEvent`].
    #[inline]
    pub fn tier_change(&mut self, e: &TierChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tier_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VisibilityEvent`].
    #[inline]
    pub fn visibility(&mut self, e: &VisibilityEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_visibility(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderFailureEvent`].
    #[inline]
    pub fn render_failure(&mut self, e: &RenderFailureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_failure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RetryEvent`].
    #[inline]
    pub fn retry(&mut self, e: &RetryEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_retry(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::WebGlVersion;

    fn sample_change() -> TierChange {
        TierChange {
            from: Tier::High,
            to: Tier::Medium,
            cause: ChangeCause::SoftFloor,
            at: HostTime(3_000_000),
        }
    }

    #[test]
    fn tier_change_event_new() {
        let evt = TierChangeEvent::new(&sample_change(), 1);
        assert_eq!(evt.from, Tier::High);
        assert_eq!(evt.to, Tier::Medium);
        assert_eq!(evt.at, HostTime(3_000_000));
        assert_eq!(evt.attempts, 1);
    }

    #[test]
    fn capability_event_from_detection() {
        let detection = Detection {
            tier: Tier::Low,
            signals: CapabilitySignals {
                is_mobile: true,
                cpu_cores: Some(2),
                device_memory_gb: None,
                webgl: WebGlVersion::V1,
                context_creation_succeeded: true,
            },
        };
        let evt = CapabilityEvent::new(HostTime(5), &detection);
        assert_eq!(evt.tier, Tier::Low);
        assert_eq!(evt.signals.cpu_cores, Some(2));
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tier_change(&TierChangeEvent::new(&sample_change(), 1));
        sink.on_retry(&RetryEvent {
            now: HostTime(0),
            kind: RetryKind::Armed,
            deadline: Some(HostTime(1_500_000)),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.tier_change(&TierChangeEvent::new(&sample_change(), 1));
        tracer.fps_sample(&FpsSampleEvent {
            now: HostTime(0),
            fps: 30.0,
            tier: Tier::High,
            verdict: FpsVerdict::Acceptable,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            tiers: Vec<Tier>,
        }
        impl TraceSink for RecordingSink {
            fn on_tier_change(&mut self, e: &TierChangeEvent) {
                self.tiers.push(e.to);
            }
        }

        let mut sink = RecordingSink { tiers: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.tier_change(&TierChangeEvent::new(&sample_change(), 1));
        assert_eq!(sink.tiers, &[Tier::Medium]);
    }
}
