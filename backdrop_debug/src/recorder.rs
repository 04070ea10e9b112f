// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each led by a one-byte tag. [`decode`]
//! reads them back as an iterator of [`RecordedEvent`]. Decoding stops at the
//! first unknown tag or truncated record.

use backdrop_core::capability::{CapabilitySignals, WebGlVersion};
use backdrop_core::controller::{ChangeCause, FpsVerdict, TierChange};
use backdrop_core::shell::{SurfacePhase, VisibilityState};
use backdrop_core::surface::RenderFailure;
use backdrop_core::tier::Tier;
use backdrop_core::time::HostTime;
use backdrop_core::trace::{
    CapabilityEvent, FpsSampleEvent, RenderFailureEvent, RetryEvent, RetryKind, TierChangeEvent,
    TraceSink, VisibilityEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CAPABILITY: u8 = 1;
const TAG_FPS_SAMPLE: u8 = 2;
const TAG_TIER_CHANGE: u8 = 3;
const TAG_VISIBILITY: u8 = 4;
const TAG_RENDER_FAILURE: u8 = 5;
const TAG_RETRY: u8 = 6;

const VERDICT_APPLIED: u8 = 0;
const VERDICT_COOLDOWN: u8 = 1;
const VERDICT_LIMITER_BOUND: u8 = 2;
const VERDICT_ACCEPTABLE: u8 = 3;
const VERDICT_NO_CHANGE: u8 = 4;
const VERDICT_INERT: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        self.write_bool(v.is_some());
        self.write_u32(v.unwrap_or(0));
    }

    fn write_option_f64(&mut self, v: Option<f64>) {
        self.write_bool(v.is_some());
        self.write_f64(v.unwrap_or(0.0));
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        self.write_bool(v.is_some());
        self.write_u64(v.unwrap_or(0));
    }

    fn write_tier(&mut self, tier: Tier) {
        self.write_u8(tier.code());
    }

    fn write_webgl(&mut self, v: WebGlVersion) {
        self.write_u8(match v {
            WebGlVersion::None => 0,
            WebGlVersion::V1 => 1,
            WebGlVersion::V2 => 2,
        });
    }

    fn write_cause(&mut self, c: ChangeCause) {
        self.write_u8(match c {
            ChangeCause::HardFloor => 0,
            ChangeCause::SoftFloor => 1,
            ChangeCause::Retry => 2,
            ChangeCause::RenderFailure => 3,
        });
    }

    fn write_phase(&mut self, p: SurfacePhase) {
        self.write_u8(match p {
            SurfacePhase::Hidden => 0,
            SurfacePhase::Entering => 1,
            SurfacePhase::Visible => 2,
            SurfacePhase::Exiting => 3,
        });
    }

    fn write_verdict(&mut self, v: &FpsVerdict) {
        match v {
            FpsVerdict::Applied(change) => {
                self.write_u8(VERDICT_APPLIED);
                self.write_tier(change.from);
                self.write_tier(change.to);
                self.write_cause(change.cause);
                self.write_u64(change.at.ticks());
            }
            FpsVerdict::Cooldown => self.write_u8(VERDICT_COOLDOWN),
            FpsVerdict::LimiterBound => self.write_u8(VERDICT_LIMITER_BOUND),
            FpsVerdict::Acceptable => self.write_u8(VERDICT_ACCEPTABLE),
            FpsVerdict::NoChange => self.write_u8(VERDICT_NO_CHANGE),
            FpsVerdict::Inert => self.write_u8(VERDICT_INERT),
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_capability(&mut self, e: &CapabilityEvent) {
        self.write_u8(TAG_CAPABILITY);
        self.write_u64(e.now.ticks());
        self.write_tier(e.tier);
        self.write_bool(e.signals.is_mobile);
        self.write_option_u32(e.signals.cpu_cores);
        self.write_option_f64(e.signals.device_memory_gb);
        self.write_webgl(e.signals.webgl);
        self.write_bool(e.signals.context_creation_succeeded);
    }

    fn on_fps_sample(&mut self, e: &FpsSampleEvent) {
        self.write_u8(TAG_FPS_SAMPLE);
        self.write_u64(e.now.ticks());
        self.write_f64(e.fps);
        self.write_tier(e.tier);
        self.write_verdict(&e.verdict);
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        self.write_u8(TAG_TIER_CHANGE);
        self.write_u64(e.at.ticks());
        self.write_tier(e.from);
        self.write_tier(e.to);
        self.write_cause(e.cause);
        self.write_u32(e.attempts);
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.write_u8(TAG_VISIBILITY);
        self.write_u64(e.now.ticks());
        self.write_phase(e.phase);
        self.write_bool(e.state.render_surface_mounted);
        self.write_bool(e.state.render_surface_visible);
        self.write_bool(e.state.fallback_visible);
        self.write_f64(e.state.fallback_opacity);
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        self.write_u8(TAG_RENDER_FAILURE);
        self.write_u64(e.now.ticks());
        self.write_tier(e.tier);
        self.write_u8(e.failure.code());
    }

    fn on_retry(&mut self, e: &RetryEvent) {
        self.write_u8(TAG_RETRY);
        self.write_u64(e.now.ticks());
        self.write_u8(match e.kind {
            RetryKind::Armed => 0,
            RetryKind::Fired => 1,
            RetryKind::Cancelled => 2,
        });
        self.write_option_u64(e.deadline.map(HostTime::ticks));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`CapabilityEvent`].
    Capability(CapabilityEvent),
    /// An [`FpsSampleEvent`].
    FpsSample(FpsSampleEvent),
    /// A [`TierChangeEvent`].
    TierChange(TierChangeEvent),
    /// A [`VisibilityEvent`].
    Visibility(VisibilityEvent),
    /// A [`RenderFailureEvent`].
    RenderFailure(RenderFailureEvent),
    /// A [`RetryEvent`].
    Retry(RetryEvent),
}

impl RecordedEvent {
    /// Timestamp of the event.
    #[must_use]
    pub fn timestamp(&self) -> HostTime {
        match self {
            Self::Capability(e) => e.now,
            Self::FpsSample(e) => e.now,
            Self::TierChange(e) => e.at,
            Self::Visibility(e) => e.now,
            Self::RenderFailure(e) => e.now,
            Self::Retry(e) => e.now,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_bool()?;
        let val = self.read_u32()?;
        Some(present.then_some(val))
    }

    fn read_option_f64(&mut self) -> Option<Option<f64>> {
        let present = self.read_bool()?;
        let val = self.read_f64()?;
        Some(present.then_some(val))
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_bool()?;
        let val = self.read_u64()?;
        Some(present.then_some(val))
    }

    fn read_tier(&mut self) -> Option<Tier> {
        Tier::from_code(self.read_u8()?)
    }

    fn read_webgl(&mut self) -> Option<WebGlVersion> {
        Some(match self.read_u8()? {
            0 => WebGlVersion::None,
            1 => WebGlVersion::V1,
            _ => WebGlVersion::V2,
        })
    }

    fn read_cause(&mut self) -> Option<ChangeCause> {
        Some(match self.read_u8()? {
            0 => ChangeCause::HardFloor,
            1 => ChangeCause::SoftFloor,
            2 => ChangeCause::Retry,
            _ => ChangeCause::RenderFailure,
        })
    }

    fn read_phase(&mut self) -> Option<SurfacePhase> {
        Some(match self.read_u8()? {
            0 => SurfacePhase::Hidden,
            1 => SurfacePhase::Entering,
            2 => SurfacePhase::Visible,
            _ => SurfacePhase::Exiting,
        })
    }

    fn read_verdict(&mut self) -> Option<FpsVerdict> {
        Some(match self.read_u8()? {
            VERDICT_APPLIED => FpsVerdict::Applied(TierChange {
                from: self.read_tier()?,
                to: self.read_tier()?,
                cause: self.read_cause()?,
                at: self.read_time()?,
            }),
            VERDICT_COOLDOWN => FpsVerdict::Cooldown,
            VERDICT_LIMITER_BOUND => FpsVerdict::LimiterBound,
            VERDICT_ACCEPTABLE => FpsVerdict::Acceptable,
            VERDICT_NO_CHANGE => FpsVerdict::NoChange,
            VERDICT_INERT => FpsVerdict::Inert,
            _ => return None,
        })
    }

    fn decode_capability(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Capability(CapabilityEvent {
            now: self.read_time()?,
            tier: self.read_tier()?,
            signals: CapabilitySignals {
                is_mobile: self.read_bool()?,
                cpu_cores: self.read_option_u32()?,
                device_memory_gb: self.read_option_f64()?,
                webgl: self.read_webgl()?,
                context_creation_succeeded: self.read_bool()?,
            },
        }))
    }

    fn decode_fps_sample(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FpsSample(FpsSampleEvent {
            now: self.read_time()?,
            fps: self.read_f64()?,
            tier: self.read_tier()?,
            verdict: self.read_verdict()?,
        }))
    }

    fn decode_tier_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TierChange(TierChangeEvent {
            at: self.read_time()?,
            from: self.read_tier()?,
            to: self.read_tier()?,
            cause: self.read_cause()?,
            attempts: self.read_u32()?,
        }))
    }

    fn decode_visibility(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Visibility(VisibilityEvent {
            now: self.read_time()?,
            phase: self.read_phase()?,
            state: VisibilityState {
                render_surface_mounted: self.read_bool()?,
                render_surface_visible: self.read_bool()?,
                fallback_visible: self.read_bool()?,
                fallback_opacity: self.read_f64()?,
            },
        }))
    }

    fn decode_render_failure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderFailure(RenderFailureEvent {
            now: self.read_time()?,
            tier: self.read_tier()?,
            failure: RenderFailure::from_code(self.read_u8()?)?,
        }))
    }

    fn decode_retry(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Retry(RetryEvent {
            now: self.read_time()?,
            kind: match self.read_u8()? {
                0 => RetryKind::Armed,
                1 => RetryKind::Fired,
                _ => RetryKind::Cancelled,
            },
            deadline: self.read_option_u64()?.map(HostTime),
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_CAPABILITY => self.decode_capability(),
            TAG_FPS_SAMPLE => self.decode_fps_sample(),
            TAG_TIER_CHANGE => self.decode_tier_change(),
            TAG_VISIBILITY => self.decode_visibility(),
            TAG_RENDER_FAILURE => self.decode_render_failure(),
            TAG_RETRY => self.decode_retry(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_change() -> TierChange {
        TierChange {
            from: Tier::High,
            to: Tier::Medium,
            cause: ChangeCause::SoftFloor,
            at: HostTime::from_millis(6_000),
        }
    }

    #[test]
    fn capability_keeps_optional_signals() {
        let mut rec = RecorderSink::new();
        rec.on_capability(&CapabilityEvent {
            now: HostTime(10),
            tier: Tier::Medium,
            signals: CapabilitySignals {
                is_mobile: false,
                cpu_cores: Some(4),
                device_memory_gb: None,
                webgl: WebGlVersion::V2,
                context_creation_succeeded: true,
            },
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Capability(e) => {
                assert_eq!(e.tier, Tier::Medium);
                assert_eq!(e.signals.cpu_cores, Some(4));
                assert_eq!(e.signals.device_memory_gb, None);
                assert_eq!(e.signals.webgl, WebGlVersion::V2);
            }
            other => panic!("expected Capability, got {other:?}"),
        }
    }

    #[test]
    fn applied_verdict_carries_change() {
        let mut rec = RecorderSink::new();
        rec.on_fps_sample(&FpsSampleEvent {
            now: HostTime::from_millis(6_000),
            fps: 10.0,
            tier: Tier::High,
            verdict: FpsVerdict::Applied(sample_change()),
        });
        rec.on_fps_sample(&FpsSampleEvent {
            now: HostTime::from_millis(9_000),
            fps: 22.5,
            tier: Tier::Medium,
            verdict: FpsVerdict::LimiterBound,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::FpsSample(e) => {
                assert_eq!(e.verdict.change(), Some(sample_change()));
                assert_eq!(e.fps, 10.0);
            }
            other => panic!("expected FpsSample, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::FpsSample(e) => assert_eq!(e.verdict, FpsVerdict::LimiterBound),
            other => panic!("expected FpsSample, got {other:?}"),
        }
    }

    #[test]
    fn mixed_stream_preserves_order() {
        let mut rec = RecorderSink::new();
        rec.on_tier_change(&TierChangeEvent::new(&sample_change(), 1));
        rec.on_visibility(&VisibilityEvent {
            now: HostTime(1),
            phase: SurfacePhase::Exiting,
            state: VisibilityState::FALLBACK_ONLY,
        });
        rec.on_render_failure(&RenderFailureEvent {
            now: HostTime(2),
            tier: Tier::Low,
            failure: RenderFailure::ContextLost,
        });
        rec.on_retry(&RetryEvent {
            now: HostTime(3),
            kind: RetryKind::Cancelled,
            deadline: None,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::TierChange(e) if e.attempts == 1));
        assert!(
            matches!(events[1], RecordedEvent::Visibility(e) if e.state == VisibilityState::FALLBACK_ONLY)
        );
        assert!(
            matches!(events[2], RecordedEvent::RenderFailure(e) if e.failure == RenderFailure::ContextLost)
        );
        assert!(matches!(events[3], RecordedEvent::Retry(e) if e.kind == RetryKind::Cancelled));
        assert_eq!(events[3].timestamp(), HostTime(3));
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_tier_change(&TierChangeEvent::new(&sample_change(), 1));
        rec.on_tier_change(&TierChangeEvent::new(&sample_change(), 2));
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }
}
