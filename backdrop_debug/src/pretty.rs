// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use backdrop_core::time::HostTime;
use backdrop_core::trace::{
    CapabilityEvent, FpsSampleEvent, RenderFailureEvent, RetryEvent, TierChangeEvent, TraceSink,
    VisibilityEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.as_millis_f64()
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_capability(&mut self, e: &CapabilityEvent) {
        let cores = e
            .signals
            .cpu_cores
            .map_or_else(|| "?".to_owned(), |c| c.to_string());
        let memory = e
            .signals
            .device_memory_gb
            .map_or_else(|| "?".to_owned(), |m| format!("{m}GB"));
        let _ = writeln!(
            self.writer,
            "[detect] at={:.1}ms tier={} mobile={} cores={cores} memory={memory} webgl={:?}",
            ms(e.now),
            e.tier,
            e.signals.is_mobile,
            e.signals.webgl,
        );
    }

    fn on_fps_sample(&mut self, e: &FpsSampleEvent) {
        let _ = writeln!(
            self.writer,
            "[fps] at={:.1}ms fps={:.1} tier={} verdict={}",
            ms(e.now),
            e.fps,
            e.tier,
            e.verdict.as_str(),
        );
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[tier] at={:.1}ms {} -> {} cause={} attempts={}",
            ms(e.at),
            e.from,
            e.to,
            e.cause.as_str(),
            e.attempts,
        );
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        let _ = writeln!(
            self.writer,
            "[shell] at={:.1}ms phase={} mounted={} visible={} fallback={} opacity={:.2}",
            ms(e.now),
            e.phase.as_str(),
            e.state.render_surface_mounted,
            e.state.render_surface_visible,
            e.state.fallback_visible,
            e.state.fallback_opacity,
        );
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        let _ = writeln!(
            self.writer,
            "[failure] at={:.1}ms tier={} {}",
            ms(e.now),
            e.tier,
            e.failure,
        );
    }

    fn on_retry(&mut self, e: &RetryEvent) {
        let deadline = e
            .deadline
            .map_or_else(|| "-".to_owned(), |d| format!("{:.1}ms", ms(d)));
        let _ = writeln!(
            self.writer,
            "[retry] at={:.1}ms {} deadline={deadline}",
            ms(e.now),
            e.kind.as_str(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::controller::{ChangeCause, TierChange};
    use backdrop_core::tier::Tier;
    use backdrop_core::trace::RetryKind;

    #[test]
    fn pretty_print_tier_change() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let change = TierChange {
            from: Tier::High,
            to: Tier::Medium,
            cause: ChangeCause::SoftFloor,
            at: HostTime::from_millis(3_000),
        };
        sink.on_tier_change(&TierChangeEvent::new(&change, 1));
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[tier]"), "got: {output}");
        assert!(output.contains("high -> medium"), "got: {output}");
        assert!(output.contains("cause=soft-floor"), "got: {output}");
        assert!(output.contains("at=3000.0ms"), "got: {output}");
    }

    #[test]
    fn pretty_print_retry_without_deadline() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_retry(&RetryEvent {
            now: HostTime::from_millis(1),
            kind: RetryKind::Cancelled,
            deadline: None,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(output, "[retry] at=1.0ms cancelled deadline=-\n");
    }
}
