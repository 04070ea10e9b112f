// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated degrading device that exercises the tracing and diagnostics
//! pipeline.
//!
//! A desktop starts at the high tier and slows down in three stages. Every
//! event goes to a [`PrettyPrintSink`](backdrop_debug::pretty::PrettyPrintSink),
//! a [`RecorderSink`](backdrop_debug::recorder::RecorderSink) and an
//! [`FpsHistory`]. The recording is exported as a Chrome trace and folded
//! into a JSON session report.

use std::fs::File;
use std::io::BufWriter;

use backdrop_core::config::PerformanceConfig;
use backdrop_core::time::{Duration, HostTime};
use backdrop_core::trace::{
    CapabilityEvent, FpsSampleEvent, RenderFailureEvent, RetryEvent, TierChangeEvent, TraceSink,
    Tracer, VisibilityEvent,
};
use backdrop_debug::pretty::PrettyPrintSink;
use backdrop_debug::recorder::{RecorderSink, decode};
use backdrop_debug::report::SessionReport;
use backdrop_harness::{FpsHistory, FrameScript, Replay, ScriptedSurface, SyntheticDevice};

/// Forwards every event to each sink.
struct FanOut {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
    history: FpsHistory<16>,
}

impl TraceSink for FanOut {
    fn on_capability(&mut self, e: &CapabilityEvent) {
        self.pretty.on_capability(e);
        self.recorder.on_capability(e);
    }

    fn on_fps_sample(&mut self, e: &FpsSampleEvent) {
        self.pretty.on_fps_sample(e);
        self.recorder.on_fps_sample(e);
        self.history.on_fps_sample(e);
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        self.pretty.on_tier_change(e);
        self.recorder.on_tier_change(e);
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.pretty.on_visibility(e);
        self.recorder.on_visibility(e);
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        self.pretty.on_render_failure(e);
        self.recorder.on_render_failure(e);
    }

    fn on_retry(&mut self, e: &RetryEvent) {
        self.pretty.on_retry(e);
        self.recorder.on_retry(e);
    }
}

fn secs(s: u64) -> Duration {
    Duration::from_millis(s * 1000)
}

fn main() {
    let config = PerformanceConfig::DEFAULT;
    let mut sinks = FanOut {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: RecorderSink::new(),
        history: FpsHistory::new(),
    };

    // Healthy, then sluggish (soft floor twice), then stalling (hard floor),
    // then recovered enough for the retry to hold.
    let script = FrameScript::new()
        .fps(60, secs(8))
        .fps(14, secs(12))
        .fps(5, secs(4))
        .fps(30, secs(10));

    let mut device = SyntheticDevice::DESKTOP;
    let mut replay = Replay::mount(
        &mut device,
        config,
        ScriptedSurface::default(),
        HostTime::from_millis(0),
        &mut Tracer::new(&mut sinks),
    );
    replay.run(&script, &mut Tracer::new(&mut sinks));
    replay.session_mut().unmount();

    println!(
        "fps  {} (grade {})",
        sinks.history.sparkline_ascii(0.0, 30.0),
        sinks
            .history
            .grade(&config.fps)
            .map_or("-", |g| g.as_str()),
    );
    println!("host saw {:?}", replay.updates());

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    backdrop_debug::chrome::export(sinks.recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");
    println!("Wrote {path} ({} s simulated)", script.total().as_millis() / 1000);

    // -- session report ----------------------------------------------------
    let report = SessionReport::from_events(decode(sinks.recorder.as_bytes()));
    println!(
        "{}",
        report.to_json().expect("failed to serialize session report")
    );
}
