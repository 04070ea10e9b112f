// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! FPS readings and the active tier become counter tracks; everything else is
//! an instant event.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host times are already in microseconds and are written unchanged.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Capability(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Capability",
                    "cat": "Probe",
                    "ts": e.now.ticks(),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tier": e.tier.as_str(),
                        "mobile": e.signals.is_mobile,
                        "cpu_cores": e.signals.cpu_cores,
                        "device_memory_gb": e.signals.device_memory_gb,
                        "webgl": format!("{:?}", e.signals.webgl),
                        "context": e.signals.context_creation_succeeded,
                    }
                }));
                events.push(tier_counter(e.now.ticks(), e.tier.code()));
            }
            RecordedEvent::FpsSample(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "fps",
                    "cat": "Sampler",
                    "ts": e.now.ticks(),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "fps": e.fps,
                    }
                }));
                events.push(json!({
                    "ph": "i",
                    "name": "FpsVerdict",
                    "cat": "Controller",
                    "ts": e.now.ticks(),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "tier": e.tier.as_str(),
                        "verdict": e.verdict.as_str(),
                    }
                }));
            }
            RecordedEvent::TierChange(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "TierChange",
                    "cat": "Controller",
                    "ts": e.at.ticks(),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "from": e.from.as_str(),
                        "to": e.to.as_str(),
                        "cause": e.cause.as_str(),
                        "attempts": e.attempts,
                    }
                }));
                events.push(tier_counter(e.at.ticks(), e.to.code()));
            }
            RecordedEvent::Visibility(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Visibility",
                    "cat": "Shell",
                    "ts": e.now.ticks(),
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "phase": e.phase.as_str(),
                        "mounted": e.state.render_surface_mounted,
                        "visible": e.state.render_surface_visible,
                        "fallback": e.state.fallback_visible,
                        "fallback_opacity": e.state.fallback_opacity,
                    }
                }));
            }
            RecordedEvent::RenderFailure(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RenderFailure",
                    "cat": "Surface",
                    "ts": e.now.ticks(),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tier": e.tier.as_str(),
                        "failure": e.failure.as_str(),
                    }
                }));
            }
            RecordedEvent::Retry(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Retry",
                    "cat": "Controller",
                    "ts": e.now.ticks(),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "kind": e.kind.as_str(),
                        "deadline_us": e.deadline.map(|d| d.ticks()),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn tier_counter(ts: u64, code: u8) -> Value {
    json!({
        "ph": "C",
        "name": "tier",
        "cat": "Controller",
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "args": {
            "tier": code,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use backdrop_core::controller::{ChangeCause, FpsVerdict, TierChange};
    use backdrop_core::tier::Tier;
    use backdrop_core::time::HostTime;
    use backdrop_core::trace::{FpsSampleEvent, TierChangeEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let change = TierChange {
            from: Tier::High,
            to: Tier::Medium,
            cause: ChangeCause::SoftFloor,
            at: HostTime::from_millis(3_000),
        };
        let mut rec = RecorderSink::new();
        rec.on_fps_sample(&FpsSampleEvent {
            now: HostTime::from_millis(3_000),
            fps: 14.0,
            tier: Tier::High,
            verdict: FpsVerdict::Applied(change),
        });
        rec.on_tier_change(&TierChangeEvent::new(&change, 1));

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        // FPS counter, then the verdict instant.
        assert_eq!(parsed[0]["ph"], "C");
        assert_eq!(parsed[0]["args"]["fps"], 14.0);
        assert_eq!(parsed[1]["args"]["verdict"], "applied");

        // Tier change instant, then the tier counter.
        assert_eq!(parsed[2]["name"], "TierChange");
        assert_eq!(parsed[2]["args"]["to"], "medium");
        assert_eq!(parsed[2]["ts"], 3_000_000);
        assert_eq!(parsed[3]["args"]["tier"], 2);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
