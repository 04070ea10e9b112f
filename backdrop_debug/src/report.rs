// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable session summaries.
//!
//! [`SessionReport::from_events`] folds a decoded recording into the facts a
//! bug report needs: where the session started, every tier change, FPS
//! statistics and failure counts. [`SessionReport::to_json`] renders it with
//! `serde_json`.

use serde::Serialize;

use backdrop_core::controller::FpsVerdict;
use backdrop_core::tier::Tier;
use backdrop_core::trace::RetryKind;

use crate::recorder::RecordedEvent;

/// One applied tier change.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// When it was applied, in milliseconds.
    pub at_ms: f64,
    /// Previous tier.
    pub from: Tier,
    /// New tier.
    pub to: Tier,
    /// Trigger label.
    pub cause: &'static str,
}

/// FPS statistics over all readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FpsStats {
    /// Number of readings.
    pub samples: u32,
    /// Lowest reading.
    pub min: Option<f64>,
    /// Highest reading.
    pub max: Option<f64>,
    /// Arithmetic mean.
    pub mean: Option<f64>,
    /// Readings ignored because of the cooldown.
    pub cooldown: u32,
    /// Readings ignored because the limiter caps them.
    pub limiter_bound: u32,
}

/// Summary of one recorded session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionReport {
    /// Tier picked by detection.
    pub initial_tier: Option<Tier>,
    /// Tier after the last recorded change.
    pub final_tier: Option<Tier>,
    /// Applied changes in order.
    pub changes: Vec<ChangeRecord>,
    /// FPS statistics.
    pub fps: FpsStats,
    /// Render failures reported by the surface.
    pub render_failures: u32,
    /// Retries scheduled.
    pub retries_armed: u32,
    /// Retries that fired.
    pub retries_fired: u32,
}

impl SessionReport {
    /// Folds decoded events into a report.
    #[must_use]
    pub fn from_events(events: impl IntoIterator<Item = RecordedEvent>) -> Self {
        let mut report = Self::default();
        let mut fps_sum = 0.0;

        for event in events {
            match event {
                RecordedEvent::Capability(e) => {
                    report.initial_tier = Some(e.tier);
                    report.final_tier = Some(e.tier);
                }
                RecordedEvent::FpsSample(e) => {
                    let stats = &mut report.fps;
                    stats.samples += 1;
                    stats.min = Some(stats.min.map_or(e.fps, |m| m.min(e.fps)));
                    stats.max = Some(stats.max.map_or(e.fps, |m| m.max(e.fps)));
                    fps_sum += e.fps;
                    match e.verdict {
                        FpsVerdict::Cooldown => stats.cooldown += 1,
                        FpsVerdict::LimiterBound => stats.limiter_bound += 1,
                        _ => {}
                    }
                }
                RecordedEvent::TierChange(e) => {
                    report.changes.push(ChangeRecord {
                        at_ms: e.at.as_millis_f64(),
                        from: e.from,
                        to: e.to,
                        cause: e.cause.as_str(),
                    });
                    report.final_tier = Some(e.to);
                }
                RecordedEvent::RenderFailure(_) => report.render_failures += 1,
                RecordedEvent::Retry(e) => match e.kind {
                    RetryKind::Armed => report.retries_armed += 1,
                    RetryKind::Fired => report.retries_fired += 1,
                    RetryKind::Cancelled => {}
                },
                RecordedEvent::Visibility(_) => {}
            }
        }

        if report.fps.samples > 0 {
            report.fps.mean = Some(fps_sum / f64::from(report.fps.samples));
        }
        report
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization errors.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
