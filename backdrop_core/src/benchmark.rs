// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optional startup throughput benchmark.
//!
//! Counts animation frames for `measurement_duration` and classifies the
//! resulting rate with the per-tier FPS thresholds. The benchmark can only
//! lower the capability probe's recommendation, see [`combine`].

use crate::capability::{CapabilitySignals, WebGlVersion};
use crate::config::{DeviceThresholds, FpsThresholds, PerformanceConfig};
use crate::tier::Tier;
use crate::time::{Duration, HostTime};

/// Outcome of a completed benchmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchmarkResult {
    /// Measured frames per second, rounded to the nearest integer.
    pub fps: u32,
    /// Tier the measured rate qualifies for.
    pub tier: Tier,
}

/// Skips the measurement for devices that cannot qualify anyway.
///
/// Returns `Some(Tier::Gradient)` for mobile devices with at most
/// `force_gradient_cores_mobile` cores (unreported concurrency counts as
/// zero here) and for devices without WebGL.
#[must_use]
pub fn quick_reject(signals: &CapabilitySignals, thresholds: &DeviceThresholds) -> Option<Tier> {
    let cores = signals.cpu_cores.unwrap_or(0);
    if signals.is_mobile && cores <= thresholds.force_gradient_cores_mobile {
        return Some(Tier::Gradient);
    }
    if signals.webgl == WebGlVersion::None {
        return Some(Tier::Gradient);
    }
    None
}

/// Maps a measured rate to a tier.
#[must_use]
pub fn classify_fps(fps: f64, thresholds: &FpsThresholds) -> Tier {
    if fps >= thresholds.high {
        Tier::High
    } else if fps >= thresholds.medium {
        Tier::Medium
    } else if fps >= thresholds.low {
        Tier::Low
    } else {
        Tier::Gradient
    }
}

/// The probe's recommendation, lowered to the benchmark's if that is cheaper.
#[must_use]
pub fn combine(probe: Tier, benchmark: Tier) -> Tier {
    probe.min(benchmark)
}

/// Frame counter for the startup measurement.
#[derive(Clone, Debug)]
pub struct StartupBenchmark {
    started_at: HostTime,
    duration: Duration,
    thresholds: FpsThresholds,
    frames: u32,
    result: Option<BenchmarkResult>,
}

impl StartupBenchmark {
    /// Starts measuring at `now`.
    #[must_use]
    pub fn start(config: &PerformanceConfig, now: HostTime) -> Self {
        Self {
            started_at: now,
            duration: config.monitor.measurement_duration,
            thresholds: config.fps,
            frames: 0,
            result: None,
        }
    }

    /// Counts a frame. Returns the result once the measurement window has
    /// elapsed; later calls keep returning the same result.
    pub fn on_frame(&mut self, now: HostTime) -> Option<BenchmarkResult> {
        if self.result.is_some() {
            return self.result;
        }
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed < self.duration || elapsed == Duration::ZERO {
            return None;
        }
        let raw = f64::from(self.frames) * 1000.0 / elapsed.as_millis_f64();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "frame rate is non-negative and far below u32::MAX"
        )]
        let fps = (raw + 0.5) as u32;
        let result = BenchmarkResult {
            fps,
            tier: classify_fps(f64::from(fps), &self.thresholds),
        };
        self.result = Some(result);
        self.result
    }

    /// The result, if the measurement has finished.
    #[must_use]
    pub fn result(&self) -> Option<BenchmarkResult> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(mobile: bool, cores: Option<u32>, webgl: WebGlVersion) -> CapabilitySignals {
        CapabilitySignals {
            is_mobile: mobile,
            cpu_cores: cores,
            device_memory_gb: None,
            webgl,
            context_creation_succeeded: webgl != WebGlVersion::None,
        }
    }

    fn run(frame_ms: u64) -> BenchmarkResult {
        let config = PerformanceConfig::DEFAULT;
        let mut bench = StartupBenchmark::start(&config, HostTime(0));
        let mut t = 0;
        loop {
            t += frame_ms;
            if let Some(r) = bench.on_frame(HostTime::from_millis(t)) {
                return r;
            }
        }
    }

    #[test]
    fn classification_by_threshold() {
        let th = PerformanceConfig::DEFAULT.fps;
        assert_eq!(classify_fps(60.0, &th), Tier::High);
        assert_eq!(classify_fps(22.0, &th), Tier::High);
        assert_eq!(classify_fps(20.0, &th), Tier::Medium);
        assert_eq!(classify_fps(16.0, &th), Tier::Low);
        assert_eq!(classify_fps(15.9, &th), Tier::Gradient);
    }

    #[test]
    fn measures_sixty_and_twenty() {
        let fast = run(16);
        assert!(fast.fps >= 60, "16ms frames measure about 62fps, got {}", fast.fps);
        assert_eq!(fast.tier, Tier::High);

        let slow = run(50);
        assert_eq!(slow.fps, 20);
        assert_eq!(slow.tier, Tier::Medium);
    }

    #[test]
    fn result_is_sticky() {
        let config = PerformanceConfig::DEFAULT;
        let mut bench = StartupBenchmark::start(&config, HostTime(0));
        assert_eq!(bench.on_frame(HostTime::from_millis(1000)), None);
        let r = bench.on_frame(HostTime::from_millis(2000));
        assert!(r.is_some(), "window elapsed");
        assert_eq!(bench.on_frame(HostTime::from_millis(9000)), r);
        assert_eq!(bench.result(), r);
    }

    #[test]
    fn quick_reject_rules() {
        let th = PerformanceConfig::DEFAULT.device;
        assert_eq!(
            quick_reject(&signals(true, Some(2), WebGlVersion::V2), &th),
            Some(Tier::Gradient)
        );
        assert_eq!(
            quick_reject(&signals(true, None, WebGlVersion::V2), &th),
            Some(Tier::Gradient),
            "unreported cores count as zero"
        );
        assert_eq!(
            quick_reject(&signals(false, Some(8), WebGlVersion::None), &th),
            Some(Tier::Gradient)
        );
        assert_eq!(quick_reject(&signals(true, Some(8), WebGlVersion::V1), &th), None);
    }

    #[test]
    fn benchmark_only_lowers() {
        assert_eq!(combine(Tier::High, Tier::Low), Tier::Low);
        assert_eq!(combine(Tier::Low, Tier::High), Tier::Low);
    }
}
