// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning constants for detection, measurement and demotion.
//!
//! [`PerformanceConfig`] groups a handful of `Copy` sub-configs. Callers start
//! from [`PerformanceConfig::DEFAULT`] (or one of the presets) and override
//! individual fields; nothing is read from files at runtime.

use crate::time::Duration;

/// Per-tier frame rate thresholds used to classify a measured FPS.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsThresholds {
    /// At or above this FPS a measured device qualifies for [`Tier::High`](crate::tier::Tier::High).
    pub high: f64,
    /// At or above this FPS a measured device qualifies for medium.
    pub medium: f64,
    /// At or above this FPS a measured device qualifies for low.
    pub low: f64,
    /// Soft floor: below this the controller walks down the demotion ladder.
    pub min_acceptable: f64,
    /// Hard floor: below this the controller jumps straight to gradient.
    pub force_gradient: f64,
}

/// Which demotions the cooldown window applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CooldownScope {
    /// Only soft-floor demotions wait for the cooldown; a hard-floor reading
    /// switches to gradient immediately.
    SoftFloorOnly,
    /// Every report inside the cooldown window is ignored, hard floor
    /// included.
    AllTransitions,
}

/// Sampling and demotion timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Minimum time between FPS emissions from the sampler.
    pub check_interval: Duration,
    /// Number of frame timestamps in the sampling window.
    pub sample_size: usize,
    /// Length of the optional startup benchmark.
    pub measurement_duration: Duration,
    /// Upper bound on counted demotions per session.
    pub max_downgrade_attempts: u32,
    /// Minimum time between applied transitions.
    pub cooldown: Duration,
    /// Cooldown applicability.
    pub cooldown_scope: CooldownScope,
    /// Delay before a performance-caused gradient retries the low tier.
    pub retry_delay: Duration,
}

/// Frame rate limiting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRateConfig {
    /// Master switch for the limiter.
    pub limit: bool,
    /// Target frames per second when limiting.
    pub target_fps: u32,
    /// Only limit tiers below high.
    pub only_limit_on_lower_tiers: bool,
    /// Treat readings near the target as limiter noise rather than a
    /// performance signal.
    pub exclude_from_measurement: bool,
    /// Fraction of the target at or above which a reading counts as
    /// limiter-bound.
    pub limiter_bound_ratio: f64,
}

/// Device classification thresholds for the capability probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceThresholds {
    /// Minimum logical cores for high.
    pub min_cores_high: u32,
    /// Below this core count a device is capped at low.
    pub min_cores_medium: u32,
    /// Minimum cores for a mobile device to get a 3D scene at all.
    pub min_cores_mobile: u32,
    /// Mobile devices at or below this core count fail the benchmark quick
    /// check.
    pub force_gradient_cores_mobile: u32,
    /// Memory hint (GB) below which a device counts as low-memory.
    pub low_memory_gb: f64,
    /// Assumed cores when the browser does not report concurrency.
    pub default_cores: u32,
}

/// Bloom settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostProcessingConfig {
    /// Enable bloom on every WebGL tier, not only high.
    pub always_enable: bool,
    /// Bloom intensity.
    pub bloom_intensity: f32,
    /// Luminance threshold.
    pub bloom_threshold: f32,
    /// Luminance smoothing.
    pub bloom_smoothing: f32,
}

/// Mobile scene adjustments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MobileConfig {
    /// Vertical spread multiplier for shape positions.
    pub position_scale_y: f32,
    /// Shape size multiplier.
    pub size_multiplier: f32,
    /// Pointer influence radius on touch devices.
    pub touch_influence_radius: f32,
}

/// Cross-fade timing between the 3D surface and the gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    /// Fade duration, and the delay before the fallback is released.
    pub duration: Duration,
    /// Delay before the render surface is unmounted after switching away.
    pub hide_delay: Duration,
    /// Fallback opacity while the 3D surface is visible.
    pub dim_opacity: f64,
}

/// Complete controller configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceConfig {
    /// FPS thresholds.
    pub fps: FpsThresholds,
    /// Sampling and demotion timing.
    pub monitor: MonitorConfig,
    /// Frame rate limiting.
    pub frame_rate: FrameRateConfig,
    /// Device thresholds.
    pub device: DeviceThresholds,
    /// Bloom.
    pub post_processing: PostProcessingConfig,
    /// Mobile adjustments.
    pub mobile: MobileConfig,
    /// Cross-fade timing.
    pub transitions: TransitionConfig,
}

impl PerformanceConfig {
    /// Production defaults.
    pub const DEFAULT: Self = Self {
        fps: FpsThresholds {
            high: 22.0,
            medium: 19.0,
            low: 16.0,
            min_acceptable: 16.0,
            force_gradient: 12.0,
        },
        monitor: MonitorConfig {
            check_interval: Duration::from_millis(3000),
            sample_size: 10,
            measurement_duration: Duration::from_millis(2000),
            max_downgrade_attempts: 3,
            cooldown: Duration::from_millis(5000),
            cooldown_scope: CooldownScope::SoftFloorOnly,
            retry_delay: Duration::from_millis(1500),
        },
        frame_rate: FrameRateConfig {
            limit: true,
            target_fps: 24,
            only_limit_on_lower_tiers: false,
            exclude_from_measurement: true,
            limiter_bound_ratio: 0.9,
        },
        device: DeviceThresholds {
            min_cores_high: 6,
            min_cores_medium: 4,
            min_cores_mobile: 4,
            force_gradient_cores_mobile: 2,
            low_memory_gb: 2.0,
            default_cores: 4,
        },
        post_processing: PostProcessingConfig {
            always_enable: true,
            bloom_intensity: 15.0,
            bloom_threshold: 0.2,
            bloom_smoothing: 0.9,
        },
        mobile: MobileConfig {
            position_scale_y: 1.5,
            size_multiplier: 1.2,
            touch_influence_radius: 0.6,
        },
        transitions: TransitionConfig {
            duration: Duration::from_millis(1000),
            hide_delay: Duration::from_millis(500),
            dim_opacity: 0.2,
        },
    };

    /// Browser preset: the defaults.
    #[must_use]
    pub const fn web() -> Self {
        Self::DEFAULT
    }

    /// Desktop preset: the limiter only engages below high, so capable
    /// machines run the full scene at display rate.
    #[must_use]
    pub const fn desktop() -> Self {
        let mut config = Self::DEFAULT;
        config.frame_rate.only_limit_on_lower_tiers = true;
        config
    }

    /// FPS reading at or above which a limited loop is considered
    /// limiter-bound.
    #[must_use]
    pub fn limiter_bound_fps(&self) -> f64 {
        f64::from(self.frame_rate.target_fps) * self.frame_rate.limiter_bound_ratio
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_values() {
        let c = PerformanceConfig::default();
        assert_eq!(c.fps.force_gradient, 12.0);
        assert_eq!(c.fps.min_acceptable, 16.0);
        assert_eq!(c.monitor.check_interval, Duration::from_millis(3000));
        assert_eq!(c.monitor.sample_size, 10);
        assert_eq!(c.monitor.max_downgrade_attempts, 3);
        assert_eq!(c.monitor.cooldown_scope, CooldownScope::SoftFloorOnly);
        assert_eq!(c.frame_rate.target_fps, 24);
        assert!(c.frame_rate.limit, "limiter on by default");
    }

    #[test]
    fn limiter_bound_fps_is_ninety_percent_of_target() {
        let c = PerformanceConfig::DEFAULT;
        assert!((c.limiter_bound_fps() - 21.6).abs() < 1e-9);
    }

    #[test]
    fn desktop_preset_only_limits_lower_tiers() {
        assert!(PerformanceConfig::desktop().frame_rate.only_limit_on_lower_tiers);
        assert_eq!(PerformanceConfig::web(), PerformanceConfig::DEFAULT);
    }
}
