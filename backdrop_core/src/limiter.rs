// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame rate limiting.
//!
//! A [`FrameLimiter`] decides, per animation-frame callback, whether the
//! gated work runs. The session keeps two independent instances: one gating
//! the animation step and one gating FPS accounting.

use crate::config::FrameRateConfig;
use crate::tier::Tier;
use crate::time::{Duration, HostTime};

/// Whether limiting applies to `tier` under `config`.
#[must_use]
pub fn limiter_active(config: &FrameRateConfig, tier: Tier) -> bool {
    config.limit && (!config.only_limit_on_lower_tiers || tier != Tier::High)
}

/// Whether an FPS reading should be discarded as limiter noise.
///
/// A limited loop cannot report more than its target rate, so readings near
/// the target say nothing about headroom.
#[must_use]
pub fn is_limiter_bound(config: &FrameRateConfig, tier: Tier, fps: f64) -> bool {
    limiter_active(config, tier)
        && config.exclude_from_measurement
        && fps >= f64::from(config.target_fps) * config.limiter_bound_ratio
}

/// Throttles a per-frame callback to a target rate.
#[derive(Clone, Debug)]
pub struct FrameLimiter {
    interval: Duration,
    enabled: bool,
    last_run: Option<HostTime>,
}

impl FrameLimiter {
    /// Creates a limiter for `tier`.
    #[must_use]
    pub fn new(config: &FrameRateConfig, tier: Tier) -> Self {
        Self {
            interval: Duration::per_second(config.target_fps),
            enabled: limiter_active(config, tier) && config.target_fps > 0,
            last_run: None,
        }
    }

    /// Re-evaluates enablement after a tier change.
    ///
    /// The last-run timestamp is kept so a tier change does not produce a
    /// burst.
    pub fn retarget(&mut self, config: &FrameRateConfig, tier: Tier) {
        self.interval = Duration::per_second(config.target_fps);
        self.enabled = limiter_active(config, tier) && config.target_fps > 0;
    }

    /// Returns `true` if the gated work should run at `now`.
    ///
    /// When disabled this is always `true`. When enabled it is `true` for the
    /// first call and then at most once per interval.
    pub fn should_run(&mut self, now: HostTime) -> bool {
        if !self.enabled {
            return true;
        }
        match self.last_run {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }

    /// Whether the limiter currently throttles.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Forgets the last run so the next call passes.
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}
