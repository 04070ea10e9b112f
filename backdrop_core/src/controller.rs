// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tier demotion with hysteresis and a bounded retry.
//!
//! The [`TierController`] owns the active [`Tier`] for one mounted session.
//! It consumes FPS readings through [`TierController::report_fps`] and walks
//! the tier down when throughput is too low. It never promotes on its own;
//! the only upward move is the single delayed retry from a
//! performance-caused gradient back to [`Tier::Low`].
//!
//! # Evaluation order
//!
//! For each reading:
//!
//! 1. **Cooldown.** Readings within `cooldown` of the last applied transition
//!    are ignored. With [`CooldownScope::SoftFloorOnly`] the hard floor is
//!    exempt.
//! 2. **Limiter exclusion.** Readings at or above 90% of the limiter target
//!    are measurement noise and ignored.
//! 3. **Hard floor.** Below `force_gradient` the tier jumps to gradient. Does
//!    not count as a demotion attempt.
//! 4. **Soft floor.** Below `min_acceptable` the tier steps down one rung:
//!
//!    ```text
//!    attempts >= max       -> gradient
//!    high  (no attempts)   -> medium
//!    high | medium         -> low
//!    low                   -> gradient
//!    ```
//!
//!    and the attempt counter increases.
//! 5. Otherwise nothing changes.
//!
//! # Retry
//!
//! When a performance demotion lands on gradient, and the probe found a
//! working context, and no render failure has been reported, a one-shot
//! retry is armed. When [`TierController::poll`] sees it fire with attempts
//! to spare, the tier steps back up to low and one attempt is consumed.

use crate::config::{CooldownScope, PerformanceConfig};
use crate::limiter::is_limiter_bound;
use crate::tier::Tier;
use crate::time::HostTime;
use crate::timer::TimerSlot;

/// What triggered an applied tier change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeCause {
    /// FPS below the hard floor.
    HardFloor,
    /// FPS below the soft floor.
    SoftFloor,
    /// The delayed retry after a performance-caused gradient.
    Retry,
    /// The render surface failed at runtime.
    RenderFailure,
}

impl ChangeCause {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HardFloor => "hard-floor",
            Self::SoftFloor => "soft-floor",
            Self::Retry => "retry",
            Self::RenderFailure => "render-failure",
        }
    }
}

/// Why the session is showing the gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GradientCause {
    /// The device could not create a context, or was classified too weak.
    /// Never retried.
    Unsupported,
    /// Demoted for low throughput. Eligible for one delayed retry.
    Performance,
    /// The render surface failed at runtime. Never retried.
    RenderFailure,
}

/// An applied tier transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierChange {
    /// Tier before the change.
    pub from: Tier,
    /// Tier after the change.
    pub to: Tier,
    /// Trigger.
    pub cause: ChangeCause,
    /// When the change was applied.
    pub at: HostTime,
}

/// Outcome of [`TierController::report_fps`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FpsVerdict {
    /// The reading caused a tier change.
    Applied(TierChange),
    /// Ignored: within the cooldown window.
    Cooldown,
    /// Ignored: the frame limiter caps the reading.
    LimiterBound,
    /// At or above the soft floor.
    Acceptable,
    /// Below a floor, but the tier is already where the rule would put it.
    NoChange,
    /// The controller has been shut down.
    Inert,
}

impl FpsVerdict {
    /// The applied change, if any.
    #[must_use]
    pub fn change(&self) -> Option<TierChange> {
        match self {
            Self::Applied(change) => Some(*change),
            _ => None,
        }
    }

    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied(_) => "applied",
            Self::Cooldown => "cooldown",
            Self::LimiterBound => "limiter-bound",
            Self::Acceptable => "acceptable",
            Self::NoChange => "no-change",
            Self::Inert => "inert",
        }
    }
}

/// Owns the active tier for one session.
#[derive(Debug)]
pub struct TierController {
    config: PerformanceConfig,
    tier: Tier,
    attempts: u32,
    last_transition: Option<HostTime>,
    gradient_cause: Option<GradientCause>,
    retry: TimerSlot,
    retry_allowed: bool,
    shut_down: bool,
}

impl TierController {
    /// Creates a controller starting at `initial`.
    ///
    /// `context_available` is the probe's context-creation result; without a
    /// context no retry is ever armed. A gradient start is attributed to
    /// [`GradientCause::Unsupported`].
    #[must_use]
    pub fn new(config: PerformanceConfig, initial: Tier, context_available: bool) -> Self {
        Self {
            config,
            tier: initial,
            attempts: 0,
            last_transition: None,
            gradient_cause: (initial == Tier::Gradient).then_some(GradientCause::Unsupported),
            retry: TimerSlot::new(),
            retry_allowed: context_available,
            shut_down: false,
        }
    }

    /// Feeds one FPS reading taken at `now`.
    pub fn report_fps(&mut self, fps: f64, now: HostTime) -> FpsVerdict {
        if self.shut_down {
            return FpsVerdict::Inert;
        }

        let in_cooldown = self
            .last_transition
            .is_some_and(|at| now.saturating_duration_since(at) < self.config.monitor.cooldown);
        if in_cooldown && self.config.monitor.cooldown_scope == CooldownScope::AllTransitions {
            return FpsVerdict::Cooldown;
        }

        if is_limiter_bound(&self.config.frame_rate, self.tier, fps) {
            return FpsVerdict::LimiterBound;
        }

        if fps < self.config.fps.force_gradient {
            if self.tier == Tier::Gradient {
                return FpsVerdict::NoChange;
            }
            return FpsVerdict::Applied(self.apply(Tier::Gradient, ChangeCause::HardFloor, now));
        }

        if in_cooldown {
            return FpsVerdict::Cooldown;
        }

        if fps < self.config.fps.min_acceptable {
            let target = self.soft_floor_target();
            if target == self.tier {
                return FpsVerdict::NoChange;
            }
            self.attempts = (self.attempts + 1).min(self.config.monitor.max_downgrade_attempts);
            return FpsVerdict::Applied(self.apply(target, ChangeCause::SoftFloor, now));
        }

        FpsVerdict::Acceptable
    }

    /// Fires the retry timer if it is due.
    pub fn poll(&mut self, now: HostTime) -> Option<TierChange> {
        if self.shut_down || !self.retry.fire_if_due(now) {
            return None;
        }
        if !self.retry_allowed
            || self.tier != Tier::Gradient
            || self.attempts >= self.config.monitor.max_downgrade_attempts
        {
            return None;
        }
        self.attempts += 1;
        Some(self.apply(Tier::Low, ChangeCause::Retry, now))
    }

    /// Records a runtime render failure: forces gradient immediately and
    /// disables retries for the rest of the session.
    pub fn report_render_failure(&mut self, now: HostTime) -> Option<TierChange> {
        if self.shut_down {
            return None;
        }
        self.retry_allowed = false;
        self.retry.cancel();
        let change = (self.tier != Tier::Gradient)
            .then(|| self.apply(Tier::Gradient, ChangeCause::RenderFailure, now));
        self.gradient_cause = Some(GradientCause::RenderFailure);
        change
    }

    /// Cancels the retry and makes every later call a no-op.
    pub fn shutdown(&mut self) {
        self.retry.cancel();
        self.shut_down = true;
    }

    /// The active tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Counted demotions (plus consumed retries).
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// When the last transition was applied.
    #[must_use]
    pub fn last_transition(&self) -> Option<HostTime> {
        self.last_transition
    }

    /// Why the tier is gradient, if it is.
    #[must_use]
    pub fn gradient_cause(&self) -> Option<GradientCause> {
        if self.tier == Tier::Gradient {
            self.gradient_cause
        } else {
            None
        }
    }

    /// When the pending retry fires, if one is armed.
    #[must_use]
    pub fn retry_deadline(&self) -> Option<HostTime> {
        self.retry.deadline()
    }

    /// Whether [`TierController::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    fn soft_floor_target(&self) -> Tier {
        if self.attempts >= self.config.monitor.max_downgrade_attempts {
            return Tier::Gradient;
        }
        match self.tier {
            Tier::High if self.attempts == 0 => Tier::Medium,
            Tier::High | Tier::Medium => Tier::Low,
            Tier::Low | Tier::Gradient => Tier::Gradient,
        }
    }

    fn apply(&mut self, to: Tier, cause: ChangeCause, now: HostTime) -> TierChange {
        let change = TierChange {
            from: self.tier,
            to,
            cause,
            at: now,
        };
        self.tier = to;
        self.last_transition = Some(now);

        match cause {
            ChangeCause::HardFloor | ChangeCause::SoftFloor if to == Tier::Gradient => {
                self.gradient_cause = Some(GradientCause::Performance);
                if self.retry_allowed
                    && self.attempts < self.config.monitor.max_downgrade_attempts
                {
                    self.retry.arm(now, self.config.monitor.retry_delay);
                }
            }
            _ => {
                self.retry.cancel();
            }
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::time::Duration;

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    fn controller(initial: Tier) -> TierController {
        TierController::new(PerformanceConfig::DEFAULT, initial, true)
    }

    #[test]
    fn first_report_is_never_in_cooldown() {
        let mut c = controller(Tier::High);
        let v = c.report_fps(14.0, ms(0));
        assert_eq!(
            v.change().map(|ch| (ch.from, ch.to)),
            Some((Tier::High, Tier::Medium)),
            "first slow reading demotes immediately"
        );
    }

    #[test]
    fn cooldown_enforced_between_soft_demotions() {
        let mut c = controller(Tier::High);
        c.report_fps(14.0, ms(1000));
        assert_eq!(c.report_fps(14.0, ms(5999)), FpsVerdict::Cooldown);
        assert_eq!(c.tier(), Tier::Medium);
        let v = c.report_fps(14.0, ms(6000));
        assert_eq!(v.change().map(|ch| ch.to), Some(Tier::Low), "cooldown elapsed");
    }

    #[test]
    fn hard_floor_preempts_cooldown_by_default() {
        let mut c = controller(Tier::High);
        c.report_fps(14.0, ms(0));
        let v = c.report_fps(5.0, ms(100));
        let change = v.change();
        assert_eq!(change.map(|ch| ch.to), Some(Tier::Gradient));
        assert_eq!(change.map(|ch| ch.cause), Some(ChangeCause::HardFloor));
        assert_eq!(c.attempts(), 1, "hard floor does not count as an attempt");
    }

    #[test]
    fn hard_floor_respects_cooldown_when_scoped_to_all() {
        let mut config = PerformanceConfig::DEFAULT;
        config.monitor.cooldown_scope = CooldownScope::AllTransitions;
        let mut c = TierController::new(config, Tier::High, true);
        c.report_fps(14.0, ms(0));
        assert_eq!(c.report_fps(5.0, ms(100)), FpsVerdict::Cooldown);
        assert_eq!(c.tier(), Tier::Medium);
    }

    #[test]
    fn hard_floor_wins_over_soft_floor() {
        let mut c = controller(Tier::High);
        let v = c.report_fps(11.9, ms(0));
        assert_eq!(v.change().map(|ch| ch.to), Some(Tier::Gradient), "skips the ladder");
        assert_eq!(c.gradient_cause(), Some(GradientCause::Performance));
    }

    #[test]
    fn limiter_bound_reading_is_ignored() {
        let mut c = controller(Tier::High);
        assert_eq!(c.report_fps(22.0, ms(0)), FpsVerdict::LimiterBound);
        assert_eq!(c.tier(), Tier::High);
        assert_eq!(c.last_transition(), None);
    }

    #[test]
    fn acceptable_reading_never_promotes() {
        let mut c = controller(Tier::Low);
        assert_eq!(c.report_fps(20.0, ms(0)), FpsVerdict::Acceptable);
        assert_eq!(c.tier(), Tier::Low, "no automatic promotion");
    }

    #[test]
    fn at_most_max_attempts_demotions_from_high() {
        let mut config = PerformanceConfig::DEFAULT;
        config.fps.force_gradient = 0.0;
        let mut c = TierController::new(config, Tier::High, false);
        let mut tiers = Vec::new();
        for i in 0..20 {
            if let Some(ch) = c.report_fps(14.0, ms(i * 6000)).change() {
                tiers.push(ch.to);
            }
        }
        assert_eq!(tiers, [Tier::Medium, Tier::Low, Tier::Gradient]);
        assert_eq!(c.attempts(), 3);
    }

    #[test]
    fn tier_never_increases_without_retry() {
        let mut c = TierController::new(PerformanceConfig::DEFAULT, Tier::High, false);
        let readings = [30.0, 15.0, 25.0, 11.0, 40.0, 15.0, 8.0, 60.0];
        let mut prev = c.tier();
        for (i, fps) in readings.into_iter().enumerate() {
            c.report_fps(fps, ms(i as u64 * 1000));
            c.poll(ms(i as u64 * 1000 + 500));
            assert!(c.tier() <= prev, "tier rose from {prev} to {}", c.tier());
            prev = c.tier();
        }
    }

    #[test]
    fn retry_after_performance_gradient() {
        let mut c = controller(Tier::High);
        c.report_fps(5.0, ms(0));
        assert_eq!(c.tier(), Tier::Gradient);
        assert_eq!(c.retry_deadline(), Some(ms(1500)));
        assert_eq!(c.poll(ms(1499)), None, "not yet due");

        let change = c.poll(ms(1500));
        assert_eq!(change.map(|ch| (ch.to, ch.cause)), Some((Tier::Low, ChangeCause::Retry)));
        assert_eq!(c.attempts(), 1, "retry consumes an attempt");
        assert_eq!(c.poll(ms(9000)), None, "one-shot");
    }

    #[test]
    fn retries_stop_once_attempts_are_exhausted() {
        let mut c = controller(Tier::High);
        let mut now = 0;
        let mut retries = 0;
        for _ in 0..10 {
            c.report_fps(5.0, ms(now));
            now += 1500;
            if c.poll(ms(now)).is_some() {
                retries += 1;
            }
            now += 6000;
        }
        assert_eq!(retries, 3, "each retry consumes one of three attempts");
        assert_eq!(c.tier(), Tier::Gradient);
        assert_eq!(c.retry_deadline(), None);
    }

    #[test]
    fn no_retry_without_context() {
        let mut c = TierController::new(PerformanceConfig::DEFAULT, Tier::Gradient, false);
        assert_eq!(c.gradient_cause(), Some(GradientCause::Unsupported));
        assert_eq!(c.retry_deadline(), None);
        assert_eq!(c.report_fps(5.0, ms(0)), FpsVerdict::NoChange);
        assert_eq!(c.poll(ms(10_000)), None);
    }

    #[test]
    fn render_failure_forces_gradient_and_disables_retry() {
        let mut c = controller(Tier::Medium);
        c.report_fps(14.0, ms(0));
        let change = c.report_render_failure(ms(10));
        assert_eq!(
            change.map(|ch| (ch.from, ch.to, ch.cause)),
            Some((Tier::Low, Tier::Gradient, ChangeCause::RenderFailure)),
            "bypasses cooldown"
        );
        assert_eq!(c.gradient_cause(), Some(GradientCause::RenderFailure));
        assert_eq!(c.retry_deadline(), None);
    }

    #[test]
    fn render_failure_cancels_pending_retry() {
        let mut c = controller(Tier::High);
        c.report_fps(5.0, ms(0));
        assert!(c.retry_deadline().is_some(), "retry armed");
        assert_eq!(c.report_render_failure(ms(100)), None, "already gradient");
        assert_eq!(c.gradient_cause(), Some(GradientCause::RenderFailure));
        assert_eq!(c.poll(ms(5000)), None, "retry cancelled");
    }

    #[test]
    fn shutdown_is_inert() {
        let mut c = controller(Tier::High);
        c.report_fps(5.0, ms(0));
        c.shutdown();
        assert!(c.is_shut_down(), "flag set");
        assert_eq!(c.report_fps(5.0, ms(10_000)), FpsVerdict::Inert);
        assert_eq!(c.poll(ms(10_000)), None, "stale retry never fires");
        assert_eq!(c.report_render_failure(ms(10_000)), None);
        assert_eq!(c.retry_deadline(), None);
    }

    #[test]
    fn two_demotions_for_repeated_slow_readings() {
        let mut config = PerformanceConfig::DEFAULT;
        config.fps.force_gradient = 8.0;
        let mut c = TierController::new(config, Tier::High, true);
        let changes: Vec<_> = [0, 100, 6000]
            .into_iter()
            .filter_map(|t| c.report_fps(10.0, ms(t)).change())
            .map(|ch| ch.to)
            .collect();
        assert_eq!(changes, [Tier::Medium, Tier::Low]);
        assert_eq!(c.config().monitor.cooldown, Duration::from_millis(5000));
    }
}
