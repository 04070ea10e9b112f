// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One mounted background, from detection to teardown.
//!
//! [`BackgroundSession`] owns every per-mount instance (controller, sampler,
//! both limiters, shell coordinator, fallback and notifier) and is driven
//! by the animation-frame callback through [`BackgroundSession::on_frame`].
//! Nothing is shared between sessions; remounting builds a fresh one.

use crate::capability::Detection;
use crate::config::PerformanceConfig;
use crate::controller::{FpsVerdict, TierChange, TierController};
use crate::fallback::FallbackSurface;
use crate::limiter::FrameLimiter;
use crate::notify::{HostNotifier, TierListener};
use crate::sampler::FrameRateSampler;
use crate::shell::{ShellCoordinator, VisibilityState};
use crate::surface::{RenderFailure, RenderSurface};
use crate::tier::Tier;
use crate::time::HostTime;
use crate::trace::{
    CapabilityEvent, FpsSampleEvent, RenderFailureEvent, RetryEvent, RetryKind, TierChangeEvent,
    Tracer, VisibilityEvent,
};

/// Adaptive background for one page mount.
#[derive(Debug)]
pub struct BackgroundSession<S, L> {
    detection: Detection,
    controller: TierController,
    sampler: FrameRateSampler,
    animation_limiter: FrameLimiter,
    measurement_limiter: FrameLimiter,
    shell: ShellCoordinator,
    fallback: FallbackSurface,
    notifier: HostNotifier<L>,
    surface: S,
    surface_mounted: bool,
    visibility: VisibilityState,
    frames_rendered: u64,
    unmounted: bool,
}

impl<S: RenderSurface, L: TierListener> BackgroundSession<S, L> {
    /// Starts a session at the detected tier.
    ///
    /// Sends the initial notification and computes the first visibility,
    /// mounting the render surface if the tier uses WebGL.
    pub fn mount(
        detection: Detection,
        config: PerformanceConfig,
        surface: S,
        listener: L,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Self {
        let tier = detection.tier;
        let mut session = Self {
            detection,
            controller: TierController::new(
                config,
                tier,
                detection.signals.context_creation_succeeded,
            ),
            sampler: FrameRateSampler::new(
                config.monitor.sample_size,
                config.monitor.check_interval,
            ),
            animation_limiter: FrameLimiter::new(&config.frame_rate, tier),
            measurement_limiter: FrameLimiter::new(&config.frame_rate, tier),
            shell: ShellCoordinator::new(config.transitions),
            fallback: FallbackSurface::new(config.transitions.duration),
            notifier: HostNotifier::new(listener),
            surface,
            surface_mounted: false,
            visibility: VisibilityState::FALLBACK_ONLY,
            frames_rendered: 0,
            unmounted: false,
        };

        tracer.capability(&CapabilityEvent::new(now, &detection));
        session.notifier.notify(tier);
        let state = session.shell.update(now, Some(tier), session.supported());
        session.apply_visibility(now, state, tracer);
        session
    }

    /// Drives one animation-frame callback.
    pub fn on_frame(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        if self.unmounted {
            return;
        }

        if let Some(change) = self.controller.poll(now) {
            tracer.retry(&RetryEvent {
                now,
                kind: RetryKind::Fired,
                deadline: None,
            });
            self.propagate(change, now, tracer);
        }
        let state = self.shell.poll(now);
        self.apply_visibility(now, state, tracer);

        let tier = self.controller.tier();
        if !self.surface_mounted || !tier.uses_webgl() {
            return;
        }

        if self.animation_limiter.should_run(now) {
            match self.surface.render_frame(now, tier) {
                Ok(()) => self.frames_rendered += 1,
                Err(failure) => {
                    self.fail(now, failure, tracer);
                    return;
                }
            }
        }

        if !self.measurement_limiter.should_run(now) {
            return;
        }
        let Some(fps) = self.sampler.on_frame(now) else {
            return;
        };
        let verdict = self.controller.report_fps(fps, now);
        tracer.fps_sample(&FpsSampleEvent {
            now,
            fps,
            tier,
            verdict,
        });
        if let FpsVerdict::Applied(change) = verdict {
            self.propagate(change, now, tracer);
        }
    }

    /// The render surface finished its mount sequence.
    pub fn surface_ready(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        if self.unmounted {
            return;
        }
        let state = self.shell.surface_ready(now);
        self.apply_visibility(now, state, tracer);
    }

    /// Reports a failure observed outside [`BackgroundSession::on_frame`],
    /// such as a `webglcontextlost` event.
    pub fn report_render_failure(
        &mut self,
        now: HostTime,
        failure: RenderFailure,
        tracer: &mut Tracer<'_>,
    ) {
        if self.unmounted {
            return;
        }
        self.fail(now, failure, tracer);
    }

    /// Marks the page as loading or interactive.
    pub fn set_loading(&mut self, now: HostTime, loading: bool) {
        self.fallback.set_loading(now, loading);
    }

    /// Stops sampling, cancels every timer and unmounts the surface. Every
    /// later call is a no-op.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        self.controller.shutdown();
        self.shell.unmount();
        self.sampler.clear();
        if self.surface_mounted {
            self.surface.unmount();
            self.surface_mounted = false;
        }
        self.visibility = VisibilityState::FALLBACK_ONLY;
        self.unmounted = true;
    }

    /// The active tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.controller.tier()
    }

    /// The detection the session was mounted with.
    #[must_use]
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Current visibility.
    #[must_use]
    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    /// Gradient opacity at `now`, including the cross-fade.
    #[must_use]
    pub fn fallback_opacity(&self, now: HostTime) -> f64 {
        self.fallback.opacity_at(now)
    }

    /// The gradient state.
    #[must_use]
    pub fn fallback(&self) -> &FallbackSurface {
        &self.fallback
    }

    /// The tier controller.
    #[must_use]
    pub fn controller(&self) -> &TierController {
        &self.controller
    }

    /// The shell coordinator.
    #[must_use]
    pub fn shell(&self) -> &ShellCoordinator {
        &self.shell
    }

    /// The host notifier.
    #[must_use]
    pub fn notifier(&self) -> &HostNotifier<L> {
        &self.notifier
    }

    /// The render surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Whether the render surface is mounted.
    #[must_use]
    pub fn is_surface_mounted(&self) -> bool {
        self.surface_mounted
    }

    /// Frames the render surface drew successfully.
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Whether [`BackgroundSession::unmount`] has been called.
    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    fn supported(&self) -> bool {
        self.detection.signals.context_creation_succeeded
    }

    fn propagate(&mut self, change: TierChange, now: HostTime, tracer: &mut Tracer<'_>) {
        tracer.tier_change(&TierChangeEvent::new(&change, self.controller.attempts()));
        if change.to == Tier::Gradient
            && let Some(deadline) = self.controller.retry_deadline()
        {
            tracer.retry(&RetryEvent {
                now,
                kind: RetryKind::Armed,
                deadline: Some(deadline),
            });
        }

        let config = *self.controller.config();
        self.animation_limiter.retarget(&config.frame_rate, change.to);
        self.measurement_limiter.retarget(&config.frame_rate, change.to);
        self.notifier.notify(change.to);

        if self.surface_mounted
            && change.to.uses_webgl()
            && let Err(failure) = self.surface.set_tier(change.to)
        {
            self.fail(now, failure, tracer);
            return;
        }

        let state = self.shell.update(now, Some(change.to), self.supported());
        self.apply_visibility(now, state, tracer);
    }

    fn fail(&mut self, now: HostTime, failure: RenderFailure, tracer: &mut Tracer<'_>) {
        tracer.render_failure(&RenderFailureEvent {
            now,
            tier: self.controller.tier(),
            failure,
        });
        let had_retry = self.controller.retry_deadline().is_some();
        let change = self.controller.report_render_failure(now);
        if had_retry {
            tracer.retry(&RetryEvent {
                now,
                kind: RetryKind::Cancelled,
                deadline: None,
            });
        }
        if let Some(change) = change {
            self.propagate(change, now, tracer);
        }
    }

    fn apply_visibility(&mut self, now: HostTime, state: VisibilityState, tracer: &mut Tracer<'_>) {
        if state != self.visibility {
            self.visibility = state;
            tracer.visibility(&VisibilityEvent {
                now,
                phase: self.shell.phase(),
                state,
            });
        }
        self.fallback.apply(now, &state);

        let tier = self.controller.tier();
        if state.render_surface_mounted && !self.surface_mounted && tier.uses_webgl() {
            self.sampler.clear();
            self.animation_limiter.reset();
            self.measurement_limiter.reset();
            match self.surface.mount(tier) {
                Ok(()) => self.surface_mounted = true,
                Err(failure) => self.fail(now, failure, tracer),
            }
        } else if !state.render_surface_mounted && self.surface_mounted {
            self.surface.unmount();
            self.surface_mounted = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::capability::{CapabilitySignals, WebGlVersion};
    use crate::notify::PerformanceUpdate;

    #[derive(Debug, Default)]
    struct FakeSurface {
        mounts: Vec<Tier>,
        unmounts: u32,
        frames: u32,
        fail_mount: bool,
        fail_on_frame: Option<u32>,
    }

    impl RenderSurface for FakeSurface {
        fn mount(&mut self, tier: Tier) -> Result<(), RenderFailure> {
            if self.fail_mount {
                return Err(RenderFailure::ContextCreation);
            }
            self.mounts.push(tier);
            Ok(())
        }

        fn render_frame(&mut self, _now: HostTime, _tier: Tier) -> Result<(), RenderFailure> {
            self.frames += 1;
            if self.fail_on_frame == Some(self.frames) {
                return Err(RenderFailure::ContextLost);
            }
            Ok(())
        }

        fn unmount(&mut self) {
            self.unmounts += 1;
        }
    }

    type Updates = Vec<Tier>;

    fn detection(tier: Tier, context: bool) -> Detection {
        Detection {
            tier,
            signals: CapabilitySignals {
                is_mobile: false,
                cpu_cores: Some(8),
                device_memory_gb: None,
                webgl: if context {
                    WebGlVersion::V2
                } else {
                    WebGlVersion::None
                },
                context_creation_succeeded: context,
            },
        }
    }

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    fn run(
        session: &mut BackgroundSession<FakeSurface, impl TierListener>,
        from_ms: u64,
        to_ms: u64,
        step_ms: u64,
    ) {
        let mut t = from_ms;
        while t <= to_ms {
            session.on_frame(ms(t), &mut Tracer::none());
            t += step_ms;
        }
    }

    #[test]
    fn unsupported_device_shows_gradient_without_retry() {
        let mut updates = Updates::new();
        let mut s = BackgroundSession::mount(
            detection(Tier::Gradient, false),
            PerformanceConfig::DEFAULT,
            FakeSurface::default(),
            |u: PerformanceUpdate| updates.push(u.level),
            ms(0),
            &mut Tracer::none(),
        );
        assert_eq!(s.visibility(), VisibilityState::FALLBACK_ONLY);
        assert!(!s.is_surface_mounted(), "no surface without WebGL");
        run(&mut s, 0, 20_000, 16);
        assert_eq!(s.controller().retry_deadline(), None);
        assert!(s.surface().mounts.is_empty(), "never mounted");
        assert_eq!(updates, [Tier::Gradient]);
    }

    #[test]
    fn healthy_device_stays_high_with_one_notification() {
        let mut updates = Updates::new();
        let mut s = BackgroundSession::mount(
            detection(Tier::High, true),
            PerformanceConfig::DEFAULT,
            FakeSurface::default(),
            |u: PerformanceUpdate| updates.push(u.level),
            ms(0),
            &mut Tracer::none(),
        );
        assert!(s.is_surface_mounted(), "surface mounted on entry");
        s.surface_ready(ms(100), &mut Tracer::none());
        // Frames just slower than the limiter interval read as limiter-bound.
        run(&mut s, 0, 15_000, 42);
        assert_eq!(s.tier(), Tier::High);
        assert!(s.frames_rendered() > 300, "rendered {}", s.frames_rendered());
        assert!(!s.visibility().fallback_visible, "fallback released");
        assert_eq!(updates, [Tier::High]);
    }

    #[test]
    fn slow_device_walks_down_the_ladder() {
        let mut updates = Updates::new();
        let mut config = PerformanceConfig::DEFAULT;
        config.fps.force_gradient = 8.0;
        let mut s = BackgroundSession::mount(
            detection(Tier::High, true),
            config,
            FakeSurface::default(),
            |u: PerformanceUpdate| updates.push(u.level),
            ms(0),
            &mut Tracer::none(),
        );
        s.surface_ready(ms(0), &mut Tracer::none());
        // 10fps: first reading at 3s demotes, 6s is in cooldown, 9s demotes.
        run(&mut s, 0, 9_000, 100);
        assert_eq!(s.tier(), Tier::Low);
        assert_eq!(s.controller().attempts(), 2);
        assert_eq!(s.surface().mounts, [Tier::High], "scene re-tiered, not remounted");
        assert_eq!(updates, [Tier::High, Tier::Medium, Tier::Low]);
    }

    #[test]
    fn hard_floor_retries_low_after_delay() {
        let mut s = BackgroundSession::mount(
            detection(Tier::High, true),
            PerformanceConfig::DEFAULT,
            FakeSurface::default(),
            |_: PerformanceUpdate| {},
            ms(0),
            &mut Tracer::none(),
        );
        s.surface_ready(ms(0), &mut Tracer::none());
        // 5fps frames trip the hard floor at the first check.
        run(&mut s, 0, 3_000, 200);
        assert_eq!(s.tier(), Tier::Gradient);
        assert!(s.visibility().fallback_visible, "gradient shown immediately");
        assert_eq!(s.fallback().target(), 1.0);

        run(&mut s, 3_200, 4_400, 200);
        assert!(!s.is_surface_mounted(), "surface unmounted after hide delay");

        s.on_frame(ms(4_500), &mut Tracer::none());
        assert_eq!(s.tier(), Tier::Low, "retry fired 1500ms after demotion");
        assert!(s.is_surface_mounted(), "surface remounted for the retry");
        assert_eq!(s.surface().mounts, [Tier::High, Tier::Low]);
    }

    #[test]
    fn surface_leaves_only_behind_an_opaque_gradient() {
        let mut s = BackgroundSession::mount(
            detection(Tier::High, true),
            PerformanceConfig::DEFAULT,
            FakeSurface::default(),
            |_: PerformanceUpdate| {},
            ms(0),
            &mut Tracer::none(),
        );
        s.surface_ready(ms(0), &mut Tracer::none());
        run(&mut s, 0, 2_992, 16);
        assert!(!s.visibility().fallback_visible, "3D shown");
        assert_eq!(s.fallback_opacity(ms(2_992)), 0.0);

        s.report_render_failure(ms(3_000), RenderFailure::ContextLost, &mut Tracer::none());
        let mut t = 3_000;
        while s.is_surface_mounted() {
            t += 16;
            assert!(t < 10_000, "surface never unmounted");
            s.on_frame(ms(t), &mut Tracer::none());
            assert_eq!(s.fallback_opacity(ms(t)), 1.0, "gradient opaque at {t}ms");
        }
        assert!(t >= 3_500, "unmounted after the hide delay, at {t}ms");
    }

    #[test]
    fn runtime_failure_forces_gradient_for_good() {
        let mut updates = Updates::new();
        let surface = FakeSurface {
            fail_on_frame: Some(10),
            ..FakeSurface::default()
        };
        let mut s = BackgroundSession::mount(
            detection(Tier::Medium, true),
            PerformanceConfig::DEFAULT,
            surface,
            |u: PerformanceUpdate| updates.push(u.level),
            ms(0),
            &mut Tracer::none(),
        );
        s.surface_ready(ms(0), &mut Tracer::none());
        run(&mut s, 0, 30_000, 50);
        assert_eq!(s.tier(), Tier::Gradient);
        assert_eq!(s.surface().frames, 10, "no frames after the failure");
        assert_eq!(s.controller().retry_deadline(), None);
        assert_eq!(s.surface().unmounts, 1);
        assert_eq!(updates, [Tier::Medium, Tier::Gradient]);
    }

    #[test]
    fn mount_failure_falls_back() {
        let surface = FakeSurface {
            fail_mount: true,
            ..FakeSurface::default()
        };
        let mut s = BackgroundSession::mount(
            detection(Tier::High, true),
            PerformanceConfig::DEFAULT,
            surface,
            |_: PerformanceUpdate| {},
            ms(0),
            &mut Tracer::none(),
        );
        assert_eq!(s.tier(), Tier::Gradient);
        assert!(!s.is_surface_mounted(), "mount failed");
        run(&mut s, 0, 10_000, 16);
        assert_eq!(s.visibility(), VisibilityState::FALLBACK_ONLY);
    }

    #[test]
    fn unmount_is_final() {
        let mut s = BackgroundSession::mount(
            detection(Tier::High, true),
            PerformanceConfig::DEFAULT,
            FakeSurface::default(),
            |_: PerformanceUpdate| {},
            ms(0),
            &mut Tracer::none(),
        );
        s.surface_ready(ms(0), &mut Tracer::none());
        run(&mut s, 0, 3_000, 200);
        assert!(s.controller().retry_deadline().is_some(), "retry pending");

        s.unmount();
        assert!(s.is_unmounted(), "unmounted");
        assert_eq!(s.surface().unmounts, 1);
        assert!(!s.shell().has_pending_timers(), "shell timers cancelled");
        assert_eq!(s.controller().retry_deadline(), None);

        let frames = s.surface().frames;
        run(&mut s, 3_000, 20_000, 16);
        s.surface_ready(ms(20_000), &mut Tracer::none());
        s.unmount();
        assert_eq!(s.surface().frames, frames, "inert after unmount");
        assert_eq!(s.tier(), Tier::Gradient);
        assert_eq!(s.surface().unmounts, 1, "second unmount is a no-op");
    }
}
