// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility coordination between the 3D surface and the gradient.
//!
//! [`ShellCoordinator`] is a four-phase state machine driven by the active
//! tier and a virtual clock:
//!
//! ```text
//!            want 3D                    surface_ready + release timer
//!   Hidden ──────────► Entering ─────────────────────────────► Visible
//!     ▲                 │    ▲                                   │
//!     │ hide timer      │    │ want 3D                           │
//!     │                 ▼    │                                   │
//!     └──────────────── Exiting ◄────────────────────────────────┘
//!                                    no longer want 3D
//! ```
//!
//! The gradient stays at full opacity whenever the 3D surface is not both
//! mounted and visible.

use crate::config::TransitionConfig;
use crate::tier::Tier;
use crate::time::HostTime;
use crate::timer::TimerSlot;

/// Phase of the 3D surface lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfacePhase {
    /// No 3D surface; gradient only.
    Hidden,
    /// 3D surface mounted and fading in.
    Entering,
    /// 3D surface shown; gradient released.
    Visible,
    /// Gradient shown again; 3D surface awaiting unmount.
    Exiting,
}

impl SurfacePhase {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Entering => "entering",
            Self::Visible => "visible",
            Self::Exiting => "exiting",
        }
    }
}

/// What the page should show.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityState {
    /// The 3D surface is mounted.
    pub render_surface_mounted: bool,
    /// The 3D surface is shown.
    pub render_surface_visible: bool,
    /// The gradient is mounted and shown.
    pub fallback_visible: bool,
    /// Target opacity of the gradient, in `[0, 1]`.
    pub fallback_opacity: f64,
}

impl VisibilityState {
    /// Gradient only.
    pub const FALLBACK_ONLY: Self = Self {
        render_surface_mounted: false,
        render_surface_visible: false,
        fallback_visible: true,
        fallback_opacity: 1.0,
    };
}

/// Drives [`SurfacePhase`] transitions.
#[derive(Debug)]
pub struct ShellCoordinator {
    transitions: TransitionConfig,
    phase: SurfacePhase,
    surface_ready: bool,
    release: TimerSlot,
    hide: TimerSlot,
    inert: bool,
}

impl ShellCoordinator {
    /// Creates a coordinator in [`SurfacePhase::Hidden`].
    #[must_use]
    pub fn new(transitions: TransitionConfig) -> Self {
        Self {
            transitions,
            phase: SurfacePhase::Hidden,
            surface_ready: false,
            release: TimerSlot::new(),
            hide: TimerSlot::new(),
            inert: false,
        }
    }

    /// Applies the current tier. `tier` is `None` until detection finishes;
    /// `supported` is `false` when WebGL is unavailable.
    ///
    /// Due timers are processed first. Repeating the same inputs never
    /// re-arms a timer.
    pub fn update(&mut self, now: HostTime, tier: Option<Tier>, supported: bool) -> VisibilityState {
        if self.inert {
            return self.state();
        }
        self.poll_timers(now);

        let want_3d = supported && tier.is_some_and(Tier::uses_webgl);
        match (self.phase, want_3d) {
            (SurfacePhase::Hidden, true) => {
                self.phase = SurfacePhase::Entering;
                self.surface_ready = false;
            }
            (SurfacePhase::Exiting, true) => {
                self.hide.cancel();
                self.phase = SurfacePhase::Entering;
                if self.surface_ready {
                    self.release.arm(now, self.transitions.duration);
                }
            }
            (SurfacePhase::Entering | SurfacePhase::Visible, false) => {
                self.release.cancel();
                self.phase = SurfacePhase::Exiting;
                self.hide.arm(now, self.transitions.hide_delay);
            }
            _ => {}
        }
        self.state()
    }

    /// Reports that the 3D surface finished mounting.
    pub fn surface_ready(&mut self, now: HostTime) -> VisibilityState {
        if self.inert {
            return self.state();
        }
        if self.phase == SurfacePhase::Entering && !self.surface_ready {
            self.surface_ready = true;
            self.release.arm(now, self.transitions.duration);
        }
        self.state()
    }

    /// Processes due timers without new inputs.
    pub fn poll(&mut self, now: HostTime) -> VisibilityState {
        if !self.inert {
            self.poll_timers(now);
        }
        self.state()
    }

    /// Cancels every timer and stops reacting to inputs.
    pub fn unmount(&mut self) {
        self.release.cancel();
        self.hide.cancel();
        self.phase = SurfacePhase::Hidden;
        self.surface_ready = false;
        self.inert = true;
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    /// Whether [`ShellCoordinator::unmount`] has been called.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Whether any timer is pending.
    #[must_use]
    pub fn has_pending_timers(&self) -> bool {
        self.release.is_armed() || self.hide.is_armed()
    }

    /// Total timer arms so far.
    #[must_use]
    pub fn timer_arms(&self) -> u32 {
        self.release.arm_count() + self.hide.arm_count()
    }

    /// The visibility implied by the current phase.
    #[must_use]
    pub fn state(&self) -> VisibilityState {
        match self.phase {
            SurfacePhase::Hidden => VisibilityState::FALLBACK_ONLY,
            SurfacePhase::Entering if self.surface_ready => VisibilityState {
                render_surface_mounted: true,
                render_surface_visible: true,
                fallback_visible: true,
                fallback_opacity: self.transitions.dim_opacity,
            },
            SurfacePhase::Entering | SurfacePhase::Exiting => VisibilityState {
                render_surface_mounted: true,
                render_surface_visible: false,
                fallback_visible: true,
                fallback_opacity: 1.0,
            },
            SurfacePhase::Visible => VisibilityState {
                render_surface_mounted: true,
                render_surface_visible: true,
                fallback_visible: false,
                fallback_opacity: 0.0,
            },
        }
    }

    fn poll_timers(&mut self, now: HostTime) {
        if self.release.fire_if_due(now) && self.phase == SurfacePhase::Entering {
            self.phase = SurfacePhase::Visible;
        }
        if self.hide.fire_if_due(now) && self.phase == SurfacePhase::Exiting {
            self.phase = SurfacePhase::Hidden;
            self.surface_ready = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformanceConfig;

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    fn shell() -> ShellCoordinator {
        ShellCoordinator::new(PerformanceConfig::DEFAULT.transitions)
    }

    fn fallback_full_unless_surface_shown(s: &VisibilityState) {
        if !(s.render_surface_mounted && s.render_surface_visible) {
            assert!(s.fallback_visible, "fallback must be shown");
            assert_eq!(s.fallback_opacity, 1.0, "fallback must be opaque");
        }
    }

    #[test]
    fn unknown_tier_or_unsupported_stays_hidden() {
        let mut sh = shell();
        assert_eq!(sh.update(ms(0), None, true), VisibilityState::FALLBACK_ONLY);
        assert_eq!(sh.update(ms(0), Some(Tier::High), false), VisibilityState::FALLBACK_ONLY);
        assert_eq!(sh.update(ms(0), Some(Tier::Gradient), true), VisibilityState::FALLBACK_ONLY);
        assert_eq!(sh.phase(), SurfacePhase::Hidden);
    }

    #[test]
    fn enter_sequence() {
        let mut sh = shell();
        let s = sh.update(ms(0), Some(Tier::High), true);
        assert_eq!(sh.phase(), SurfacePhase::Entering);
        assert!(s.render_surface_mounted, "surface mounted on entry");
        fallback_full_unless_surface_shown(&s);
        assert!(!sh.has_pending_timers(), "nothing armed before ready");

        let s = sh.surface_ready(ms(200));
        assert!(s.render_surface_visible, "surface shown once ready");
        assert_eq!(s.fallback_opacity, 0.2);

        assert!(sh.poll(ms(1199)).fallback_visible, "fade still running");
        let s = sh.poll(ms(1200));
        assert_eq!(sh.phase(), SurfacePhase::Visible);
        assert!(!s.fallback_visible, "fallback released after the fade");
    }

    #[test]
    fn exit_sequence() {
        let mut sh = shell();
        sh.update(ms(0), Some(Tier::Medium), true);
        sh.surface_ready(ms(0));
        sh.poll(ms(1000));
        assert_eq!(sh.phase(), SurfacePhase::Visible);

        let s = sh.update(ms(5000), Some(Tier::Gradient), true);
        assert_eq!(sh.phase(), SurfacePhase::Exiting);
        assert!(s.render_surface_mounted, "surface kept until hide delay");
        fallback_full_unless_surface_shown(&s);

        let s = sh.update(ms(5500), Some(Tier::Gradient), true);
        assert_eq!(sh.phase(), SurfacePhase::Hidden);
        assert!(!s.render_surface_mounted, "surface unmounted");
    }

    #[test]
    fn exiting_returns_to_entering() {
        let mut sh = shell();
        sh.update(ms(0), Some(Tier::Low), true);
        sh.surface_ready(ms(0));
        sh.update(ms(100), Some(Tier::Gradient), true);
        assert_eq!(sh.phase(), SurfacePhase::Exiting);

        sh.update(ms(300), Some(Tier::Low), true);
        assert_eq!(sh.phase(), SurfacePhase::Entering);
        sh.poll(ms(900));
        assert_eq!(sh.phase(), SurfacePhase::Entering, "hide timer was cancelled");
        sh.poll(ms(1300));
        assert_eq!(sh.phase(), SurfacePhase::Visible);
    }

    #[test]
    fn identical_inputs_are_idempotent() {
        let mut sh = shell();
        let first = sh.update(ms(0), Some(Tier::High), true);
        sh.surface_ready(ms(10));
        let arms = sh.timer_arms();
        for t in 11..20 {
            sh.update(ms(t), Some(Tier::High), true);
            sh.surface_ready(ms(t));
        }
        assert_eq!(sh.timer_arms(), arms, "no timer re-armed");
        assert!(first.render_surface_mounted, "first update mounted");

        sh.update(ms(50), Some(Tier::Gradient), true);
        let arms = sh.timer_arms();
        sh.update(ms(60), Some(Tier::Gradient), true);
        sh.update(ms(70), Some(Tier::Gradient), true);
        assert_eq!(sh.timer_arms(), arms, "hide timer armed once");
    }

    #[test]
    fn tier_change_between_webgl_tiers_keeps_surface() {
        let mut sh = shell();
        sh.update(ms(0), Some(Tier::High), true);
        sh.surface_ready(ms(0));
        sh.poll(ms(1000));
        let s = sh.update(ms(2000), Some(Tier::Low), true);
        assert_eq!(sh.phase(), SurfacePhase::Visible);
        assert!(s.render_surface_visible, "still shown");
    }

    #[test]
    fn unmount_cancels_and_goes_inert() {
        let mut sh = shell();
        sh.update(ms(0), Some(Tier::High), true);
        sh.surface_ready(ms(0));
        sh.unmount();
        assert!(sh.is_inert(), "inert");
        assert!(!sh.has_pending_timers(), "timers cancelled");
        let s = sh.update(ms(5000), Some(Tier::High), true);
        assert_eq!(s, VisibilityState::FALLBACK_ONLY);
        assert_eq!(sh.surface_ready(ms(5000)), VisibilityState::FALLBACK_ONLY);
    }
}
