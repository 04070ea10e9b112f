// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The animated gradient shown in place of, and behind, the 3D surface.
//!
//! [`FallbackSurface`] tracks the gradient's cross-fade toward the opacity the
//! [`ShellCoordinator`](crate::shell::ShellCoordinator) asks for, the fast
//! "loading" animation, and the drifting [`DotField`] that reacts to the
//! pointer.

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Size, Vec2};

use crate::shell::VisibilityState;
use crate::time::{Duration, HostTime};

/// Background-position cycle while the page is loading.
pub const LOADING_CYCLE: Duration = Duration::from_millis(5_000);
/// Background-position cycle once the page is interactive.
pub const NORMAL_CYCLE: Duration = Duration::from_millis(15_000);
/// How long the fast cycle lingers after loading ends.
pub const LOADING_LINGER: Duration = Duration::from_millis(1_000);

/// Cubic ease-in-out on `[0, 1]`.
fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ---------------------------------------------------------------------------
// FallbackSurface
// ---------------------------------------------------------------------------

/// Opacity cross-fade and animation speed for the gradient.
#[derive(Clone, Debug)]
pub struct FallbackSurface {
    from: f64,
    target: f64,
    fade_start: HostTime,
    fade_duration: Duration,
    loading: bool,
    loading_ended: Option<HostTime>,
}

impl FallbackSurface {
    /// Creates a fully opaque gradient in the loading state.
    #[must_use]
    pub fn new(fade_duration: Duration) -> Self {
        Self {
            from: 1.0,
            target: 1.0,
            fade_start: HostTime(0),
            fade_duration,
            loading: true,
            loading_ended: None,
        }
    }

    /// Starts fading from the current opacity toward `target`. Setting the
    /// same target again does not restart the fade.
    pub fn set_target(&mut self, now: HostTime, target: f64) {
        let target = target.clamp(0.0, 1.0);
        if target == self.target {
            return;
        }
        self.from = self.opacity_at(now);
        self.target = target;
        self.fade_start = now;
    }

    /// Jumps to `target` with no fade.
    pub fn snap_to(&mut self, now: HostTime, target: f64) {
        let target = target.clamp(0.0, 1.0);
        self.from = target;
        self.target = target;
        self.fade_start = now;
    }

    /// Follows the coordinator's visibility decision.
    ///
    /// Fades only while the 3D surface is shown behind the gradient.
    /// Otherwise the gradient is the only thing on screen and takes its
    /// opacity at once.
    pub fn apply(&mut self, now: HostTime, state: &VisibilityState) {
        let target = if state.fallback_visible {
            state.fallback_opacity
        } else {
            0.0
        };
        if state.render_surface_visible {
            self.set_target(now, target);
        } else {
            self.snap_to(now, target);
        }
    }

    /// Opacity at `now`, eased between the previous and target opacity.
    #[must_use]
    pub fn opacity_at(&self, now: HostTime) -> f64 {
        if self.fade_duration == Duration::ZERO {
            return self.target;
        }
        let elapsed = now.saturating_duration_since(self.fade_start).as_millis_f64();
        let t = elapsed / self.fade_duration.as_millis_f64();
        self.from + (self.target - self.from) * smoothstep(t)
    }

    /// The opacity being faded toward.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Marks the page as loading or interactive.
    pub fn set_loading(&mut self, now: HostTime, loading: bool) {
        if self.loading && !loading {
            self.loading_ended = Some(now);
        }
        if loading {
            self.loading_ended = None;
        }
        self.loading = loading;
    }

    /// Whether the page is still loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Length of one background-position cycle at `now`.
    #[must_use]
    pub fn animation_cycle(&self, now: HostTime) -> Duration {
        if self.loading {
            return LOADING_CYCLE;
        }
        match self.loading_ended {
            Some(ended) if now.saturating_duration_since(ended) < LOADING_LINGER => LOADING_CYCLE,
            _ => NORMAL_CYCLE,
        }
    }
}

// ---------------------------------------------------------------------------
// Dot field
// ---------------------------------------------------------------------------

/// A blurred colour dot on the gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientDot {
    /// Stable identifier.
    pub id: &'static str,
    /// Top-left corner as a percentage of the viewport.
    pub position_pct: Point,
    /// Diameter as a percentage of viewport width.
    pub size_vw: f64,
}

const fn dot(id: &'static str, x: f64, y: f64, size_vw: f64) -> GradientDot {
    GradientDot {
        id,
        position_pct: Point::new(x, y),
        size_vw,
    }
}

/// The ten dots of the gradient background.
pub const GRADIENT_DOTS: [GradientDot; 10] = [
    dot("d1", -10.0, 5.0, 35.0),
    dot("d2", 95.0, 95.0, 22.0),
    dot("d3", -5.0, 90.0, 20.0),
    dot("d4", 95.0, 5.0, 18.0),
    dot("d5", 50.0, 90.0, 31.0),
    dot("d6", 10.0, 60.0, 29.0),
    dot("d7", 85.0, 85.0, 23.0),
    dot("d8", 70.0, 10.0, 17.0),
    dot("d9", 65.0, 45.0, 29.5),
    dot("d10", 33.0, 22.0, 28.5),
];

/// Tuning for [`DotField`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotFieldConfig {
    /// Pointer distance (px) beyond which a dot is unaffected.
    pub influence_px: f64,
    /// Lower clamp on the normalized distance.
    pub min_distance: f64,
    /// Minimum time between accepted pointer updates.
    pub pointer_throttle: Duration,
    /// Changes in normalized distance smaller than this are ignored.
    pub distance_epsilon: f64,
    /// Drift amplitude as a percentage of viewport width.
    pub drift_vw: f64,
    /// One leg of the drift.
    pub drift_period: Duration,
}

impl DotFieldConfig {
    /// Default tuning.
    pub const DEFAULT: Self = Self {
        influence_px: 300.0,
        min_distance: 0.2,
        pointer_throttle: Duration::from_millis(50),
        distance_epsilon: 0.02,
        drift_vw: 10.0,
        drift_period: Duration::from_millis(30_000),
    };
}

/// Per-dot visual parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotStyle {
    /// Normalized pointer distance in `[min_distance, 1]`; 1 is far away.
    pub distance: f64,
    /// Scale factor, 1.0 far away up to 1.8 directly under the pointer.
    pub scale: f64,
    /// Blur radius in px, 12 far away down to 2 under the pointer.
    pub blur_px: f64,
}

impl DotStyle {
    /// Style for a normalized distance.
    #[must_use]
    pub fn from_distance(distance: f64) -> Self {
        Self {
            distance,
            scale: 1.0 + (1.0 - distance) * 0.8,
            blur_px: 10.0 * distance + 2.0,
        }
    }
}

/// Drifting dots with pointer proximity effects.
#[derive(Clone, Debug)]
pub struct DotField {
    config: DotFieldConfig,
    dots: &'static [GradientDot],
    styles: Vec<DotStyle>,
    last_pointer_update: Option<HostTime>,
}

impl DotField {
    /// Creates a field over `dots`, all at rest.
    #[must_use]
    pub fn new(config: DotFieldConfig, dots: &'static [GradientDot]) -> Self {
        Self {
            config,
            dots,
            styles: dots.iter().map(|_| DotStyle::from_distance(1.0)).collect(),
            last_pointer_update: None,
        }
    }

    /// Drift offset of dot `index` at `now`, in px for a viewport of width
    /// `viewport_width`.
    ///
    /// Each dot waits `30 s - 2 s * index` before drifting, then swings
    /// between `-drift_vw` and `+drift_vw` with an eased reverse-repeating
    /// motion.
    #[must_use]
    pub fn drift_offset(&self, index: usize, now: HostTime, viewport_width: f64) -> Vec2 {
        let delay = Duration::from_millis(30_000_u64.saturating_sub(index as u64 * 2_000));
        let started = HostTime(0).saturating_add(delay);
        if now < started || self.config.drift_period == Duration::ZERO {
            return Vec2::ZERO;
        }
        let period = self.config.drift_period.ticks();
        let elapsed = now.saturating_duration_since(started).ticks();
        let leg = elapsed / period;
        let phase = (elapsed % period) as f64 / period as f64;
        let t = if leg.is_multiple_of(2) { phase } else { 1.0 - phase };
        let vw = -self.config.drift_vw + 2.0 * self.config.drift_vw * smoothstep(t);
        let px = vw / 100.0 * viewport_width;
        Vec2::new(px, px)
    }

    /// Centre of dot `index` in px.
    #[must_use]
    pub fn dot_center(&self, index: usize, now: HostTime, viewport: Size) -> Option<Point> {
        let dot = self.dots.get(index)?;
        let diameter = dot.size_vw / 100.0 * viewport.width;
        let corner = Point::new(
            dot.position_pct.x / 100.0 * viewport.width,
            dot.position_pct.y / 100.0 * viewport.height,
        );
        Some(
            corner
                + Vec2::new(diameter / 2.0, diameter / 2.0)
                + self.drift_offset(index, now, viewport.width),
        )
    }

    /// Feeds a pointer position. Returns `false` when the update is
    /// throttled.
    pub fn pointer_moved(&mut self, now: HostTime, pointer: Point, viewport: Size) -> bool {
        if let Some(last) = self.last_pointer_update
            && now.saturating_duration_since(last) < self.config.pointer_throttle
        {
            return false;
        }
        self.last_pointer_update = Some(now);

        for index in 0..self.dots.len() {
            let Some(center) = self.dot_center(index, now, viewport) else {
                continue;
            };
            let distance = (center.distance(pointer) / self.config.influence_px)
                .clamp(self.config.min_distance, 1.0);
            let style = &mut self.styles[index];
            if (distance - style.distance).abs() >= self.config.distance_epsilon {
                *style = DotStyle::from_distance(distance);
            }
        }
        true
    }

    /// Current style of every dot, in catalog order.
    #[must_use]
    pub fn styles(&self) -> &[DotStyle] {
        &self.styles
    }

    /// The dot catalog.
    #[must_use]
    pub fn dots(&self) -> &'static [GradientDot] {
        self.dots
    }
}
