// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for the 3D render surface.
//!
//! The core never touches WebGL. A render surface is anything that can mount
//! a scene for a [`Tier`], draw frames, and be torn down. The browser backend
//! implements it over a canvas; tests use in-memory doubles.
//!
//! Failures are reported as [`RenderFailure`] and never escape the session:
//! [`BackgroundSession`](crate::session::BackgroundSession) converts them into
//! a forced gradient via
//! [`TierController::report_render_failure`](crate::controller::TierController::report_render_failure).
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! fn on_animation_frame(timestamp_ms: f64) {
//!     let now = HostTime::from_millis_f64(timestamp_ms);
//!     // Polls timers, renders behind the animation limiter, samples FPS
//!     // behind the measurement limiter and applies tier changes.
//!     session.on_frame(now, &mut tracer);
//!     presenter.apply(session.visibility(), session.fallback_opacity(now));
//! }
//! ```

use core::fmt;

use crate::tier::Tier;
use crate::time::HostTime;

/// A runtime failure of the render surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderFailure {
    /// The WebGL context could not be created at mount.
    ContextCreation,
    /// The browser dropped the context.
    ContextLost,
    /// Scene construction or drawing threw.
    Scene,
}

impl RenderFailure {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContextCreation => "context-creation",
            Self::ContextLost => "context-lost",
            Self::Scene => "scene",
        }
    }

    /// Compact numeric code, used by binary trace records.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::ContextCreation => 0,
            Self::ContextLost => 1,
            Self::Scene => 2,
        }
    }

    /// Inverse of [`RenderFailure::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ContextCreation),
            1 => Some(Self::ContextLost),
            2 => Some(Self::Scene),
            _ => None,
        }
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextCreation => write!(f, "failed to create a WebGL context"),
            Self::ContextLost => write!(f, "the WebGL context was lost"),
            Self::Scene => write!(f, "the 3D scene failed to render"),
        }
    }
}

impl core::error::Error for RenderFailure {}

/// A mountable 3D scene.
pub trait RenderSurface {
    /// Builds the scene for `tier`. Only called with tiers that use WebGL.
    fn mount(&mut self, tier: Tier) -> Result<(), RenderFailure>;

    /// Re-parametrizes a mounted scene after a tier change between WebGL
    /// tiers.
    fn set_tier(&mut self, tier: Tier) -> Result<(), RenderFailure> {
        _ = tier;
        Ok(())
    }

    /// Advances and draws one frame.
    fn render_frame(&mut self, now: HostTime, tier: Tier) -> Result<(), RenderFailure>;

    /// Tears the scene down. Never fails.
    fn unmount(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            alloc::format!("{}", RenderFailure::ContextLost),
            "the WebGL context was lost"
        );
        assert_eq!(RenderFailure::Scene.as_str(), "scene");
    }

    #[test]
    fn codes_round_trip() {
        for f in [
            RenderFailure::ContextCreation,
            RenderFailure::ContextLost,
            RenderFailure::Scene,
        ] {
            assert_eq!(RenderFailure::from_code(f.code()), Some(f));
        }
        assert_eq!(RenderFailure::from_code(7), None);
    }
}
