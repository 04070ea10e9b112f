// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for backdrop.
//!
//! This crate wires [`backdrop_core`] to browser APIs:
//!
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`WebDevice`]: capability probe over `navigator` and a scratch canvas
//! - [`CanvasSurface`]: WebGL context lifecycle behind a [`SceneDriver`]
//! - [`DomPresenter`]: canvas host and gradient layer styling
//! - [`PostMessageListener`] and [`TierSubscription`]: `postMessage` tier
//!   updates, sending and receiving
//! - [`WebBackground`]: all of the above, mounted on a page

#![no_std]

extern crate alloc;

mod app;
mod canvas;
mod console;
mod device;
mod message;
mod presenter;
mod raf;

use core::fmt;

pub use app::WebBackground;
pub use canvas::{CanvasSurface, ClearDriver, GlContext, SceneDriver};
pub use console::ConsoleSink;
pub use device::WebDevice;
pub use message::{PostMessageListener, TierSubscription, parse_message, update_to_js};
pub use presenter::{CYCLE_PROPERTY, DomPresenter};
pub use raf::RafLoop;

use backdrop_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}

/// Errors raised while attaching to the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendError {
    /// No `window` global.
    NoWindow,
    /// An element is not attached to a document.
    NoDocument,
    /// A DOM call threw.
    Dom,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindow => f.write_str("no window in this context"),
            Self::NoDocument => f.write_str("element has no owner document"),
            Self::Dom => f.write_str("DOM operation failed"),
        }
    }
}

impl core::error::Error for BackendError {}
