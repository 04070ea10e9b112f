// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser console logging.

use alloc::format;

use wasm_bindgen::JsValue;
use web_sys::console;

use backdrop_core::trace::{
    CapabilityEvent, RenderFailureEvent, RetryEvent, TierChangeEvent, TraceSink,
};

/// A [`TraceSink`] that logs detection, tier changes, failures and retries
/// to the browser console.
///
/// FPS readings and visibility changes are too chatty for the console and
/// are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl TraceSink for ConsoleSink {
    fn on_capability(&mut self, e: &CapabilityEvent) {
        console::log_1(&JsValue::from_str(&format!(
            "[backdrop] initial tier {} (mobile={}, cores={:?}, webgl={:?})",
            e.tier, e.signals.is_mobile, e.signals.cpu_cores, e.signals.webgl,
        )));
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        console::log_1(&JsValue::from_str(&format!(
            "[backdrop] tier {} -> {} ({})",
            e.from,
            e.to,
            e.cause.as_str(),
        )));
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        console::warn_1(&JsValue::from_str(&format!(
            "[backdrop] {} at tier {}",
            e.failure, e.tier,
        )));
    }

    fn on_retry(&mut self, e: &RetryEvent) {
        console::debug_1(&JsValue::from_str(&format!(
            "[backdrop] retry {}",
            e.kind.as_str()
        )));
    }
}
