// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `window.postMessage` transport for tier updates.
//!
//! The sending side is [`PostMessageListener`], a [`TierListener`] that posts
//! `{ type: "performance-update", level }` to the window. The receiving side
//! is [`TierSubscription`], which listens for `message` events, ignores
//! anything malformed, and reports each distinct tier once.

use alloc::string::String;

use js_sys::{Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{MessageEvent, Window};

use backdrop_core::notify::{HostTierView, PerformanceUpdate, TierListener};
use backdrop_core::tier::Tier;

/// Posts tier updates to a window.
pub struct PostMessageListener {
    window: Window,
    target_origin: String,
}

impl core::fmt::Debug for PostMessageListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostMessageListener")
            .field("target_origin", &self.target_origin)
            .finish_non_exhaustive()
    }
}

impl PostMessageListener {
    /// Posts to `window` with target origin `"*"`.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self::with_target_origin(window, "*")
    }

    /// Posts to `window`, restricted to `target_origin`.
    #[must_use]
    pub fn with_target_origin(window: Window, target_origin: &str) -> Self {
        Self {
            window,
            target_origin: target_origin.into(),
        }
    }
}

impl TierListener for PostMessageListener {
    fn on_performance_update(&mut self, update: PerformanceUpdate) {
        let _ = self
            .window
            .post_message(&update_to_js(update), &self.target_origin);
    }
}

/// Builds the message object for `update`.
#[must_use]
pub fn update_to_js(update: PerformanceUpdate) -> JsValue {
    let message = Object::new();
    let _ = Reflect::set(
        &message,
        &JsValue::from_str("type"),
        &JsValue::from_str(PerformanceUpdate::TYPE),
    );
    let _ = Reflect::set(
        &message,
        &JsValue::from_str("level"),
        &JsValue::from_str(update.level.as_str()),
    );
    message.into()
}

/// Reads the `type` and `level` string fields of a message payload.
fn message_fields(data: &JsValue) -> Option<(String, String)> {
    if !data.is_object() {
        return None;
    }
    let field = |name: &str| Reflect::get(data, &JsValue::from_str(name)).ok()?.as_string();
    Some((field("type")?, field("level")?))
}

/// Parses a message payload; unknown types and levels yield `None`.
#[must_use]
pub fn parse_message(data: &JsValue) -> Option<PerformanceUpdate> {
    let (kind, level) = message_fields(data)?;
    PerformanceUpdate::from_parts(&kind, &level)
}

/// Host-side subscription to tier updates posted on a window.
///
/// The listener is removed on drop.
pub struct TierSubscription {
    window: Window,
    closure: Closure<dyn FnMut(MessageEvent)>,
}

impl core::fmt::Debug for TierSubscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TierSubscription").finish_non_exhaustive()
    }
}

impl TierSubscription {
    /// Calls `on_tier` for every valid update that changes the last-known
    /// tier.
    pub fn new(window: Window, mut on_tier: impl FnMut(Tier) + 'static) -> Self {
        let mut view = HostTierView::new();
        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some((kind, level)) = message_fields(&event.data()) else {
                return;
            };
            if let Some(tier) = view.receive(&kind, &level) {
                on_tier(tier);
            }
        });
        let _ = window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        Self { window, closure }
    }
}

impl Drop for TierSubscription {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("message", self.closure.as_ref().unchecked_ref());
    }
}
