// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`DeviceInfo`] over `navigator` and a scratch canvas.

use alloc::string::String;

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{HtmlCanvasElement, Window};

use backdrop_core::capability::{
    ContextError, DeviceInfo, Orientation, WebGlVersion, is_mobile_user_agent,
};

use crate::BackendError;

/// The browser as seen by capability detection.
pub struct WebDevice {
    window: Window,
    user_agent: String,
}

impl core::fmt::Debug for WebDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebDevice")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl WebDevice {
    /// Captures the current window.
    ///
    /// # Errors
    ///
    /// [`BackendError::NoWindow`] outside a browsing context.
    pub fn new() -> Result<Self, BackendError> {
        let window = web_sys::window().ok_or(BackendError::NoWindow)?;
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        Ok(Self { window, user_agent })
    }

    /// The captured window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The raw user agent string.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Viewport orientation from `innerWidth` and `innerHeight`.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        let (width, height) = self.viewport();
        Orientation::from_viewport(width, height)
    }

    /// Viewport size in CSS pixels; zero when unavailable.
    #[must_use]
    pub fn viewport(&self) -> (f64, f64) {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    /// `window.devicePixelRatio`.
    #[must_use]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }
}

impl DeviceInfo for WebDevice {
    fn is_mobile(&self) -> bool {
        is_mobile_user_agent(&self.user_agent)
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        let cores = self.window.navigator().hardware_concurrency();
        if cores.is_nan() || cores < 1.0 {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "positive core count, saturating cast is fine"
        )]
        Some(cores as u32)
    }

    fn device_memory_gb(&self) -> Option<f64> {
        // Not exposed by web-sys; Chromium only.
        Reflect::get(&self.window.navigator(), &JsValue::from_str("deviceMemory"))
            .ok()?
            .as_f64()
            .filter(|gb| *gb > 0.0)
    }

    fn probe_context(&mut self) -> Result<WebGlVersion, ContextError> {
        let document = self.window.document().ok_or(ContextError::CreationFailed)?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|_| ContextError::CreationFailed)?
            .dyn_into()
            .map_err(|_| ContextError::CreationFailed)?;

        let strict = probe_options(true);
        if has_context(&canvas, "webgl2", &strict)? {
            return Ok(WebGlVersion::V2);
        }
        for name in ["webgl", "experimental-webgl"] {
            if has_context(&canvas, name, &strict)? {
                return Ok(WebGlVersion::V1);
            }
        }

        // Tell "no WebGL" apart from "WebGL only through a software path".
        if has_context(&canvas, "webgl", &probe_options(false))? {
            Err(ContextError::MajorPerformanceCaveat)
        } else {
            Err(ContextError::NotSupported)
        }
    }
}

fn probe_options(fail_if_caveat: bool) -> JsValue {
    let options = Object::new();
    for (key, value) in [
        ("failIfMajorPerformanceCaveat", JsValue::from_bool(fail_if_caveat)),
        ("antialias", JsValue::FALSE),
        ("alpha", JsValue::TRUE),
        ("powerPreference", JsValue::from_str("default")),
    ] {
        let _ = Reflect::set(&options, &JsValue::from_str(key), &value);
    }
    options.into()
}

fn has_context(
    canvas: &HtmlCanvasElement,
    name: &str,
    options: &JsValue,
) -> Result<bool, ContextError> {
    canvas
        .get_context_with_context_options(name, options)
        .map(|ctx| ctx.is_some())
        .map_err(|_| ContextError::CreationFailed)
}
