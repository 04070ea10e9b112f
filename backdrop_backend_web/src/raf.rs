// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame source.
//!
//! The browser hands each callback a `DOMHighResTimeStamp` in milliseconds on
//! the `performance.now()` timeline; [`RafLoop`] converts it to [`HostTime`]
//! and forwards it to the session driver.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use backdrop_core::time::HostTime;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_frame(handle: i32);
}

type FrameClosure = Closure<dyn FnMut(f64)>;

struct Shared {
    // Separate from `on_frame` so the JS closure can re-request itself while
    // the callback runs.
    js: RefCell<Option<FrameClosure>>,
    on_frame: RefCell<Box<dyn FnMut(HostTime)>>,
    handle: Cell<i32>,
    delivered: Cell<u64>,
    active: Cell<bool>,
}

impl Shared {
    fn request(&self, closure: &FrameClosure) {
        self.handle.set(request_frame(closure.as_ref()));
    }
}

/// Calls a closure once per animation frame with the frame's [`HostTime`].
///
/// The loop is idle after [`RafLoop::new`]; [`RafLoop::start`] begins
/// requesting frames and [`RafLoop::stop`] cancels the pending one. Dropping
/// the loop stops it and releases the JS closure.
pub struct RafLoop {
    shared: Rc<Shared>,
}

impl RafLoop {
    /// Creates an idle loop.
    pub fn new(on_frame: impl FnMut(HostTime) + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                js: RefCell::new(None),
                on_frame: RefCell::new(Box::new(on_frame)),
                handle: Cell::new(0),
                delivered: Cell::new(0),
                active: Cell::new(false),
            }),
        }
    }

    /// Requests the first frame. Calling it on a running loop does nothing.
    pub fn start(&self) {
        if self.shared.active.replace(true) {
            return;
        }

        let shared = Rc::clone(&self.shared);
        let closure: FrameClosure = Closure::new(move |timestamp_ms: f64| {
            if !shared.active.get() {
                return;
            }
            shared.delivered.set(shared.delivered.get() + 1);
            (shared.on_frame.borrow_mut())(HostTime::from_millis_f64(timestamp_ms));

            if shared.active.get()
                && let Some(closure) = shared.js.borrow().as_ref()
            {
                shared.request(closure);
            }
        });

        self.shared.request(&closure);
        *self.shared.js.borrow_mut() = Some(closure);
    }

    /// Cancels the pending frame. The loop can be started again.
    pub fn stop(&self) {
        if self.shared.active.replace(false) {
            cancel_frame(self.shared.handle.get());
        }
    }

    /// Whether frames are being requested.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.active.get()
    }

    /// Frames delivered since creation.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.shared.delivered.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an `Rc` back to `shared`.
        self.shared.js.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.shared.active.get())
            .field("frames", &self.shared.delivered.get())
            .finish_non_exhaustive()
    }
}
