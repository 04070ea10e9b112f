// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A complete background mounted on a page.

use alloc::rc::Rc;
use core::cell::RefCell;

use kurbo::{Point, Size};
use web_sys::{HtmlCanvasElement, HtmlElement};

use backdrop_core::capability::detect;
use backdrop_core::config::PerformanceConfig;
use backdrop_core::fallback::{DotField, DotFieldConfig, GRADIENT_DOTS};
use backdrop_core::session::BackgroundSession;
use backdrop_core::shell::SurfacePhase;
use backdrop_core::tier::Tier;
use backdrop_core::time::HostTime;
use backdrop_core::trace::Tracer;
use backdrop_render::DeviceProfile;

use crate::canvas::{CanvasSurface, SceneDriver};
use crate::console::ConsoleSink;
use crate::device::WebDevice;
use crate::message::PostMessageListener;
use crate::presenter::DomPresenter;
use crate::raf::RafLoop;
use crate::BackendError;

struct State<D> {
    session: BackgroundSession<CanvasSurface<D>, PostMessageListener>,
    presenter: DomPresenter,
    dots: DotField,
    device: WebDevice,
    sink: ConsoleSink,
}

impl<D: SceneDriver> State<D> {
    fn frame(&mut self, now: HostTime) {
        let mut tracer = Tracer::new(&mut self.sink);
        self.session.on_frame(now, &mut tracer);

        // The first drawn frame completes the mount sequence.
        if self.session.shell().phase() == SurfacePhase::Entering
            && self.session.surface().frames_since_mount() > 0
        {
            self.session.surface_ready(now, &mut tracer);
        }

        let visibility = self.session.visibility();
        self.presenter.apply(
            &visibility,
            self.session.fallback_opacity(now),
            self.session.fallback().animation_cycle(now),
        );
        if visibility.fallback_visible {
            self.presenter.apply_dots(&self.dots, now, self.viewport());
        }
    }

    fn viewport(&self) -> Size {
        let (width, height) = self.device.viewport();
        Size::new(width, height)
    }
}

/// The adaptive background running on `requestAnimationFrame`.
///
/// Dropping it stops the frame loop; call [`WebBackground::unmount`] to also
/// release the WebGL context and the gradient dots.
pub struct WebBackground<D: SceneDriver + 'static> {
    state: Rc<RefCell<State<D>>>,
    raf: RafLoop,
}

impl<D: SceneDriver + 'static> core::fmt::Debug for WebBackground<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebBackground")
            .field("tier", &self.tier())
            .field("raf", &self.raf)
            .finish_non_exhaustive()
    }
}

impl<D: SceneDriver + 'static> WebBackground<D> {
    /// Probes the device, mounts the session and starts the frame loop.
    ///
    /// `surface_host` wraps `canvas` and is what fades; `fallback` is the
    /// gradient layer. Tier updates are posted to the current window.
    ///
    /// # Errors
    ///
    /// [`BackendError::NoWindow`] outside a browsing context, or a DOM error
    /// while creating the gradient dots.
    pub fn start(
        canvas: HtmlCanvasElement,
        surface_host: HtmlElement,
        fallback: HtmlElement,
        config: PerformanceConfig,
        driver: D,
    ) -> Result<Self, BackendError> {
        let mut device = WebDevice::new()?;
        let detection = detect(&mut device, &config.device);
        let profile = DeviceProfile::new(&detection.signals, device.orientation());
        let surface = CanvasSurface::new(
            canvas,
            profile,
            config,
            device.device_pixel_ratio(),
            driver,
        );
        let listener = PostMessageListener::new(device.window().clone());

        let mut presenter = DomPresenter::new(surface_host, fallback, config.transitions.duration);
        let dots = DotField::new(DotFieldConfig::DEFAULT, &GRADIENT_DOTS);
        presenter.attach_dots(&dots)?;

        let mut sink = ConsoleSink;
        let session = BackgroundSession::mount(
            detection,
            config,
            surface,
            listener,
            crate::now(),
            &mut Tracer::new(&mut sink),
        );

        let state = Rc::new(RefCell::new(State {
            session,
            presenter,
            dots,
            device,
            sink,
        }));
        let frame_state = Rc::clone(&state);
        let raf = RafLoop::new(move |now| {
            if let Ok(mut state) = frame_state.try_borrow_mut() {
                state.frame(now);
            }
        });
        raf.start();
        Ok(Self { state, raf })
    }

    /// The active tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.state.borrow().session.tier()
    }

    /// Feeds a pointer position, in CSS pixels, to the gradient dots.
    pub fn pointer_moved(&self, x: f64, y: f64) {
        let mut state = self.state.borrow_mut();
        let viewport = state.viewport();
        state
            .dots
            .pointer_moved(crate::now(), Point::new(x, y), viewport);
    }

    /// Marks the page as loading, which speeds up the gradient.
    pub fn set_loading(&self, loading: bool) {
        self.state
            .borrow_mut()
            .session
            .set_loading(crate::now(), loading);
    }

    /// Whether the frame loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.raf.is_running()
    }

    /// Stops the frame loop, unmounts the session and removes the dots.
    pub fn unmount(&self) {
        self.raf.stop();
        let mut state = self.state.borrow_mut();
        state.session.unmount();
        state.presenter.detach_dots();
        let visibility = state.session.visibility();
        let cycle = state.session.fallback().animation_cycle(crate::now());
        state.presenter.apply(&visibility, 1.0, cycle);
    }
}
