// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`RenderSurface`] over an HTML canvas.
//!
//! [`CanvasSurface`] owns the WebGL context lifecycle: it resolves a
//! [`ScenePlan`] for the tier, creates the context with the plan's settings,
//! sizes the drawing buffer, watches for `webglcontextlost`, and hands the
//! context to a [`SceneDriver`] that builds and draws the actual scene.

use alloc::rc::Rc;
use core::cell::Cell;

use js_sys::{Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Event, HtmlCanvasElement, WebGl2RenderingContext, WebGlRenderingContext};

use backdrop_core::config::PerformanceConfig;
use backdrop_core::surface::{RenderFailure, RenderSurface};
use backdrop_core::tier::Tier;
use backdrop_core::time::HostTime;
use backdrop_render::{DeviceProfile, RendererSettings, ScenePlan};

/// A live WebGL context.
#[derive(Clone, Debug)]
pub enum GlContext {
    /// `webgl2`.
    WebGl2(WebGl2RenderingContext),
    /// `webgl`.
    WebGl(WebGlRenderingContext),
}

impl GlContext {
    fn create(canvas: &HtmlCanvasElement, settings: &RendererSettings) -> Result<Self, RenderFailure> {
        let options = context_options(settings);
        let get = |name: &str| {
            canvas
                .get_context_with_context_options(name, &options)
                .map_err(|_| RenderFailure::ContextCreation)
        };
        if let Some(ctx) = get("webgl2")? {
            return ctx
                .dyn_into()
                .map(Self::WebGl2)
                .map_err(|_| RenderFailure::ContextCreation);
        }
        get("webgl")?
            .ok_or(RenderFailure::ContextCreation)?
            .dyn_into()
            .map(Self::WebGl)
            .map_err(|_| RenderFailure::ContextCreation)
    }

    /// Whether the browser dropped the context.
    #[must_use]
    pub fn is_context_lost(&self) -> bool {
        match self {
            Self::WebGl2(gl) => gl.is_context_lost(),
            Self::WebGl(gl) => gl.is_context_lost(),
        }
    }

    /// Sets the viewport to the full drawing buffer.
    pub fn viewport(&self, width: i32, height: i32) {
        match self {
            Self::WebGl2(gl) => gl.viewport(0, 0, width, height),
            Self::WebGl(gl) => gl.viewport(0, 0, width, height),
        }
    }

    /// Clears color and depth.
    pub fn clear(&self, [r, g, b, a]: [f32; 4]) {
        match self {
            Self::WebGl2(gl) => {
                gl.clear_color(r, g, b, a);
                gl.clear(
                    WebGl2RenderingContext::COLOR_BUFFER_BIT
                        | WebGl2RenderingContext::DEPTH_BUFFER_BIT,
                );
            }
            Self::WebGl(gl) => {
                gl.clear_color(r, g, b, a);
                gl.clear(
                    WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT,
                );
            }
        }
    }
}

fn context_options(settings: &RendererSettings) -> JsValue {
    let options = Object::new();
    for (key, value) in [
        ("antialias", JsValue::from_bool(settings.antialias)),
        ("alpha", JsValue::TRUE),
        ("depth", JsValue::TRUE),
        ("stencil", JsValue::FALSE),
        ("powerPreference", JsValue::from_str("default")),
        ("failIfMajorPerformanceCaveat", JsValue::FALSE),
        ("preserveDrawingBuffer", JsValue::FALSE),
    ] {
        let _ = Reflect::set(&options, &JsValue::from_str(key), &value);
    }
    options.into()
}

/// Builds and draws a scene into a [`GlContext`].
pub trait SceneDriver {
    /// Creates GPU resources for `plan`. Also called after a tier change
    /// between WebGL tiers.
    fn build(&mut self, gl: &GlContext, plan: &ScenePlan) -> Result<(), RenderFailure>;

    /// Draws one frame.
    fn draw(&mut self, gl: &GlContext, plan: &ScenePlan, now: HostTime) -> Result<(), RenderFailure>;

    /// Releases GPU resources.
    fn teardown(&mut self) {}
}

/// A driver that only clears the canvas to transparent black.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClearDriver;

impl SceneDriver for ClearDriver {
    fn build(&mut self, _gl: &GlContext, _plan: &ScenePlan) -> Result<(), RenderFailure> {
        Ok(())
    }

    fn draw(&mut self, gl: &GlContext, _plan: &ScenePlan, _now: HostTime) -> Result<(), RenderFailure> {
        gl.clear([0.0; 4]);
        Ok(())
    }
}

struct Mounted {
    gl: GlContext,
    plan: ScenePlan,
    lost: Rc<Cell<bool>>,
    on_lost: Closure<dyn FnMut(Event)>,
    frames: u64,
}

/// A [`RenderSurface`] drawing into an existing `<canvas>`.
pub struct CanvasSurface<D> {
    canvas: HtmlCanvasElement,
    device: DeviceProfile,
    config: PerformanceConfig,
    device_pixel_ratio: f64,
    driver: D,
    mounted: Option<Mounted>,
}

impl<D> core::fmt::Debug for CanvasSurface<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasSurface")
            .field("device", &self.device)
            .field("mounted", &self.mounted.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: SceneDriver> CanvasSurface<D> {
    /// Creates an unmounted surface over `canvas`.
    pub fn new(
        canvas: HtmlCanvasElement,
        device: DeviceProfile,
        config: PerformanceConfig,
        device_pixel_ratio: f64,
        driver: D,
    ) -> Self {
        Self {
            canvas,
            device,
            config,
            device_pixel_ratio,
            driver,
            mounted: None,
        }
    }

    /// The plan of the mounted scene.
    #[must_use]
    pub fn plan(&self) -> Option<&ScenePlan> {
        self.mounted.as_ref().map(|m| &m.plan)
    }

    /// Frames drawn since the scene was mounted; zero when unmounted.
    #[must_use]
    pub fn frames_since_mount(&self) -> u64 {
        self.mounted.as_ref().map_or(0, |m| m.frames)
    }

    /// The canvas.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// The scene driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Updates the device pixel ratio and resizes the drawing buffer.
    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f64) {
        self.device_pixel_ratio = device_pixel_ratio;
        if let Some(m) = &self.mounted {
            resize(&self.canvas, &m.gl, &m.plan.renderer, device_pixel_ratio);
        }
    }

    fn plan_for(&self, tier: Tier) -> Result<ScenePlan, RenderFailure> {
        ScenePlan::for_tier(tier, self.device, &self.config).ok_or(RenderFailure::Scene)
    }
}

fn resize(canvas: &HtmlCanvasElement, gl: &GlContext, settings: &RendererSettings, dpr: f64) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pixel ratios are small"
    )]
    let ratio = f64::from(settings.clamp_dpr(dpr as f32));
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "canvas sizes are small non-negative pixel counts"
    )]
    let scaled = |css: i32| (f64::from(css.max(0)) * ratio).round() as u32;
    let width = scaled(canvas.client_width());
    let height = scaled(canvas.client_height());
    canvas.set_width(width);
    canvas.set_height(height);
    gl.viewport(
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    );
}

impl<D: SceneDriver> RenderSurface for CanvasSurface<D> {
    fn mount(&mut self, tier: Tier) -> Result<(), RenderFailure> {
        if self.mounted.is_some() {
            self.unmount();
        }
        let plan = self.plan_for(tier)?;
        let gl = GlContext::create(&self.canvas, &plan.renderer)?;
        resize(&self.canvas, &gl, &plan.renderer, self.device_pixel_ratio);
        self.driver.build(&gl, &plan)?;

        let lost = Rc::new(Cell::new(false));
        let flag = Rc::clone(&lost);
        let on_lost = Closure::<dyn FnMut(Event)>::new(move |_: Event| flag.set(true));
        let _ = self
            .canvas
            .add_event_listener_with_callback("webglcontextlost", on_lost.as_ref().unchecked_ref());

        self.mounted = Some(Mounted {
            gl,
            plan,
            lost,
            on_lost,
            frames: 0,
        });
        Ok(())
    }

    fn set_tier(&mut self, tier: Tier) -> Result<(), RenderFailure> {
        let plan = self.plan_for(tier)?;
        let Some(m) = &mut self.mounted else {
            return Ok(());
        };
        self.driver.build(&m.gl, &plan)?;
        resize(&self.canvas, &m.gl, &plan.renderer, self.device_pixel_ratio);
        m.plan = plan;
        Ok(())
    }

    fn render_frame(&mut self, now: HostTime, _tier: Tier) -> Result<(), RenderFailure> {
        let Some(m) = &mut self.mounted else {
            return Err(RenderFailure::ContextCreation);
        };
        if m.lost.get() || m.gl.is_context_lost() {
            return Err(RenderFailure::ContextLost);
        }
        self.driver.draw(&m.gl, &m.plan, now)?;
        m.frames += 1;
        Ok(())
    }

    fn unmount(&mut self) {
        let Some(m) = self.mounted.take() else {
            return;
        };
        self.driver.teardown();
        let _ = self.canvas.remove_event_listener_with_callback(
            "webglcontextlost",
            m.on_lost.as_ref().unchecked_ref(),
        );
    }
}
