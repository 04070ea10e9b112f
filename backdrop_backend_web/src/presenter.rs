// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM presentation of the shell state.
//!
//! [`DomPresenter`] mirrors a [`VisibilityState`] and the gradient's fade onto
//! two elements: the host of the 3D canvas and the gradient layer. It also
//! owns the gradient's drifting dots. Style writes are skipped when the value
//! did not change since the last frame.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;
use wasm_bindgen::JsCast as _;
use web_sys::HtmlElement;

use backdrop_core::fallback::DotField;
use backdrop_core::shell::VisibilityState;
use backdrop_core::time::{Duration, HostTime};

use crate::BackendError;

/// Custom property carrying the gradient animation period.
pub const CYCLE_PROPERTY: &str = "--backdrop-gradient-cycle";

#[derive(Default)]
struct Written {
    surface_display: Option<&'static str>,
    surface_opacity: Option<&'static str>,
    fallback_display: Option<&'static str>,
    fallback_opacity: Option<String>,
    cycle: Option<Duration>,
}

/// Applies shell state to live DOM elements.
pub struct DomPresenter {
    surface_host: HtmlElement,
    fallback: HtmlElement,
    dots: Vec<HtmlElement>,
    written: Written,
}

impl core::fmt::Debug for DomPresenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPresenter")
            .field("surface_host", &"HtmlElement")
            .field("fallback", &"HtmlElement")
            .field("dots_len", &self.dots.len())
            .finish_non_exhaustive()
    }
}

impl DomPresenter {
    /// Creates a presenter over the canvas host and the gradient layer.
    ///
    /// The canvas host fades over `transition`.
    #[must_use]
    pub fn new(surface_host: HtmlElement, fallback: HtmlElement, transition: Duration) -> Self {
        let _ = surface_host.style().set_property(
            "transition",
            &format!("opacity {}ms ease-in-out", transition.as_millis()),
        );
        Self {
            surface_host,
            fallback,
            dots: Vec::new(),
            written: Written::default(),
        }
    }

    /// The canvas host element.
    #[must_use]
    pub fn surface_host(&self) -> &HtmlElement {
        &self.surface_host
    }

    /// The gradient layer element.
    #[must_use]
    pub fn fallback(&self) -> &HtmlElement {
        &self.fallback
    }

    /// Applies visibility, the gradient's current opacity and its animation
    /// period.
    pub fn apply(&mut self, state: &VisibilityState, fallback_opacity: f64, cycle: Duration) {
        let surface_display = if state.render_surface_mounted { "block" } else { "none" };
        if self.written.surface_display != Some(surface_display) {
            let _ = self.surface_host.style().set_property("display", surface_display);
            self.written.surface_display = Some(surface_display);
        }

        let surface_opacity = if state.render_surface_visible { "1" } else { "0" };
        if self.written.surface_opacity != Some(surface_opacity) {
            let _ = self.surface_host.style().set_property("opacity", surface_opacity);
            self.written.surface_opacity = Some(surface_opacity);
        }

        let fallback_display = if state.fallback_visible { "block" } else { "none" };
        if self.written.fallback_display != Some(fallback_display) {
            let _ = self.fallback.style().set_property("display", fallback_display);
            self.written.fallback_display = Some(fallback_display);
        }

        let opacity = format!("{:.3}", fallback_opacity.clamp(0.0, 1.0));
        if self.written.fallback_opacity.as_deref() != Some(opacity.as_str()) {
            let _ = self.fallback.style().set_property("opacity", &opacity);
            self.written.fallback_opacity = Some(opacity);
        }

        if self.written.cycle != Some(cycle) {
            let _ = self
                .fallback
                .style()
                .set_property(CYCLE_PROPERTY, &format!("{}ms", cycle.as_millis()));
            self.written.cycle = Some(cycle);
        }
    }

    /// Creates one absolutely positioned element per dot of `field` inside
    /// the gradient layer.
    ///
    /// # Errors
    ///
    /// [`BackendError::NoDocument`] if the gradient layer is detached, or
    /// [`BackendError::Dom`] if an element cannot be created.
    pub fn attach_dots(&mut self, field: &DotField) -> Result<(), BackendError> {
        let document = self.fallback.owner_document().ok_or(BackendError::NoDocument)?;
        for dot in field.dots() {
            let el: HtmlElement = document
                .create_element("div")
                .map_err(|_| BackendError::Dom)?
                .unchecked_into();
            el.set_class_name("gradient-dot");
            let _ = el.set_attribute("data-dot", dot.id);
            let s = el.style();
            let _ = s.set_property("position", "absolute");
            let _ = s.set_property("left", &format!("{}%", dot.position_pct.x));
            let _ = s.set_property("top", &format!("{}%", dot.position_pct.y));
            let _ = s.set_property("width", &format!("{}vw", dot.size_vw));
            let _ = s.set_property("height", &format!("{}vw", dot.size_vw));
            let _ = s.set_property("border-radius", "50%");
            self.fallback.append_child(&el).map_err(|_| BackendError::Dom)?;
            self.dots.push(el);
        }
        Ok(())
    }

    /// Writes each dot's drift, scale and blur.
    pub fn apply_dots(&self, field: &DotField, now: HostTime, viewport: Size) {
        for (index, (el, style)) in self.dots.iter().zip(field.styles()).enumerate() {
            let drift = field.drift_offset(index, now, viewport.width);
            let s = el.style();
            let _ = s.set_property(
                "transform",
                &format!(
                    "translate({:.1}px, {:.1}px) scale({:.3})",
                    drift.x, drift.y, style.scale
                ),
            );
            let _ = s.set_property("filter", &format!("blur({:.1}px)", style.blur_px));
        }
    }

    /// Removes the dot elements.
    pub fn detach_dots(&mut self) {
        for el in self.dots.drain(..) {
            el.remove();
        }
    }
}
