// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tier-specific scene plans for the backdrop background.
//!
//! A render surface calls [`ScenePlan::for_tier`] when it mounts or when the
//! controller moves it to another WebGL tier. The plan describes the shape
//! population, lighting, post-processing, context settings, motion and camera;
//! building actual GPU resources from it is the surface's job.
//!
//! Shapes come from static catalogs (one per desktop tier, two for mobile).
//! Each catalog entry carries a detail ceiling and the geometry actually used
//! is the lower of that ceiling and the tier, resolved into a tagged
//! [`ShapeKind`].
//!
//! `no_std` compatible (requires `alloc`).

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod catalog;
mod plan;

pub use catalog::{
    Complexity, HIGH_SHAPES, LOW_SHAPES, MEDIUM_SHAPES, MOBILE_LOW_SHAPES, MOBILE_SHAPES,
    Primitive, ShapeKind, ShapeSpec, catalog_for,
};
pub use plan::{
    Bloom, Camera, ColorRole, DeviceProfile, FrameLoop, Lighting, Motion, PlannedShape, Precision,
    RendererSettings, ScenePlan,
};
