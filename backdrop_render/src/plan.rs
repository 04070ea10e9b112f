// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene plans: everything a render surface needs to build a tier's scene.

use alloc::vec::Vec;

use backdrop_core::capability::{CapabilitySignals, Orientation};
use backdrop_core::config::PerformanceConfig;
use backdrop_core::tier::Tier;
use backdrop_core::time::Duration;

use crate::catalog::{ShapeKind, catalog_for};

/// Distance the camera starts from before the entry dolly.
const ENTRY_CAMERA_Z: f32 = 20.0;
/// Stagger between consecutive shapes' entry animations.
const ENTRY_STAGGER_MS: u64 = 500;
/// Entry delays repeat every this many shapes.
const ENTRY_STAGGER_GROUP: usize = 5;
/// Shapes start this far behind their resting depth.
const ENTRY_DEPTH_OFFSET: f32 = 10.0;
/// Shapes start this much further out from the center.
const ENTRY_SPREAD: f32 = 1.5;

/// Which theme color a shape draws with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorRole {
    /// Theme primary color.
    #[default]
    Primary,
    /// Theme secondary color.
    Secondary,
}

impl ColorRole {
    /// The other role.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

/// Device facts that shape the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Touch-first mobile device.
    pub is_mobile: bool,
    /// Current viewport orientation.
    pub orientation: Orientation,
}

impl DeviceProfile {
    /// Builds a profile from probe signals and the viewport orientation.
    #[must_use]
    pub fn new(signals: &CapabilitySignals, orientation: Orientation) -> Self {
        Self {
            is_mobile: signals.is_mobile,
            orientation,
        }
    }

    /// A landscape desktop.
    pub const DESKTOP: Self = Self {
        is_mobile: false,
        orientation: Orientation::Landscape,
    };

    /// A portrait phone.
    pub const PHONE: Self = Self {
        is_mobile: true,
        orientation: Orientation::Portrait,
    };
}

/// A shape placed in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedShape {
    /// Catalog identifier.
    pub id: &'static str,
    /// Geometry with tessellation resolved for the tier.
    pub kind: ShapeKind,
    /// Resting position after the entry animation.
    pub position: [f32; 3],
    /// Starting position of the entry animation.
    pub entry_position: [f32; 3],
    /// Uniform scale.
    pub size: f32,
    /// Base color.
    pub color: ColorRole,
    /// Color blended toward under the pointer.
    pub hover_color: ColorRole,
    /// Delay before this shape starts fading in.
    pub entry_delay: Duration,
}

/// Scene lighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Overhead point light intensity, in the primary color.
    pub point_intensity: f32,
    /// Overhead point light position.
    pub point_position: [f32; 3],
}

/// Bloom pass parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bloom {
    /// Bloom strength.
    pub intensity: f32,
    /// Luminance threshold.
    pub luminance_threshold: f32,
    /// Luminance smoothing.
    pub luminance_smoothing: f32,
}

/// Fragment shader precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Precision {
    /// `lowp`.
    Low,
    /// `mediump`.
    #[default]
    Medium,
}

impl Precision {
    /// The GLSL qualifier.
    #[must_use]
    pub const fn as_glsl(self) -> &'static str {
        match self {
            Self::Low => "lowp",
            Self::Medium => "mediump",
        }
    }
}

/// When the renderer draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FrameLoop {
    /// Every animation frame.
    #[default]
    Always,
    /// Only when something invalidates the scene.
    OnDemand,
}

/// Context and canvas settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererSettings {
    /// Lower device pixel ratio bound.
    pub dpr_min: f32,
    /// Upper device pixel ratio bound.
    pub dpr_max: f32,
    /// Multisample antialiasing.
    pub antialias: bool,
    /// Shader precision.
    pub precision: Precision,
    /// Frame loop policy.
    pub frame_loop: FrameLoop,
}

impl RendererSettings {
    /// Clamps a device pixel ratio into this plan's range.
    #[must_use]
    pub fn clamp_dpr(&self, device_pixel_ratio: f32) -> f32 {
        device_pixel_ratio.clamp(self.dpr_min, self.dpr_max)
    }
}

/// Animation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Multiplier on per-shape animation speed.
    pub speed_multiplier: f32,
    /// Scene rotation speed, in radians per second.
    pub scene_rotation_speed: f32,
    /// Pointer influence radius in normalized device coordinates.
    pub pointer_influence_radius: f32,
    /// Pointer hover, click and scroll effects.
    pub pointer_effects: bool,
}

/// Perspective camera placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Distance the camera dollies in from.
    pub entry_z: f32,
    /// Resting distance.
    pub z: f32,
    /// Vertical field of view, in degrees.
    pub fov_degrees: f32,
}

/// A resolved scene for one tier.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenePlan {
    /// Tier this plan was built for.
    pub tier: Tier,
    /// Shapes in catalog order.
    pub shapes: Vec<PlannedShape>,
    /// Lighting.
    pub lighting: Lighting,
    /// Bloom pass, when post-processing is enabled.
    pub bloom: Option<Bloom>,
    /// Context settings.
    pub renderer: RendererSettings,
    /// Animation parameters.
    pub motion: Motion,
    /// Camera.
    pub camera: Camera,
}

impl ScenePlan {
    /// Resolves the scene for `tier`.
    ///
    /// Returns `None` for [`Tier::Gradient`], which draws no scene.
    #[must_use]
    pub fn for_tier(tier: Tier, device: DeviceProfile, config: &PerformanceConfig) -> Option<Self> {
        if !tier.uses_webgl() {
            return None;
        }
        let low = tier == Tier::Low;

        Some(Self {
            tier,
            shapes: plan_shapes(tier, device, config),
            lighting: Lighting {
                ambient_intensity: if low { 0.3 } else { 0.2 },
                point_intensity: if low { 1.2 } else { 1.0 },
                point_position: [0.0, 50.0, 0.0],
            },
            bloom: (config.post_processing.always_enable || tier == Tier::High).then_some(Bloom {
                intensity: config.post_processing.bloom_intensity,
                luminance_threshold: config.post_processing.bloom_threshold,
                luminance_smoothing: config.post_processing.bloom_smoothing,
            }),
            renderer: match tier {
                Tier::High => RendererSettings {
                    dpr_min: 1.0,
                    dpr_max: 1.5,
                    antialias: true,
                    precision: Precision::Medium,
                    frame_loop: FrameLoop::Always,
                },
                Tier::Medium => RendererSettings {
                    dpr_min: 1.0,
                    dpr_max: 1.0,
                    antialias: true,
                    precision: Precision::Medium,
                    frame_loop: FrameLoop::Always,
                },
                Tier::Low | Tier::Gradient => RendererSettings {
                    dpr_min: 0.7,
                    dpr_max: 1.0,
                    antialias: false,
                    precision: Precision::Low,
                    frame_loop: FrameLoop::OnDemand,
                },
            },
            motion: Motion {
                speed_multiplier: match tier {
                    Tier::High => 1.0,
                    Tier::Medium => 0.7,
                    Tier::Low | Tier::Gradient => 0.4,
                },
                scene_rotation_speed: match tier {
                    Tier::High => 0.01,
                    Tier::Medium => 0.005,
                    Tier::Low | Tier::Gradient => 0.002,
                },
                pointer_influence_radius: if device.is_mobile {
                    config.mobile.touch_influence_radius
                } else {
                    0.4
                },
                pointer_effects: !low,
            },
            camera: Camera {
                entry_z: ENTRY_CAMERA_Z,
                z: if device.is_mobile { 8.0 } else { 10.0 },
                fov_degrees: if device.is_mobile || device.orientation == Orientation::Portrait {
                    85.0
                } else {
                    75.0
                },
            },
        })
    }

    /// Sum of the shapes' rough triangle counts.
    #[must_use]
    pub fn triangle_count(&self) -> u32 {
        self.shapes.iter().map(|s| s.kind.triangle_count()).sum()
    }
}

fn plan_shapes(tier: Tier, device: DeviceProfile, config: &PerformanceConfig) -> Vec<PlannedShape> {
    let (size_scale, y_scale) = if device.is_mobile {
        (config.mobile.size_multiplier, config.mobile.position_scale_y)
    } else {
        (1.0, 1.0)
    };

    catalog_for(tier, device.is_mobile)
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let [x, y, z] = spec.position;
            let y = y * y_scale;
            let color = if index.is_multiple_of(2) {
                ColorRole::Primary
            } else {
                ColorRole::Secondary
            };
            let stagger = (index % ENTRY_STAGGER_GROUP) as u64;
            PlannedShape {
                id: spec.id,
                kind: ShapeKind::resolve(spec.primitive, spec.complexity.capped_by(tier)),
                position: [x, y, z],
                entry_position: [x * ENTRY_SPREAD, y * ENTRY_SPREAD, z - ENTRY_DEPTH_OFFSET],
                size: spec.size * size_scale,
                color,
                hover_color: color.swapped(),
                entry_delay: Duration::from_millis(stagger * ENTRY_STAGGER_MS),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(tier: Tier, device: DeviceProfile) -> ScenePlan {
        ScenePlan::for_tier(tier, device, &PerformanceConfig::DEFAULT).expect("webgl tier")
    }

    #[test]
    fn gradient_has_no_plan() {
        assert!(
            ScenePlan::for_tier(Tier::Gradient, DeviceProfile::DESKTOP, &PerformanceConfig::DEFAULT)
                .is_none()
        );
    }

    #[test]
    fn high_plan_uses_full_detail() {
        let p = plan(Tier::High, DeviceProfile::DESKTOP);
        assert_eq!(p.shapes.len(), 20);
        let t1 = p.shapes.iter().find(|s| s.id == "t1").expect("t1 present");
        assert_eq!(
            t1.kind,
            ShapeKind::Torus {
                radial: 24,
                tubular: 48
            }
        );
        let s1 = &p.shapes[0];
        assert_eq!(s1.kind, ShapeKind::Sphere { segments: 12 }, "medium ceiling");
        assert!(p.bloom.is_some(), "bloom always on by default");
        assert_eq!(p.renderer.dpr_max, 1.5);
        assert_eq!(p.motion.scene_rotation_speed, 0.01);
        assert_eq!(p.camera.z, 10.0);
        assert_eq!(p.camera.fov_degrees, 75.0);
    }

    #[test]
    fn medium_plan_caps_torus_detail() {
        let p = plan(Tier::Medium, DeviceProfile::DESKTOP);
        assert_eq!(p.shapes.len(), 8);
        let t3 = p.shapes.iter().find(|s| s.id == "t3").expect("t3 present");
        assert_eq!(
            t3.kind,
            ShapeKind::Torus {
                radial: 12,
                tubular: 24
            }
        );
        assert_eq!(p.motion.speed_multiplier, 0.7);
    }

    #[test]
    fn low_plan_is_cheap() {
        let p = plan(Tier::Low, DeviceProfile::DESKTOP);
        assert!(p.shapes.iter().all(|s| s.kind == ShapeKind::Box));
        assert_eq!(p.lighting.ambient_intensity, 0.3);
        assert_eq!(p.lighting.point_intensity, 1.2);
        assert!(!p.renderer.antialias);
        assert_eq!(p.renderer.precision, Precision::Low);
        assert_eq!(p.renderer.frame_loop, FrameLoop::OnDemand);
        assert!(!p.motion.pointer_effects);
        assert_eq!(p.renderer.clamp_dpr(3.0), 1.0);
        assert_eq!(p.renderer.clamp_dpr(0.5), 0.7);
    }

    #[test]
    fn bloom_follows_post_processing_switch() {
        let mut config = PerformanceConfig::DEFAULT;
        config.post_processing.always_enable = false;
        let medium = ScenePlan::for_tier(Tier::Medium, DeviceProfile::DESKTOP, &config);
        assert!(medium.is_some_and(|p| p.bloom.is_none()));
        let high = ScenePlan::for_tier(Tier::High, DeviceProfile::DESKTOP, &config);
        let bloom = high.and_then(|p| p.bloom).expect("high keeps bloom");
        assert_eq!(bloom.intensity, 15.0);
        assert_eq!(bloom.luminance_threshold, 0.2);
    }

    #[test]
    fn mobile_scales_shapes_and_widens_view() {
        let p = plan(Tier::High, DeviceProfile::PHONE);
        assert_eq!(p.shapes.len(), 8);
        let s1 = &p.shapes[0];
        assert_eq!(s1.position[1], 11.0 * 1.5);
        assert_eq!(s1.size, 1.0 * 1.2);
        assert_eq!(p.camera.z, 8.0);
        assert_eq!(p.camera.fov_degrees, 85.0);
        assert_eq!(p.motion.pointer_influence_radius, 0.6);

        let low = plan(Tier::Low, DeviceProfile::PHONE);
        assert_eq!(low.shapes.len(), 5);
        assert_eq!(low.shapes[0].kind, ShapeKind::Sphere { segments: 8 });
    }

    #[test]
    fn entry_animation_is_staggered() {
        let p = plan(Tier::High, DeviceProfile::DESKTOP);
        assert_eq!(p.shapes[0].entry_delay, Duration::ZERO);
        assert_eq!(p.shapes[4].entry_delay, Duration::from_millis(2000));
        assert_eq!(p.shapes[5].entry_delay, Duration::ZERO);
        assert_eq!(p.shapes[0].color, ColorRole::Primary);
        assert_eq!(p.shapes[1].color, ColorRole::Secondary);
        assert_eq!(p.shapes[1].hover_color, ColorRole::Primary);
        let b1 = &p.shapes[1];
        assert_eq!(b1.entry_position, [6.0, 9.0, -6.0]);
    }

    #[test]
    fn lower_tiers_cost_less() {
        let high = plan(Tier::High, DeviceProfile::DESKTOP).triangle_count();
        let medium = plan(Tier::Medium, DeviceProfile::DESKTOP).triangle_count();
        let low = plan(Tier::Low, DeviceProfile::DESKTOP).triangle_count();
        assert!(high > medium && medium > low, "{high} > {medium} > {low}");
    }
}
