// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static shape catalogs and geometry detail resolution.

use backdrop_core::tier::Tier;

/// The primitive a catalog entry is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Unit cube.
    Box,
    /// UV sphere.
    Sphere,
    /// Torus with a 0.7 main radius and 0.3 tube radius.
    Torus,
}

/// The highest geometry detail a catalog entry may be built with.
///
/// Ordered `Low < Medium < High`; the detail actually used is the minimum of
/// this and the active tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Complexity {
    /// Cheapest tessellation.
    Low,
    /// Moderate tessellation.
    #[default]
    Medium,
    /// Full tessellation.
    High,
}

impl Complexity {
    /// Caps this complexity at what `tier` allows.
    ///
    /// `Gradient` has no geometry at all and is treated like `Low`.
    #[must_use]
    pub fn capped_by(self, tier: Tier) -> Self {
        let ceiling = match tier {
            Tier::High => Self::High,
            Tier::Medium => Self::Medium,
            Tier::Low | Tier::Gradient => Self::Low,
        };
        self.min(ceiling)
    }
}

/// Resolved geometry, with tessellation baked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Unit cube.
    Box,
    /// Sphere with `segments` width and height segments.
    Sphere {
        /// Width and height segment count.
        segments: u16,
    },
    /// Torus with the given segment counts.
    Torus {
        /// Segments around the tube.
        radial: u16,
        /// Segments along the ring.
        tubular: u16,
    },
}

impl ShapeKind {
    /// Resolves a primitive at a detail level.
    #[must_use]
    pub const fn resolve(primitive: Primitive, detail: Complexity) -> Self {
        match primitive {
            Primitive::Box => Self::Box,
            Primitive::Sphere => Self::Sphere {
                segments: match detail {
                    Complexity::Low => 8,
                    Complexity::Medium => 12,
                    Complexity::High => 24,
                },
            },
            Primitive::Torus => match detail {
                Complexity::Low => Self::Torus {
                    radial: 6,
                    tubular: 16,
                },
                Complexity::Medium => Self::Torus {
                    radial: 12,
                    tubular: 24,
                },
                Complexity::High => Self::Torus {
                    radial: 24,
                    tubular: 48,
                },
            },
        }
    }

    /// Rough triangle count, used to compare plan cost.
    #[must_use]
    pub const fn triangle_count(self) -> u32 {
        match self {
            Self::Box => 12,
            Self::Sphere { segments } => 2 * (segments as u32) * (segments as u32),
            Self::Torus { radial, tubular } => 2 * (radial as u32) * (tubular as u32),
        }
    }
}

/// One entry of a shape catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeSpec {
    /// Stable identifier, unique within a catalog.
    pub id: &'static str,
    /// Geometry primitive.
    pub primitive: Primitive,
    /// Resting position in scene units.
    pub position: [f32; 3],
    /// Uniform scale.
    pub size: f32,
    /// Detail ceiling.
    pub complexity: Complexity,
}

const fn spec(
    id: &'static str,
    primitive: Primitive,
    position: [f32; 3],
    size: f32,
    complexity: Complexity,
) -> ShapeSpec {
    ShapeSpec {
        id,
        primitive,
        position,
        size,
        complexity,
    }
}

use Complexity as C;
use Primitive as P;

/// Full desktop catalog, used at [`Tier::High`].
pub const HIGH_SHAPES: &[ShapeSpec] = &[
    spec("s1", P::Sphere, [-9.0, 7.0, -3.0], 0.8, C::Medium),
    spec("b1", P::Box, [4.0, 6.0, 4.0], 0.7, C::Low),
    spec("t1", P::Torus, [7.0, -3.0, 3.0], 0.6, C::High),
    spec("s2", P::Sphere, [-3.0, 0.0, 6.0], 0.9, C::Medium),
    spec("b2", P::Box, [8.0, 9.0, 5.0], 0.5, C::Low),
    spec("t2", P::Torus, [-7.0, -2.0, 4.0], 0.7, C::High),
    spec("s3", P::Sphere, [5.0, 5.0, 0.0], 0.6, C::Medium),
    spec("b3", P::Box, [3.0, -5.0, 6.0], 0.8, C::Low),
    spec("t3", P::Torus, [-9.0, 10.0, 3.0], 0.9, C::High),
    spec("s4", P::Sphere, [6.0, 2.0, 4.0], 0.5, C::Medium),
    spec("b4", P::Box, [-4.0, -7.0, 5.0], 0.7, C::Low),
    spec("t4", P::Torus, [0.0, 5.0, 7.0], 0.6, C::High),
    spec("s5", P::Sphere, [-8.0, 7.0, 6.0], 0.8, C::Medium),
    spec("b5", P::Box, [7.0, -8.0, 3.0], 0.5, C::Low),
    spec("t5", P::Torus, [0.0, -9.0, 4.0], 0.9, C::High),
    spec("s6", P::Sphere, [-6.0, 11.0, -5.0], 0.6, C::Medium),
    spec("b6", P::Box, [11.0, 1.0, -7.0], 0.8, C::Low),
    spec("t6", P::Torus, [-10.0, -4.0, -3.0], 0.7, C::High),
    spec("s7", P::Sphere, [5.0, -10.0, -6.0], 0.5, C::Medium),
    spec("b7", P::Box, [-7.0, -11.0, -4.0], 0.6, C::Low),
];

/// Reduced desktop catalog, used at [`Tier::Medium`].
pub const MEDIUM_SHAPES: &[ShapeSpec] = &[
    spec("s1", P::Sphere, [-9.0, 7.0, -3.0], 0.8, C::Medium),
    spec("b1", P::Box, [4.0, 6.0, 4.0], 0.7, C::Low),
    spec("s2", P::Sphere, [-3.0, 0.0, 6.0], 0.9, C::Medium),
    spec("b2", P::Box, [8.0, 9.0, 5.0], 0.5, C::Low),
    spec("s3", P::Sphere, [5.0, 5.0, 0.0], 0.6, C::Medium),
    spec("b3", P::Box, [3.0, -5.0, 6.0], 0.8, C::Low),
    spec("t3", P::Torus, [-9.0, 10.0, 3.0], 0.9, C::Medium),
    spec("b4", P::Box, [-4.0, -7.0, 5.0], 0.7, C::Low),
];

/// Boxes only, used at [`Tier::Low`].
pub const LOW_SHAPES: &[ShapeSpec] = &[
    spec("b1", P::Box, [4.0, 6.0, 4.0], 0.7, C::Low),
    spec("b2", P::Box, [8.0, 9.0, 5.0], 0.5, C::Low),
    spec("b3", P::Box, [3.0, -5.0, 6.0], 0.8, C::Low),
    spec("b4", P::Box, [-4.0, -7.0, 5.0], 0.7, C::Low),
    spec("b5", P::Box, [7.0, -8.0, 3.0], 0.5, C::Low),
];

/// Portrait-friendly column for mobile devices above [`Tier::Low`].
pub const MOBILE_SHAPES: &[ShapeSpec] = &[
    spec("s1", P::Sphere, [-4.0, 11.0, 2.0], 1.0, C::Low),
    spec("b1", P::Box, [3.0, 8.0, 3.0], 0.9, C::Low),
    spec("t1", P::Torus, [-2.0, 5.0, 4.0], 0.8, C::Medium),
    spec("s2", P::Sphere, [4.0, 2.0, 2.0], 1.0, C::Low),
    spec("b2", P::Box, [0.0, -1.0, 3.0], 0.9, C::Low),
    spec("t2", P::Torus, [-3.0, -5.0, 4.0], 0.8, C::Medium),
    spec("s3", P::Sphere, [2.0, -9.0, 2.0], 1.0, C::Low),
    spec("b3", P::Box, [-2.0, -13.0, 3.0], 0.9, C::Low),
];

/// Minimal mobile catalog, used at [`Tier::Low`] on mobile devices.
pub const MOBILE_LOW_SHAPES: &[ShapeSpec] = &[
    spec("s1", P::Sphere, [-2.0, 9.0, 3.0], 1.1, C::Low),
    spec("b1", P::Box, [2.0, 4.0, 4.0], 1.0, C::Low),
    spec("s2", P::Sphere, [-2.0, -1.0, 3.0], 1.1, C::Low),
    spec("b2", P::Box, [2.0, -6.0, 4.0], 1.0, C::Low),
    spec("s3", P::Sphere, [-2.0, -11.0, 3.0], 1.1, C::Low),
];

/// Picks the catalog for a tier and device class.
///
/// Returns an empty slice for [`Tier::Gradient`].
#[must_use]
pub fn catalog_for(tier: Tier, is_mobile: bool) -> &'static [ShapeSpec] {
    match (tier, is_mobile) {
        (Tier::Gradient, _) => &[],
        (Tier::Low, true) => MOBILE_LOW_SHAPES,
        (_, true) => MOBILE_SHAPES,
        (Tier::High, false) => HIGH_SHAPES,
        (Tier::Medium, false) => MEDIUM_SHAPES,
        (Tier::Low, false) => LOW_SHAPES,
    }
}
