// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fidelity tiers.

use core::fmt;

/// A rendering fidelity tier.
///
/// Variants are declared cheapest first, so the derived [`Ord`] orders tiers
/// by rendering expense: `Gradient < Low < Medium < High`. [`Tier::Gradient`]
/// is the sentinel for "no WebGL surface at all".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Tier {
    /// CSS gradient only; no 3D surface is mounted.
    Gradient,
    /// Minimal scene: boxes, no pointer effects, on-demand frame loop.
    Low,
    /// Reduced scene.
    Medium,
    /// Full scene.
    High,
}

impl Tier {
    /// Every tier, cheapest first.
    pub const ALL: [Self; 4] = [Self::Gradient, Self::Low, Self::Medium, Self::High];

    /// The lowercase wire name used in host notifications.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gradient => "gradient",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gradient" => Some(Self::Gradient),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Whether this tier mounts a WebGL render surface.
    #[must_use]
    pub const fn uses_webgl(self) -> bool {
        !matches!(self, Self::Gradient)
    }

    /// A compact numeric code, used by binary trace records.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Gradient => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Inverse of [`Tier::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Gradient),
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_by_expense() {
        assert!(Tier::Gradient < Tier::Low, "gradient is cheapest");
        assert!(Tier::Low < Tier::Medium, "low below medium");
        assert!(Tier::Medium < Tier::High, "medium below high");
        assert_eq!(Tier::ALL.iter().max(), Some(&Tier::High));
    }

    #[test]
    fn names_round_trip_and_reject_unknown() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_name(tier.as_str()), Some(tier));
            assert_eq!(Tier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(Tier::from_name("ultra"), None);
        assert_eq!(Tier::from_name("High"), None, "names are case-sensitive");
        assert_eq!(Tier::from_code(9), None);
    }

    #[test]
    fn only_gradient_skips_webgl() {
        assert!(!Tier::Gradient.uses_webgl(), "gradient has no surface");
        assert!(Tier::Low.uses_webgl(), "low mounts a surface");
    }
}
