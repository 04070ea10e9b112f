// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot device capability probe.
//!
//! [`detect`] runs once at mount and maps a handful of device signals to the
//! initial [`Tier`]. The rules are ordered and the first match wins:
//!
//! | # | Condition | Tier |
//! |---|-----------|------|
//! | 1 | no WebGL context of any version can be created | gradient |
//! | 2 | mobile, fewer than `force_gradient_cores_mobile` cores, low memory, no WebGL2 | gradient |
//! | 3 | fewer than `min_cores_mobile` cores, or mobile without WebGL2 | low |
//! | 4 | at least `min_cores_high` cores and WebGL2 | high |
//! | 5 | anything else | medium |
//!
//! Context creation failures never escape: they are folded into
//! [`CapabilitySignals::context_creation_succeeded`].

use core::fmt;

use crate::config::DeviceThresholds;
use crate::tier::Tier;

/// Highest WebGL version a probe could create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WebGlVersion {
    /// No context could be created.
    None,
    /// `webgl` / `experimental-webgl`.
    V1,
    /// `webgl2`.
    V2,
}

/// Why a context probe failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextError {
    /// The platform has no WebGL implementation.
    NotSupported,
    /// A context exists only with a major performance caveat (software
    /// rendering, blocklisted driver).
    MajorPerformanceCaveat,
    /// Creating the probe canvas or context threw.
    CreationFailed,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "WebGL is not supported"),
            Self::MajorPerformanceCaveat => {
                write!(f, "WebGL context has a major performance caveat")
            }
            Self::CreationFailed => write!(f, "WebGL context creation failed"),
        }
    }
}

impl core::error::Error for ContextError {}

/// Host environment queried by [`detect`].
///
/// The browser backend implements this over `navigator` and a scratch
/// canvas; tests use a plain struct.
pub trait DeviceInfo {
    /// Whether the user agent classifies as a phone or tablet.
    fn is_mobile(&self) -> bool;

    /// Logical CPU count, if reported.
    fn hardware_concurrency(&self) -> Option<u32>;

    /// Approximate device memory in GB, if reported.
    fn device_memory_gb(&self) -> Option<f64>;

    /// Tries to create a WebGL context (WebGL2 first, then WebGL 1) with
    /// `failIfMajorPerformanceCaveat` set, and reports the best version.
    fn probe_context(&mut self) -> Result<WebGlVersion, ContextError>;
}

/// Signals captured once by [`detect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapabilitySignals {
    /// Mobile classification.
    pub is_mobile: bool,
    /// Reported logical CPU count.
    pub cpu_cores: Option<u32>,
    /// Reported memory hint in GB.
    pub device_memory_gb: Option<f64>,
    /// Best WebGL version available.
    pub webgl: WebGlVersion,
    /// Whether any context could be created.
    pub context_creation_succeeded: bool,
}

/// Result of [`detect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Initial tier.
    pub tier: Tier,
    /// The signals the tier was derived from.
    pub signals: CapabilitySignals,
}

/// Probes `device` and classifies it.
pub fn detect<D: DeviceInfo + ?Sized>(device: &mut D, thresholds: &DeviceThresholds) -> Detection {
    let webgl = device.probe_context().unwrap_or(WebGlVersion::None);
    let signals = CapabilitySignals {
        is_mobile: device.is_mobile(),
        cpu_cores: device.hardware_concurrency(),
        device_memory_gb: device.device_memory_gb(),
        webgl,
        context_creation_succeeded: webgl != WebGlVersion::None,
    };
    Detection {
        tier: classify(&signals, thresholds),
        signals,
    }
}

/// Applies the detection rules to already-captured signals.
#[must_use]
pub fn classify(signals: &CapabilitySignals, thresholds: &DeviceThresholds) -> Tier {
    if !signals.context_creation_succeeded {
        return Tier::Gradient;
    }

    let cores = signals.cpu_cores.unwrap_or(thresholds.default_cores);
    let low_memory = signals
        .device_memory_gb
        .is_some_and(|gb| gb < thresholds.low_memory_gb);
    let webgl2 = signals.webgl == WebGlVersion::V2;

    if signals.is_mobile && cores < thresholds.force_gradient_cores_mobile && low_memory && !webgl2 {
        return Tier::Gradient;
    }
    if cores < thresholds.min_cores_mobile || (signals.is_mobile && !webgl2) {
        return Tier::Low;
    }
    if cores >= thresholds.min_cores_high && webgl2 {
        return Tier::High;
    }
    Tier::Medium
}

const MOBILE_UA_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Case-insensitive mobile user-agent check.
#[must_use]
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.as_bytes();
    MOBILE_UA_TOKENS.iter().any(|token| {
        let token = token.as_bytes();
        ua.windows(token.len())
            .any(|window| window.eq_ignore_ascii_case(token))
    })
}

/// Viewport orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Taller than wide.
    Portrait,
    /// At least as wide as tall.
    Landscape,
}

impl Orientation {
    /// Derives the orientation from viewport dimensions.
    #[must_use]
    pub fn from_viewport(width: f64, height: f64) -> Self {
        if height > width {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformanceConfig;

    struct FakeDevice {
        mobile: bool,
        cores: Option<u32>,
        memory: Option<f64>,
        context: Result<WebGlVersion, ContextError>,
        probes: u32,
    }

    impl FakeDevice {
        fn desktop(cores: u32, context: WebGlVersion) -> Self {
            Self {
                mobile: false,
                cores: Some(cores),
                memory: None,
                context: Ok(context),
                probes: 0,
            }
        }
    }

    impl DeviceInfo for FakeDevice {
        fn is_mobile(&self) -> bool {
            self.mobile
        }
        fn hardware_concurrency(&self) -> Option<u32> {
            self.cores
        }
        fn device_memory_gb(&self) -> Option<f64> {
            self.memory
        }
        fn probe_context(&mut self) -> Result<WebGlVersion, ContextError> {
            self.probes += 1;
            self.context
        }
    }

    fn thresholds() -> DeviceThresholds {
        PerformanceConfig::DEFAULT.device
    }

    #[test]
    fn no_context_is_gradient() {
        let mut dev = FakeDevice::desktop(16, WebGlVersion::None);
        let d = detect(&mut dev, &thresholds());
        assert_eq!(d.tier, Tier::Gradient);
        assert!(!d.signals.context_creation_succeeded, "no context");
        assert_eq!(dev.probes, 1, "probed exactly once");
    }

    #[test]
    fn probe_errors_are_absorbed() {
        let mut dev = FakeDevice::desktop(16, WebGlVersion::V2);
        dev.context = Err(ContextError::MajorPerformanceCaveat);
        let d = detect(&mut dev, &thresholds());
        assert_eq!(d.tier, Tier::Gradient);
        assert_eq!(d.signals.webgl, WebGlVersion::None);
    }

    #[test]
    fn very_low_end_mobile_is_gradient() {
        let mut dev = FakeDevice {
            mobile: true,
            cores: Some(1),
            memory: Some(1.0),
            context: Ok(WebGlVersion::V1),
            probes: 0,
        };
        assert_eq!(detect(&mut dev, &thresholds()).tier, Tier::Gradient);

        // Same device with plenty of memory still gets a scene.
        dev.memory = Some(4.0);
        assert_eq!(detect(&mut dev, &thresholds()).tier, Tier::Low);
    }

    #[test]
    fn low_rules() {
        let mut few_cores = FakeDevice::desktop(2, WebGlVersion::V2);
        assert_eq!(detect(&mut few_cores, &thresholds()).tier, Tier::Low);

        let mut mobile_v1 = FakeDevice::desktop(8, WebGlVersion::V1);
        mobile_v1.mobile = true;
        assert_eq!(detect(&mut mobile_v1, &thresholds()).tier, Tier::Low);
    }

    #[test]
    fn high_and_medium() {
        let mut high = FakeDevice::desktop(8, WebGlVersion::V2);
        assert_eq!(detect(&mut high, &thresholds()).tier, Tier::High);

        let mut mobile_high = FakeDevice::desktop(8, WebGlVersion::V2);
        mobile_high.mobile = true;
        assert_eq!(detect(&mut mobile_high, &thresholds()).tier, Tier::High);

        let mut v1_only = FakeDevice::desktop(8, WebGlVersion::V1);
        assert_eq!(detect(&mut v1_only, &thresholds()).tier, Tier::Medium);

        let mut four = FakeDevice::desktop(4, WebGlVersion::V2);
        assert_eq!(detect(&mut four, &thresholds()).tier, Tier::Medium);
    }

    #[test]
    fn unknown_cores_default_to_four() {
        let mut dev = FakeDevice::desktop(0, WebGlVersion::V2);
        dev.cores = None;
        assert_eq!(detect(&mut dev, &thresholds()).tier, Tier::Medium);
    }

    #[test]
    fn mobile_user_agents() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        ));
        assert!(is_mobile_user_agent("Mozilla/5.0 (Linux; ANDROID 14)"));
        assert!(is_mobile_user_agent("Opera/9.80 (J2ME/MIDP; Opera Mini/9.80)"));
        assert!(!is_mobile_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0"
        ));
        assert!(!is_mobile_user_agent(""), "empty UA");
    }

    #[test]
    fn orientation_from_viewport() {
        assert_eq!(Orientation::from_viewport(390.0, 844.0), Orientation::Portrait);
        assert_eq!(Orientation::from_viewport(1920.0, 1080.0), Orientation::Landscape);
        assert_eq!(Orientation::from_viewport(500.0, 500.0), Orientation::Landscape);
    }
}
