// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive rendering performance control for a decorative 3D background.
//!
//! `backdrop_core` decides how much rendering a page's decorative WebGL
//! background may spend. It probes the device once, picks a fidelity
//! [`Tier`](tier::Tier), measures frame throughput while the scene runs and
//! demotes the tier when throughput degrades, finally falling back to an
//! animated CSS gradient. It is `no_std` compatible (with `alloc`) and reads no
//! clocks: every operation takes the current [`HostTime`](time::HostTime).
//!
//! # Architecture
//!
//! ```text
//!   DeviceInfo ──► capability::detect() ──► Detection
//!                                              │
//!                 ┌────────────────────────────┘
//!                 ▼
//!   BackgroundSession::mount() ──► TierController ──► HostNotifier ──► host page
//!          │                            ▲   │
//!          │ on_frame(now)              │   └──► ShellCoordinator ──► VisibilityState
//!          ▼                            │                                  │
//!   FrameLimiter ──► RenderSurface      │                                  ▼
//!   FrameLimiter ──► FrameRateSampler ──┘ fps                       FallbackSurface
//! ```
//!
//! **[`capability`]**: one-shot device probe and initial tier rules.
//!
//! **[`benchmark`]**: optional startup throughput measurement that can only
//! lower the probe's recommendation.
//!
//! **[`sampler`]** and **[`limiter`]**: sliding-window FPS measurement and
//! frame rate throttling.
//!
//! **[`controller`]**: demotion ladder with cooldown, hard and soft floors,
//! bounded attempts and a single delayed retry.
//!
//! **[`shell`]**: four-phase cross-fade state machine between the 3D surface
//! and the gradient.
//!
//! **[`fallback`]**: gradient opacity fade, loading speed and the drifting
//! dot field.
//!
//! **[`surface`]**: the [`RenderSurface`](surface::RenderSurface) contract
//! backends implement.
//!
//! **[`notify`]**: typed host notification with duplicate suppression.
//!
//! **[`session`]**: wires everything together for one mount.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `serde` (disabled by default): `Serialize`/`Deserialize` for
//!   [`Tier`](tier::Tier) and `Serialize` for
//!   [`PerformanceUpdate`](notify::PerformanceUpdate).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod benchmark;
pub mod capability;
pub mod config;
pub mod controller;
pub mod fallback;
pub mod limiter;
pub mod notify;
pub mod sampler;
pub mod session;
pub mod shell;
pub mod surface;
pub mod tier;
pub mod time;
pub mod timer;
pub mod trace;
