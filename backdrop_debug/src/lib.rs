// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, reports and Chrome trace export for backdrop
//! diagnostics.
//!
//! This crate provides [`TraceSink`](backdrop_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`report::SessionReport`]: a serializable summary of a recording.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod report;
