// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sliding-window frame rate measurement.

use alloc::collections::VecDeque;

use crate::time::{Duration, HostTime};

/// Measures frame throughput over a bounded window of frame timestamps.
///
/// Every frame is appended; once the window holds `capacity` timestamps the
/// oldest one is dropped. At most once per `check_interval` the sampler
/// computes
///
/// ```text
/// fps = (count - 1) * 1000 / (newest - oldest)   // milliseconds
/// ```
///
/// and returns it. The window slides and is never reset on emission.
#[derive(Clone, Debug)]
pub struct FrameRateSampler {
    window: VecDeque<HostTime>,
    capacity: usize,
    check_interval: Duration,
    last_check: Option<HostTime>,
}

impl FrameRateSampler {
    /// Creates a sampler. A capacity below two is raised to two, the minimum
    /// needed to measure anything.
    #[must_use]
    pub fn new(capacity: usize, check_interval: Duration) -> Self {
        let capacity = capacity.max(2);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            check_interval,
            last_check: None,
        }
    }

    /// Records a frame at `now` and returns an FPS reading when one is due.
    ///
    /// The check clock starts at the first recorded frame. When a check is due
    /// but the window is not yet full, or spans zero time, the check is
    /// consumed without a reading.
    pub fn on_frame(&mut self, now: HostTime) -> Option<f64> {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(now);

        let last = *self.last_check.get_or_insert(now);
        if now.saturating_duration_since(last) < self.check_interval {
            return None;
        }
        self.last_check = Some(now);
        self.current_fps()
    }

    /// FPS over the current window, if it is full and spans non-zero time.
    #[must_use]
    pub fn current_fps(&self) -> Option<f64> {
        if self.window.len() < self.capacity {
            return None;
        }
        let (Some(&oldest), Some(&newest)) = (self.window.front(), self.window.back()) else {
            return None;
        };
        let elapsed = newest.saturating_duration_since(oldest);
        if elapsed == Duration::ZERO {
            return None;
        }
        Some((self.window.len() - 1) as f64 * 1000.0 / elapsed.as_millis_f64())
    }

    /// Number of timestamps in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether no frame has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Drops every sample and restarts the check clock.
    pub fn clear(&mut self) {
        self.window.clear();
        self.last_check = None;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn feed(sampler: &mut FrameRateSampler, start_ms: u64, step_ms: u64, n: u64) -> Vec<f64> {
        (0..n)
            .filter_map(|i| sampler.on_frame(HostTime::from_millis(start_ms + i * step_ms)))
            .collect()
    }

    #[test]
    fn steady_rate_is_measured() {
        let mut s = FrameRateSampler::new(10, Duration::from_millis(3000));
        let readings = feed(&mut s, 0, 50, 200);
        assert!(!readings.is_empty(), "10s of frames yields readings");
        for fps in readings {
            assert!((fps - 20.0).abs() < 1e-9, "50ms frames are 20fps, got {fps}");
        }
    }

    #[test]
    fn no_reading_before_interval() {
        let mut s = FrameRateSampler::new(10, Duration::from_millis(3000));
        let readings = feed(&mut s, 0, 50, 60);
        assert!(readings.is_empty(), "2950ms is under the 3000ms interval");
    }

    #[test]
    fn window_bounded_drops_oldest() {
        let mut s = FrameRateSampler::new(4, Duration::from_millis(3000));
        for i in 0..10 {
            s.on_frame(HostTime::from_millis(i * 10));
        }
        assert_eq!(s.len(), 4);
        // Window holds 60..=90 ms.
        assert_eq!(s.current_fps(), Some(3.0 * 1000.0 / 30.0));
    }

    #[test]
    fn sparse_window_skips_the_check() {
        let mut s = FrameRateSampler::new(10, Duration::from_millis(3000));
        assert_eq!(s.on_frame(HostTime::from_millis(0)), None);
        assert_eq!(
            s.on_frame(HostTime::from_millis(4000)),
            None,
            "interval elapsed but only two samples"
        );
        // The check was consumed, so filling the window right after does not
        // emit until another interval passes.
        let mut got = None;
        for i in 1..=8 {
            got = got.or(s.on_frame(HostTime::from_millis(4000 + i * 10)));
        }
        assert_eq!(got, None, "next check is due at 7000ms");
    }

    #[test]
    fn zero_elapsed_window_emits_nothing() {
        let mut s = FrameRateSampler::new(3, Duration::ZERO);
        for _ in 0..5 {
            assert_eq!(s.on_frame(HostTime(500)), None, "identical timestamps");
        }
    }

    #[test]
    fn clear_restarts() {
        let mut s = FrameRateSampler::new(2, Duration::ZERO);
        s.on_frame(HostTime::from_millis(0));
        assert_eq!(s.on_frame(HostTime::from_millis(100)), Some(10.0));
        s.clear();
        assert!(s.is_empty(), "cleared");
        assert_eq!(s.on_frame(HostTime::from_millis(200)), None);
    }
}
