// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellable one-shot deadlines polled against a virtual clock.
//!
//! The browser's `setTimeout` is replaced by [`TimerSlot`]: the owner arms a
//! deadline and later polls [`TimerSlot::fire_if_due`] from its frame
//! callback. Re-arming replaces the pending deadline; cancelling drops it.

use crate::time::{Duration, HostTime};

/// A single cancellable deadline.
#[derive(Clone, Debug, Default)]
pub struct TimerSlot {
    deadline: Option<HostTime>,
    arm_count: u32,
}

impl TimerSlot {
    /// Creates a disarmed slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            arm_count: 0,
        }
    }

    /// Arms the slot to fire `delay` after `now`, replacing any pending
    /// deadline.
    pub fn arm(&mut self, now: HostTime, delay: Duration) {
        self.arm_count = self.arm_count.saturating_add(1);
        self.deadline = Some(now.saturating_add(delay));
    }

    /// Disarms the slot. Returns `true` if a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Fires and disarms the slot if its deadline is at or before `now`.
    pub fn fire_if_due(&mut self, now: HostTime) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.deadline
    }

    /// Number of times the slot has been armed.
    #[must_use]
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut t = TimerSlot::new();
        t.arm(HostTime::from_millis(100), Duration::from_millis(500));
        assert!(!t.fire_if_due(HostTime::from_millis(599)), "early");
        assert!(t.fire_if_due(HostTime::from_millis(600)), "due");
        assert!(!t.fire_if_due(HostTime::from_millis(700)), "one-shot");
        assert!(!t.is_armed(), "disarmed after firing");
    }

    #[test]
    fn cancel_prevents_fire() {
        let mut t = TimerSlot::new();
        t.arm(HostTime(0), Duration(10));
        assert!(t.cancel(), "was pending");
        assert!(!t.cancel(), "nothing left to cancel");
        assert!(!t.fire_if_due(HostTime(100)), "cancelled timers never fire");
    }

    #[test]
    fn rearm_replaces_the_deadline() {
        let mut t = TimerSlot::new();
        t.arm(HostTime(0), Duration(10));
        t.arm(HostTime(5), Duration(10));
        assert_eq!(t.deadline(), Some(HostTime(15)));
        assert_eq!(t.arm_count(), 2);
        assert!(!t.fire_if_due(HostTime(10)), "first deadline was replaced");
        assert!(t.fire_if_due(HostTime(15)), "second deadline fires");
    }
}
