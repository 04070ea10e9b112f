// Copyright 2026 the Backdrop Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host page notification.
//!
//! Tier changes are forwarded to the embedding page as
//! `{ type: "performance-update", level: <tier> }`. Delivery is
//! fire-and-forget; the sending side suppresses repeats of the last tier it
//! sent ([`HostNotifier`]) and the receiving side tolerates repeats anyway
//! ([`HostTierView`]).

use crate::tier::Tier;

/// Payload sent to the host page when the tier changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PerformanceUpdate {
    /// The new tier.
    pub level: Tier,
}

impl PerformanceUpdate {
    /// Value of the message's `type` field.
    pub const TYPE: &'static str = "performance-update";

    /// Rebuilds an update from untyped message fields. Unknown types or
    /// levels yield `None`.
    #[must_use]
    pub fn from_parts(kind: &str, level: &str) -> Option<Self> {
        if kind != Self::TYPE {
            return None;
        }
        Tier::from_name(level).map(|level| Self { level })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PerformanceUpdate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("PerformanceUpdate", 2)?;
        s.serialize_field("type", Self::TYPE)?;
        s.serialize_field("level", &self.level)?;
        s.end()
    }
}

/// Receives tier updates.
pub trait TierListener {
    /// Called once per distinct tier.
    fn on_performance_update(&mut self, update: PerformanceUpdate);
}

impl<F: FnMut(PerformanceUpdate)> TierListener for F {
    fn on_performance_update(&mut self, update: PerformanceUpdate) {
        self(update);
    }
}

/// A listener that drops every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl TierListener for NoopListener {
    fn on_performance_update(&mut self, update: PerformanceUpdate) {
        _ = update;
    }
}

/// Forwards tier changes to a [`TierListener`], skipping repeats.
#[derive(Debug)]
pub struct HostNotifier<L> {
    listener: L,
    last_notified: Option<Tier>,
    sent: u32,
}

impl<L: TierListener> HostNotifier<L> {
    /// Wraps `listener`.
    #[must_use]
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            last_notified: None,
            sent: 0,
        }
    }

    /// Sends `tier` unless it equals the last tier sent. Returns whether a
    /// message went out.
    pub fn notify(&mut self, tier: Tier) -> bool {
        if self.last_notified == Some(tier) {
            return false;
        }
        self.last_notified = Some(tier);
        self.sent += 1;
        self.listener
            .on_performance_update(PerformanceUpdate { level: tier });
        true
    }

    /// The last tier sent.
    #[must_use]
    pub fn last_notified(&self) -> Option<Tier> {
        self.last_notified
    }

    /// Number of messages sent.
    #[must_use]
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Borrows the listener.
    #[must_use]
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Unwraps the listener.
    #[must_use]
    pub fn into_listener(self) -> L {
        self.listener
    }
}

/// Host-side view of the background tier.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostTierView {
    last_known: Option<Tier>,
}

impl HostTierView {
    /// Creates a view with no known tier.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_known: None }
    }

    /// Handles a raw message. Returns the tier if the message is a valid
    /// update that changes the last-known tier.
    pub fn receive(&mut self, kind: &str, level: &str) -> Option<Tier> {
        let update = PerformanceUpdate::from_parts(kind, level)?;
        if self.last_known == Some(update.level) {
            return None;
        }
        self.last_known = Some(update.level);
        Some(update.level)
    }

    /// The last tier received.
    #[must_use]
    pub fn last_known(&self) -> Option<Tier> {
        self.last_known
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn from_parts_filters_unknowns() {
        assert_eq!(
            PerformanceUpdate::from_parts("performance-update", "low"),
            Some(PerformanceUpdate { level: Tier::Low })
        );
        assert_eq!(PerformanceUpdate::from_parts("resize", "low"), None);
        assert_eq!(PerformanceUpdate::from_parts("performance-update", "ultra"), None);
    }

    #[test]
    fn notifier_skips_repeats() {
        let mut seen = Vec::new();
        let mut n = HostNotifier::new(|u: PerformanceUpdate| seen.push(u.level));
        assert!(n.notify(Tier::High), "first send");
        assert!(!n.notify(Tier::High), "repeat suppressed");
        assert!(n.notify(Tier::Medium), "change sent");
        assert_eq!(n.sent(), 2);
        assert_eq!(n.last_notified(), Some(Tier::Medium));
        assert_eq!(seen, [Tier::High, Tier::Medium]);
    }

    #[test]
    fn host_view_tolerates_duplicates() {
        let mut view = HostTierView::new();
        assert_eq!(view.receive("performance-update", "medium"), Some(Tier::Medium));
        assert_eq!(view.receive("performance-update", "medium"), None, "duplicate");
        assert_eq!(view.receive("performance-update", "bogus"), None, "unknown level");
        assert_eq!(view.receive("other", "low"), None, "unknown type");
        assert_eq!(view.last_known(), Some(Tier::Medium));
    }

    #[test]
    fn noop_listener_accepts_updates() {
        let mut n = HostNotifier::new(NoopListener);
        assert!(n.notify(Tier::Low), "still counts as sent");
    }
}
