//! Presence classification: status flag + heartbeat/update recency → presence.
//!
//! A driver counts as online only while the driver app says so *and* at least
//! one of its two timestamps is fresher than [PRESENCE_STALE_AFTER_MS]. A
//! missing timestamp is infinitely stale.

use std::fmt;

use serde::Serialize;

use crate::clock::{ONE_MIN_MS, ONE_SEC_MS};
use crate::records::{DriverRecord, DriverStatus};

/// Recency window for heartbeats and updates (2 minutes). Strict: exactly 120 s is stale.
pub const PRESENCE_STALE_AFTER_MS: u64 = 2 * ONE_MIN_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    OnlineAvailable,
    OnlineBusy,
    Offline,
}

impl PresenceState {
    pub fn is_online(&self) -> bool {
        !matches!(self, PresenceState::Offline)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PresenceState::OnlineAvailable => "Available",
            PresenceState::OnlineBusy => "On a ride",
            PresenceState::Offline => "Offline",
        }
    }
}

/// Classifies `driver` at `now_ms` using [PRESENCE_STALE_AFTER_MS].
pub fn classify(driver: &DriverRecord, now_ms: u64) -> PresenceState {
    classify_with_threshold(driver, now_ms, PRESENCE_STALE_AFTER_MS)
}

/// Same policy as [classify] with an explicit recency window.
pub fn classify_with_threshold(
    driver: &DriverRecord,
    now_ms: u64,
    stale_after_ms: u64,
) -> PresenceState {
    if driver.status != DriverStatus::Online {
        return PresenceState::Offline;
    }

    // Timestamps ahead of `now` (clock skew) count as fresh.
    let fresh = |at: Option<u64>| {
        at.map(|t| now_ms.saturating_sub(t) < stale_after_ms)
            .unwrap_or(false)
    };

    if !fresh(driver.last_heartbeat_at) && !fresh(driver.last_update_at) {
        return PresenceState::Offline;
    }

    if driver.in_ride {
        PresenceState::OnlineBusy
    } else {
        PresenceState::OnlineAvailable
    }
}

/// Presence counts over a driver collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PresenceTally {
    pub online_available: usize,
    pub online_busy: usize,
    pub offline: usize,
}

impl PresenceTally {
    pub fn from_drivers<'a>(drivers: impl IntoIterator<Item = &'a DriverRecord>, now_ms: u64) -> Self {
        let mut tally = Self::default();
        for driver in drivers {
            match classify(driver, now_ms) {
                PresenceState::OnlineAvailable => tally.online_available += 1,
                PresenceState::OnlineBusy => tally.online_busy += 1,
                PresenceState::Offline => tally.offline += 1,
            }
        }
        tally
    }

    pub fn online(&self) -> usize {
        self.online_available + self.online_busy
    }
}

/// Coarse "time since last update" used in driver lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastSeen {
    JustNow,
    Minutes(u64),
    HoursMinutes(u64, u64),
}

impl LastSeen {
    pub fn from_elapsed_ms(elapsed_ms: u64) -> Self {
        let secs = elapsed_ms / ONE_SEC_MS;
        let mins = secs / 60;
        if secs < 60 {
            LastSeen::JustNow
        } else if mins < 60 {
            LastSeen::Minutes(mins)
        } else {
            LastSeen::HoursMinutes(mins / 60, mins % 60)
        }
    }

    /// `None` when the driver never reported an update.
    pub fn of(driver: &DriverRecord, now_ms: u64) -> Option<Self> {
        driver
            .last_update_at
            .map(|at| Self::from_elapsed_ms(now_ms.saturating_sub(at)))
    }
}

impl fmt::Display for LastSeen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastSeen::JustNow => write!(f, "just now"),
            LastSeen::Minutes(m) => write!(f, "{m}m ago"),
            LastSeen::HoursMinutes(h, m) => write!(f, "{h}h {m}m ago"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    fn online_driver() -> DriverRecord {
        let mut driver = DriverRecord::new("d1");
        driver.status = DriverStatus::Online;
        driver
    }

    #[test]
    fn fresh_heartbeat_is_available_then_busy_in_ride() {
        let mut driver = online_driver();
        driver.last_heartbeat_at = Some(NOW - 5 * ONE_SEC_MS);
        assert_eq!(classify(&driver, NOW), PresenceState::OnlineAvailable);

        driver.in_ride = true;
        assert_eq!(classify(&driver, NOW), PresenceState::OnlineBusy);
    }

    #[test]
    fn exactly_at_threshold_is_stale() {
        let mut driver = online_driver();
        driver.last_heartbeat_at = Some(NOW - 120_000);
        assert_eq!(classify(&driver, NOW), PresenceState::Offline);

        driver.last_heartbeat_at = Some(NOW - 119_999);
        assert_eq!(classify(&driver, NOW), PresenceState::OnlineAvailable);
    }

    #[test]
    fn online_flag_without_timestamps_is_offline() {
        assert_eq!(classify(&online_driver(), NOW), PresenceState::Offline);
    }

    #[test]
    fn fresh_update_alone_is_enough() {
        let mut driver = online_driver();
        driver.last_heartbeat_at = Some(NOW - 10 * ONE_MIN_MS);
        driver.last_update_at = Some(NOW - ONE_SEC_MS);
        assert_eq!(classify(&driver, NOW), PresenceState::OnlineAvailable);
    }

    #[test]
    fn non_online_status_is_always_offline() {
        for status in [DriverStatus::Offline, DriverStatus::Pending, DriverStatus::Other] {
            let mut driver = DriverRecord::new("d1");
            driver.status = status;
            driver.last_heartbeat_at = Some(NOW);
            driver.last_update_at = Some(NOW);
            assert_eq!(classify(&driver, NOW), PresenceState::Offline, "{status:?}");
        }
    }

    #[test]
    fn timestamps_in_the_future_count_as_fresh() {
        let mut driver = online_driver();
        driver.last_heartbeat_at = Some(NOW + 30 * ONE_SEC_MS);
        assert_eq!(classify(&driver, NOW), PresenceState::OnlineAvailable);
    }

    #[test]
    fn threshold_can_be_overridden() {
        let mut driver = online_driver();
        driver.last_heartbeat_at = Some(NOW - 10 * ONE_SEC_MS);
        assert_eq!(
            classify_with_threshold(&driver, NOW, 5 * ONE_SEC_MS),
            PresenceState::Offline
        );
        assert_eq!(
            classify_with_threshold(&driver, NOW, 11 * ONE_SEC_MS),
            PresenceState::OnlineAvailable
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let mut driver = online_driver();
        driver.last_update_at = Some(NOW - 1);
        assert_eq!(classify(&driver, NOW), classify(&driver, NOW));
    }

    #[test]
    fn tally_counts_each_presence_state() {
        let mut available = online_driver();
        available.last_heartbeat_at = Some(NOW);
        let mut busy = available.clone();
        busy.id = "d2".into();
        busy.in_ride = true;
        let offline = DriverRecord::new("d3");

        let tally = PresenceTally::from_drivers([&available, &busy, &offline], NOW);
        assert_eq!(tally.online_available, 1);
        assert_eq!(tally.online_busy, 1);
        assert_eq!(tally.offline, 1);
        assert_eq!(tally.online(), 2);
    }

    #[test]
    fn last_seen_buckets() {
        assert_eq!(LastSeen::from_elapsed_ms(59_999), LastSeen::JustNow);
        assert_eq!(LastSeen::from_elapsed_ms(5 * ONE_MIN_MS), LastSeen::Minutes(5));
        assert_eq!(
            LastSeen::from_elapsed_ms(125 * ONE_MIN_MS),
            LastSeen::HoursMinutes(2, 5)
        );
        assert_eq!(LastSeen::HoursMinutes(2, 5).to_string(), "2h 5m ago");
        assert_eq!(LastSeen::of(&DriverRecord::new("d1"), NOW), None);
    }
}
