//! Wall-clock helpers for stored timestamps.
//!
//! Stored records carry unix-second timestamps so they survive
//! serialization; in-process deadlines use `Instant` instead.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole seconds since the unix epoch.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Convert a unix-second timestamp back to a `SystemTime`.
#[must_use]
pub fn from_unix(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unix_now_is_monotonic_enough() {
        let a = unix_now();
        let b = unix_now();
        assert!(b >= a);
        // Sanity: after 2020, before 2100
        assert!(a > 1_577_836_800);
        assert!(a < 4_102_444_800);
    }

    #[test]
    fn from_unix_round_trips() {
        let now = unix_now();
        let restored = from_unix(now);
        let secs = restored.duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert_eq!(secs, now);
    }
}
