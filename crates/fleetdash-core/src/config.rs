// ── Runtime tuning ──
//
// These types describe how long cached reports are trusted and how the
// layout is written back. They never touch disk: the binary builds them
// from `fleetdash-config` and hands them in.

use std::time::Duration;

/// Trailing-edge delay before a layout change is written to the profile.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Lifetime of the 7-day summary and 24-hour event partitions.
pub const DEFAULT_SHORT_TTL: Duration = Duration::from_secs(30);

/// Lifetime of each daily-summary entry.
pub const DEFAULT_DAILY_TTL: Duration = Duration::from_secs(300);

/// Time-to-live for each telemetry cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub summary_ttl: Duration,
    pub events_ttl: Duration,
    pub daily_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            summary_ttl: DEFAULT_SHORT_TTL,
            events_ttl: DEFAULT_SHORT_TTL,
            daily_ttl: DEFAULT_DAILY_TTL,
        }
    }
}

/// How layout edits are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Quiet period after the last edit before a write is sent.
    pub debounce: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_SAVE_DEBOUNCE,
        }
    }
}
