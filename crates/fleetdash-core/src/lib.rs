//! Dashboard state and telemetry caching between `fleetdash-api` and a
//! rendering host (CLI, web shell, desktop).
//!
//! - **[`Dashboard`]**: the editable widget layout. Mutations apply locally
//!   at once and are mirrored to the user profile through
//!   [`DashboardPersistence`], which debounces bursts of edits into one
//!   write.
//!
//! - **[`TelemetryCache`]**: one shared fetch per data set (7-day summary,
//!   24-hour events, daily summary per period/device cap) with TTLs,
//!   in-flight de-duplication and roster-driven invalidation. Reads never
//!   fail; errors are logged and yield empty payloads.
//!
//! - **[`prioritize`]**: picks which devices a capped daily report covers.
//!
//! Both halves are generic over their backend ([`ProfileStore`],
//! [`ReportSource`]); [`FleetClient`](fleetdash_api::FleetClient)
//! implements both.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod layout;
pub mod persistence;
pub mod roster;

use std::sync::{Mutex, MutexGuard, PoisonError};

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{DailyKey, ReportSource, TelemetryCache, prioritize};
pub use config::{CacheConfig, PersistenceConfig};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use layout::{
    DashboardConfig, LayoutModel, Point, Size, Widget, WidgetKind, WidgetUpdate, default_widgets,
};
pub use persistence::{DashboardPersistence, PersistenceStatus, ProfileStore};
pub use roster::DeviceRoster;

/// Lock a std mutex, recovering the data if a holder panicked. Guarded
/// sections here are plain field updates and leave no broken invariants.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
