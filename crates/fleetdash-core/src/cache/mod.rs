// ── Shared telemetry cache ──
//
// One fetch per data set, shared by every widget that displays it.

mod partition;
mod sampler;
mod source;
mod telemetry;

pub use partition::CacheEntry;
pub use sampler::prioritize;
pub use source::ReportSource;
pub use telemetry::{DEFAULT_DAILY_DAYS, DEFAULT_MAX_DEVICES, DailyKey, TelemetryCache};
