// ── Telemetry cache ──
//
// Serves every dashboard widget from three shared partitions instead of
// one query per widget:
//
//   summary       7-day totals over the whole roster      (30 s)
//   events        unfiltered 24-hour event list           (30 s)
//   daily summary per-day rows keyed by (days, maxDevices) (5 min)
//
// Reads never fail: a failed fetch yields an empty payload and leaves any
// previous data in place.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{Duration as TimeDelta, Utc};
use fleetdash_api::{EventRecord, EventsQuery, SummaryQuery, SummaryRecord};
use tracing::{debug, warn};

use super::partition::Partition;
use super::sampler::prioritize;
use super::source::ReportSource;
use crate::config::CacheConfig;
use crate::roster::DeviceRoster;

/// Default look-back for the daily chart.
pub const DEFAULT_DAILY_DAYS: u32 = 7;

/// Default device cap for daily reports.
pub const DEFAULT_MAX_DEVICES: usize = 20;

const SUMMARY_WINDOW_DAYS: i64 = 7;
const EVENTS_WINDOW_HOURS: i64 = 24;

/// Identifies one daily-summary entry: the period and the device cap
/// together determine what the rows mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DailyKey {
    pub days: u32,
    pub max_devices: usize,
}

/// Shared, de-duplicating cache in front of a [`ReportSource`].
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct TelemetryCache<S> {
    source: S,
    roster: ArcSwap<DeviceRoster>,
    summary: Partition<(), SummaryRecord>,
    events: Partition<(), EventRecord>,
    daily: Partition<DailyKey, SummaryRecord>,
}

impl<S: ReportSource> TelemetryCache<S> {
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self {
            source,
            roster: ArcSwap::from_pointee(DeviceRoster::default()),
            summary: Partition::new("summary", config.summary_ttl),
            events: Partition::new("events", config.events_ttl),
            daily: Partition::new("dailySummary", config.daily_ttl),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // ── Roster ───────────────────────────────────────────────────────

    /// Replace the device roster snapshot.
    ///
    /// Any non-empty roster invalidates `summary` and `events`, even if it
    /// lists the same devices as before, so data computed before the fleet
    /// was known is never served. Daily entries keep their own TTL.
    pub fn set_roster(&self, roster: DeviceRoster) {
        let populated = !roster.is_empty();
        self.roster.store(Arc::new(roster));

        if populated {
            debug!("roster updated, invalidating summary and events");
            self.summary.invalidate(&());
            self.events.invalidate(&());
        }
    }

    pub fn roster(&self) -> Arc<DeviceRoster> {
        self.roster.load_full()
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// 7-day summary over every device in the roster.
    ///
    /// An empty roster yields an empty list without a request.
    pub async fn summary(&self, force: bool) -> Arc<Vec<SummaryRecord>> {
        let roster = self.roster.load_full();
        self.summary
            .fetch_or_serve((), force, || async move {
                let device_ids = roster.device_ids();
                if device_ids.is_empty() {
                    debug!("no devices, skipping summary request");
                    return Ok(Vec::new());
                }
                let to = Utc::now();
                let query = SummaryQuery {
                    from: to - TimeDelta::days(SUMMARY_WINDOW_DAYS),
                    to,
                    daily: false,
                    device_ids,
                };
                self.source.fetch_summary(query).await
            })
            .await
    }

    /// Events from the last 24 hours.
    ///
    /// Only the unfiltered list is cached. A type-filtered request always
    /// goes to the server and never touches the cached entry.
    pub async fn events(&self, force: bool, event_type: Option<&str>) -> Arc<Vec<EventRecord>> {
        if let Some(event_type) = event_type {
            let query = Self::events_query(Some(event_type.to_owned()));
            return match self.source.fetch_events(query).await {
                Ok(rows) => Arc::new(rows),
                Err(e) => {
                    warn!(event_type, error = %e, "filtered events fetch failed");
                    Arc::new(Vec::new())
                }
            };
        }

        self.events
            .fetch_or_serve((), force, || {
                self.source.fetch_events(Self::events_query(None))
            })
            .await
    }

    /// Per-day summary rows over the last `days` days.
    ///
    /// Fleets larger than `max_devices` are sampled down to the most
    /// relevant devices before the query is built.
    pub async fn daily_summary(
        &self,
        days: u32,
        max_devices: usize,
        force: bool,
    ) -> Arc<Vec<SummaryRecord>> {
        let roster = self.roster.load_full();
        // Not cached: roster updates do not invalidate daily entries.
        if roster.is_empty() || max_devices == 0 {
            debug!(days, max_devices, "no devices selected, skipping daily request");
            return Arc::new(Vec::new());
        }

        let key = DailyKey { days, max_devices };
        self.daily
            .fetch_or_serve(key, force, || async move {
                let device_ids = prioritize(&roster, max_devices);
                debug!(days, devices = device_ids.len(), "loading daily summary");
                let to = Utc::now();
                let query = SummaryQuery {
                    from: to - TimeDelta::days(i64::from(days)),
                    to,
                    daily: true,
                    device_ids,
                };
                self.source.fetch_summary(query).await
            })
            .await
    }

    fn events_query(event_type: Option<String>) -> EventsQuery {
        let to = Utc::now();
        EventsQuery {
            from: to - TimeDelta::hours(EVENTS_WINDOW_HOURS),
            to,
            event_type,
        }
    }

    // ── Observable state ─────────────────────────────────────────────

    pub fn summary_loading(&self) -> bool {
        self.summary.is_loading(&())
    }

    pub fn events_loading(&self) -> bool {
        self.events.is_loading(&())
    }

    /// `true` while any daily-summary fetch is running.
    pub fn daily_loading(&self) -> bool {
        self.daily.any_loading()
    }

    /// Latest summary rows without fetching.
    pub fn last_summary(&self) -> Option<Arc<Vec<SummaryRecord>>> {
        self.summary.peek(&())
    }

    /// Latest unfiltered events without fetching.
    pub fn last_events(&self) -> Option<Arc<Vec<EventRecord>>> {
        self.events.peek(&())
    }

    /// Latest daily rows for a `(days, max_devices)` pair without fetching.
    pub fn last_daily_summary(
        &self,
        days: u32,
        max_devices: usize,
    ) -> Option<Arc<Vec<SummaryRecord>>> {
        self.daily.peek(&DailyKey { days, max_devices })
    }

    /// Whether the next `summary(false)` would be served without a request.
    pub fn summary_is_fresh(&self) -> bool {
        self.summary.is_fresh(&())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use fleetdash_api::{Device, DeviceId, DeviceStatus, Position};
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    use crate::error::CoreError;

    // ── Fake backend ─────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeSource {
        summary_calls: AtomicUsize,
        events_calls: AtomicUsize,
        delay: Duration,
        fail: AtomicBool,
        summary_queries: Mutex<Vec<SummaryQuery>>,
        events_queries: Mutex<Vec<EventsQuery>>,
    }

    impl FakeSource {
        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn summary_calls(&self) -> usize {
            self.summary_calls.load(Ordering::SeqCst)
        }

        fn events_calls(&self) -> usize {
            self.events_calls.load(Ordering::SeqCst)
        }

        fn last_summary_query(&self) -> SummaryQuery {
            self.summary_queries.lock().unwrap().last().cloned().unwrap()
        }

        async fn respond<T>(&self, rows: Vec<T>) -> Result<Vec<T>, CoreError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Api {
                    message: "backend down".into(),
                    status: Some(502),
                });
            }
            Ok(rows)
        }
    }

    impl ReportSource for FakeSource {
        async fn fetch_summary(
            &self,
            query: SummaryQuery,
        ) -> Result<Vec<SummaryRecord>, CoreError> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            let rows = query.device_ids.iter().copied().map(summary_row).collect();
            self.summary_queries.lock().unwrap().push(query);
            self.respond(rows).await
        }

        async fn fetch_events(&self, query: EventsQuery) -> Result<Vec<EventRecord>, CoreError> {
            let n = self.events_calls.fetch_add(1, Ordering::SeqCst);
            let event_type = query.event_type.clone().unwrap_or_else(|| "deviceMoving".into());
            self.events_queries.lock().unwrap().push(query);
            self.respond(vec![EventRecord {
                id: i64::try_from(n).unwrap(),
                device_id: 1,
                event_type,
                event_time: Utc::now(),
                position_id: None,
                geofence_id: None,
                attributes: Map::new(),
            }])
            .await
        }
    }

    fn summary_row(device_id: DeviceId) -> SummaryRecord {
        SummaryRecord {
            device_id,
            device_name: None,
            distance: 1000.0,
            average_speed: 10.0,
            max_speed: 20.0,
            spent_fuel: 0.0,
            engine_hours: 0,
            start_time: None,
            end_time: None,
            extra: Map::new(),
        }
    }

    fn device(id: DeviceId, status: DeviceStatus) -> Device {
        Device {
            id,
            name: format!("unit-{id}"),
            unique_id: id.to_string(),
            status,
            last_update: None,
            disabled: false,
        }
    }

    fn fleet() -> DeviceRoster {
        DeviceRoster::new(
            vec![
                device(1, DeviceStatus::Online),
                device(2, DeviceStatus::Offline),
                device(3, DeviceStatus::Online),
            ],
            vec![
                Position {
                    id: 10,
                    device_id: 1,
                    speed: 5.0,
                    latitude: 0.0,
                    longitude: 0.0,
                    fix_time: None,
                },
                Position {
                    id: 20,
                    device_id: 2,
                    speed: 50.0,
                    latitude: 0.0,
                    longitude: 0.0,
                    fix_time: None,
                },
                Position {
                    id: 30,
                    device_id: 3,
                    speed: 1.0,
                    latitude: 0.0,
                    longitude: 0.0,
                    fix_time: None,
                },
            ],
        )
    }

    fn cache_with(source: FakeSource) -> TelemetryCache<FakeSource> {
        let cache = TelemetryCache::new(source, CacheConfig::default());
        cache.set_roster(fleet());
        cache
    }

    // ── TTL ──────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn summary_is_served_from_cache_until_ttl() {
        let cache = cache_with(FakeSource::default());

        let first = cache.summary(false).await;
        let second = cache.summary(false).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.source().summary_calls(), 1);
        assert!(cache.summary_is_fresh());

        tokio::time::advance(Duration::from_secs(31)).await;
        let third = cache.summary(false).await;
        assert_eq!(cache.source().summary_calls(), 2);
        assert_eq!(third.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn summary_query_covers_seven_days_of_all_devices() {
        let cache = cache_with(FakeSource::default());
        cache.summary(false).await;

        let query = cache.source().last_summary_query();
        assert!(!query.daily);
        assert_eq!(query.device_ids, vec![1, 2, 3]);
        assert_eq!(query.to - query.from, TimeDelta::days(7));
    }

    #[tokio::test(start_paused = true)]
    async fn events_are_cached_for_thirty_seconds() {
        let cache = cache_with(FakeSource::default());

        cache.events(false, None).await;
        tokio::time::advance(Duration::from_secs(29)).await;
        cache.events(false, None).await;
        assert_eq!(cache.source().events_calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.events(false, None).await;
        assert_eq!(cache.source().events_calls(), 2);

        let queries = cache.source().events_queries.lock().unwrap();
        assert_eq!(queries[0].to - queries[0].from, TimeDelta::hours(24));
        assert_eq!(queries[0].event_type, None);
    }

    #[tokio::test(start_paused = true)]
    async fn force_bypasses_freshness() {
        let cache = cache_with(FakeSource::default());
        cache.summary(false).await;
        cache.summary(true).await;
        assert_eq!(cache.source().summary_calls(), 2);
    }

    // ── De-duplication ───────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_share_one_fetch() {
        let cache = cache_with(FakeSource::slow(Duration::from_millis(100)));

        let (a, b, c) = tokio::join!(
            cache.summary(false),
            cache.summary(false),
            cache.summary(false)
        );

        assert_eq!(cache.source().summary_calls(), 1);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
        assert!(c.is_empty());
        assert!(!cache.summary_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn forced_request_still_deduplicates() {
        let cache = cache_with(FakeSource::slow(Duration::from_millis(100)));

        let (_, _) = tokio::join!(cache.summary(false), cache.summary(true));
        assert_eq!(cache.source().summary_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_caller_gets_stale_data() {
        let cache = cache_with(FakeSource::slow(Duration::from_millis(100)));
        let original = cache.summary(false).await;

        tokio::time::advance(Duration::from_secs(31)).await;
        let (_, stale) = tokio::join!(cache.summary(false), cache.summary(false));

        assert!(Arc::ptr_eq(&original, &stale));
        assert_eq!(cache.source().summary_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_tracks_fetch() {
        let cache = cache_with(FakeSource::slow(Duration::from_millis(100)));

        let fetch = cache.events(false, None);
        tokio::pin!(fetch);
        assert!(
            tokio::time::timeout(Duration::from_millis(1), &mut fetch)
                .await
                .is_err()
        );
        assert!(cache.events_loading());

        let rows = fetch.await;
        assert_eq!(rows.len(), 1);
        assert!(!cache.events_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_fetch_frees_the_partition() {
        let cache = cache_with(FakeSource::slow(Duration::from_millis(100)));

        let abandoned = tokio::time::timeout(Duration::from_millis(1), cache.summary(false)).await;
        assert!(abandoned.is_err());
        assert!(!cache.summary_loading());

        let rows = cache.summary(false).await;
        assert_eq!(rows.len(), 3);
        assert_eq!(cache.source().summary_calls(), 2);
    }

    // ── Failures ─────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn failure_returns_empty_and_keeps_stale_data() {
        let cache = cache_with(FakeSource::default());
        cache.summary(false).await;

        cache.source().fail.store(true, Ordering::SeqCst);
        let failed = cache.summary(true).await;
        assert!(failed.is_empty());
        assert_eq!(cache.last_summary().unwrap().len(), 3);

        // The earlier entry is still within its TTL.
        let cached = cache.summary(false).await;
        assert_eq!(cached.len(), 3);
        assert_eq!(cache.source().summary_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_previous_data_is_empty() {
        let source = FakeSource::default();
        source.fail.store(true, Ordering::SeqCst);
        let cache = cache_with(source);

        assert!(cache.events(false, None).await.is_empty());
        assert_eq!(cache.last_events(), None);
    }

    // ── Roster invalidation ──────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn populated_roster_forces_refetch() {
        let cache = TelemetryCache::new(FakeSource::default(), CacheConfig::default());

        // No devices yet: nothing to ask for.
        assert!(cache.summary(false).await.is_empty());
        assert_eq!(cache.source().summary_calls(), 0);
        cache.events(false, None).await;
        assert_eq!(cache.source().events_calls(), 1);

        cache.set_roster(fleet());

        assert_eq!(cache.summary(false).await.len(), 3);
        assert_eq!(cache.source().summary_calls(), 1);
        cache.events(false, None).await;
        assert_eq!(cache.source().events_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn every_populated_roster_update_invalidates() {
        let cache = cache_with(FakeSource::default());
        cache.summary(false).await;

        cache.set_roster(fleet());
        cache.summary(false).await;
        assert_eq!(cache.source().summary_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_roster_does_not_invalidate() {
        let cache = cache_with(FakeSource::default());
        cache.summary(false).await;

        cache.set_roster(DeviceRoster::default());
        assert_eq!(cache.summary(false).await.len(), 3);
        assert_eq!(cache.source().summary_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn roster_update_leaves_daily_entries_alone() {
        let cache = cache_with(FakeSource::default());
        cache.daily_summary(7, 20, false).await;

        cache.set_roster(fleet());
        cache.daily_summary(7, 20, false).await;
        assert_eq!(cache.source().summary_calls(), 1);
    }

    // ── Filtered events ──────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn filtered_events_are_never_cached() {
        let cache = cache_with(FakeSource::default());

        let alarms = cache.events(false, Some("alarm")).await;
        cache.events(false, Some("alarm")).await;
        assert_eq!(alarms[0].event_type, "alarm");
        assert_eq!(cache.source().events_calls(), 2);
        assert_eq!(cache.last_events(), None);

        cache.events(false, None).await;
        assert_eq!(cache.source().events_calls(), 3);
    }

    // ── Daily summary ────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn daily_samples_large_fleets() {
        let cache = cache_with(FakeSource::default());

        let rows = cache.daily_summary(7, 2, false).await;
        let query = cache.source().last_summary_query();
        assert!(query.daily);
        assert_eq!(query.device_ids, vec![1, 3]);
        assert_eq!(query.to - query.from, TimeDelta::days(7));
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_entries_are_keyed_by_period_and_cap() {
        let cache = cache_with(FakeSource::default());

        cache.daily_summary(7, 2, false).await;
        cache.daily_summary(7, 2, false).await;
        assert_eq!(cache.source().summary_calls(), 1);

        cache.daily_summary(30, 2, false).await;
        assert_eq!(cache.source().summary_calls(), 2);
        let month = cache.source().last_summary_query();
        assert_eq!(month.to - month.from, TimeDelta::days(30));

        cache.daily_summary(7, 20, false).await;
        assert_eq!(cache.source().summary_calls(), 3);
        assert_eq!(cache.source().last_summary_query().device_ids, vec![1, 2, 3]);

        assert_eq!(cache.last_daily_summary(7, 2).unwrap().len(), 2);
        assert_eq!(cache.last_daily_summary(14, 2), None);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_devices_are_sampled_when_fetching() {
        let cache = cache_with(FakeSource::default());
        let first = cache.daily_summary(7, 2, false).await;

        // Device 2 is now online and fastest; a hit still serves the old rows.
        cache.set_roster(DeviceRoster::new(
            vec![
                device(1, DeviceStatus::Online),
                device(2, DeviceStatus::Online),
                device(3, DeviceStatus::Offline),
            ],
            vec![Position {
                id: 40,
                device_id: 2,
                speed: 80.0,
                latitude: 0.0,
                longitude: 0.0,
                fix_time: None,
            }],
        ));
        let hit = cache.daily_summary(7, 2, false).await;
        assert!(Arc::ptr_eq(&first, &hit));
        assert_eq!(cache.source().summary_calls(), 1);

        cache.daily_summary(7, 2, true).await;
        assert_eq!(cache.source().last_summary_query().device_ids, vec![2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_entries_live_five_minutes() {
        let cache = cache_with(FakeSource::default());
        cache.daily_summary(7, 20, false).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        cache.daily_summary(7, 20, false).await;
        assert_eq!(cache.source().summary_calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.daily_summary(7, 20, false).await;
        assert_eq!(cache.source().summary_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_keys_deduplicate_independently() {
        let cache = cache_with(FakeSource::slow(Duration::from_millis(50)));

        let (week, month, week_again) = tokio::join!(
            cache.daily_summary(7, 20, false),
            cache.daily_summary(30, 20, false),
            cache.daily_summary(7, 20, false)
        );

        assert_eq!(cache.source().summary_calls(), 2);
        assert_eq!(week.len(), 3);
        assert_eq!(month.len(), 3);
        assert!(week_again.is_empty());
        assert!(!cache.daily_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn daily_without_devices_skips_request() {
        let cache = TelemetryCache::new(FakeSource::default(), CacheConfig::default());
        assert!(cache.daily_summary(7, 20, false).await.is_empty());
        assert!(cache.daily_summary(7, 0, false).await.is_empty());
        assert_eq!(cache.source().summary_calls(), 0);
        assert_eq!(cache.last_daily_summary(7, 20), None);

        cache.set_roster(fleet());
        assert_eq!(cache.daily_summary(7, 20, false).await.len(), 3);
        assert_eq!(cache.source().summary_calls(), 1);
    }
}
