//! Telemetry report handlers: summary, events, daily.
//!
//! Reports go through the same `TelemetryCache` the dashboard widgets use,
//! seeded with the roster fetched at startup.

use chrono::{DateTime, Utc};
use fleetdash_api::{DeviceId, EventRecord, FleetClient, SummaryRecord};
use fleetdash_config::Config;
use fleetdash_core::{DeviceRoster, TelemetryCache};
use tabled::Tabled;
use tracing::{debug, warn};

use crate::cli::{DailyArgs, EventsArgs, GlobalOpts, SummaryArgs};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Avg (km/h)")]
    average: String,
    #[tabled(rename = "Max (km/h)")]
    max: String,
    #[tabled(rename = "Engine")]
    engine: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Type")]
    kind: String,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Distance (km)")]
    distance: String,
}

// ── Setup ───────────────────────────────────────────────────────────

/// Connect, load the roster and build a cache over it.
///
/// Positions only affect daily sampling, so failing to load them is not
/// fatal.
async fn telemetry(cfg: &Config) -> Result<TelemetryCache<FleetClient>, CliError> {
    let client = super::connect(cfg)?;
    let devices = client.devices().await?;
    let positions = match client.positions().await {
        Ok(positions) => positions,
        Err(e) => {
            warn!(error = %e, "could not load positions; sampling without speeds");
            Vec::new()
        }
    };
    debug!(devices = devices.len(), positions = positions.len(), "roster loaded");

    let cache = TelemetryCache::new(client, cfg.cache_config());
    cache.set_roster(DeviceRoster::new(devices, positions));
    Ok(cache)
}

fn device_label(roster: &DeviceRoster, id: DeviceId, reported: Option<&str>) -> String {
    reported
        .map(ToOwned::to_owned)
        .or_else(|| roster.device(id).map(|d| d.name.clone()))
        .unwrap_or_else(|| format!("#{id}"))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn summary(args: SummaryArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let cache = telemetry(cfg).await?;
    let rows = cache.summary(args.force).await;
    let roster = cache.roster();

    let rendered = output::render_list(global.output, rows.as_slice(), |r: &SummaryRecord| {
        SummaryRow {
            device: device_label(&roster, r.device_id, r.device_name.as_deref()),
            distance: output::km(r.distance),
            average: output::kmh(r.average_speed),
            max: output::kmh(r.max_speed),
            engine: output::hours(r.engine_hours),
        }
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

pub async fn events(args: EventsArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let cache = telemetry(cfg).await?;
    let rows = cache.events(args.force, args.event_type.as_deref()).await;
    let roster = cache.roster();

    let rendered = output::render_list(global.output, rows.as_slice(), |e: &EventRecord| {
        EventRow {
            time: timestamp(e.event_time),
            device: device_label(&roster, e.device_id, None),
            kind: e.event_type.clone(),
        }
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

pub async fn daily(args: DailyArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let days = args.days.unwrap_or(cfg.dashboard.daily_days);
    if days == 0 {
        return Err(CliError::Validation {
            field: "days".into(),
            reason: "must be at least 1".into(),
        });
    }
    let max_devices = args.max_devices.unwrap_or(cfg.dashboard.max_devices);

    let cache = telemetry(cfg).await?;
    let rows = cache.daily_summary(days, max_devices, args.force).await;
    let roster = cache.roster();

    let rendered = output::render_list(global.output, rows.as_slice(), |r: &SummaryRecord| {
        DailyRow {
            day: r
                .start_time
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d").to_string()),
            device: device_label(&roster, r.device_id, r.device_name.as_deref()),
            distance: output::km(r.distance),
        }
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
