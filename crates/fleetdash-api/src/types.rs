// Wire types for the fleet tracking server REST API.
//
// Field names follow the server's camelCase JSON. Records keep unknown
// fields in `extra` so they survive a read-modify-write cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Numeric identifier assigned by the server to a tracked device.
pub type DeviceId = i64;

// ── Users ────────────────────────────────────────────────────────────

/// A user profile as returned by `/api/session` and `/api/users/{id}`.
///
/// `attributes` is the free-form map where the dashboard layout is stored.
/// Every other field is carried through untouched in `extra` so `PUT`
/// sends back the complete object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Read a string attribute.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

// ── Devices & positions ──────────────────────────────────────────────

/// Connection status reported by the server for a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A tracked device from `GET /api/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disabled: bool,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}

/// Latest reported position from `GET /api/positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub id: i64,
    pub device_id: DeviceId,
    /// Speed in knots, as reported by the device.
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub fix_time: Option<DateTime<Utc>>,
}

// ── Reports ──────────────────────────────────────────────────────────

/// Per-device summary row from `GET /api/reports/summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub device_id: DeviceId,
    #[serde(default)]
    pub device_name: Option<String>,
    /// Distance in meters.
    #[serde(default)]
    pub distance: f64,
    /// Average speed in knots.
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub spent_fuel: f64,
    /// Engine hours in milliseconds.
    #[serde(default)]
    pub engine_hours: i64,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event row from `GET /api/reports/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub device_id: DeviceId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    #[serde(default)]
    pub position_id: Option<i64>,
    #[serde(default)]
    pub geofence_id: Option<i64>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Query for the summary report.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Split results into one row per device per day.
    pub daily: bool,
    pub device_ids: Vec<DeviceId>,
}

impl SummaryQuery {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("from", format_instant(self.from)),
            ("to", format_instant(self.to)),
            ("daily", self.daily.to_string()),
        ];
        params.extend(self.device_ids.iter().map(|id| ("deviceId", id.to_string())));
        params
    }
}

/// Query for the events report.
#[derive(Debug, Clone, PartialEq)]
pub struct EventsQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Restrict to a single event type (e.g. `deviceOverspeed`).
    pub event_type: Option<String>,
}

impl EventsQuery {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("from", format_instant(self.from)),
            ("to", format_instant(self.to)),
        ];
        if let Some(ref event_type) = self.event_type {
            params.push(("type", event_type.clone()));
        }
        params
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
