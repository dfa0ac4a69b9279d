// ── Widget and dashboard configuration types ──
//
// The serialized shape is what gets stored on the user profile, so field
// names and optionality must stay stable across releases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::CoreError;

/// Fallback footprint for widget types without a registered size.
pub const FALLBACK_SIZE: Size = Size {
    width: 400,
    height: 300,
};

/// Widget kinds the dashboard knows how to render.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum WidgetKind {
    // Single-figure stat tiles
    TotalVehicles,
    OnlineVehicles,
    MovingVehicles,
    TotalDistance,
    AverageSpeed,
    RecentEvents,
    // Lists
    Devices,
    Alerts,
    Geofence,
    // Tables
    Events,
    FleetComparison,
    // Charts
    Chart,
    DailyDistanceChart,
    // Map
    Map,
}

impl WidgetKind {
    /// Size a freshly added widget of this kind starts with.
    pub fn default_size(self) -> Size {
        let (width, height) = match self {
            Self::TotalVehicles
            | Self::OnlineVehicles
            | Self::MovingVehicles
            | Self::TotalDistance
            | Self::AverageSpeed
            | Self::RecentEvents => (240, 220),
            Self::Devices | Self::Alerts | Self::Geofence => (400, 400),
            Self::Events => (800, 400),
            Self::FleetComparison => (900, 500),
            Self::Chart => (600, 400),
            Self::DailyDistanceChart => (700, 420),
            Self::Map => (700, 500),
        };
        Size { width, height }
    }

    /// All registered kinds, in menu order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// Default size for a raw type name, falling back to 400x300.
pub fn default_size_for(kind: &str) -> Size {
    kind.parse::<WidgetKind>()
        .map_or(FALLBACK_SIZE, WidgetKind::default_size)
}

/// Top-left corner on the canvas, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Widget footprint, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// One positioned, sized panel on the dashboard canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    /// Raw type name. Unknown names are kept so the layout round-trips,
    /// but such widgets are inert.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub position: Point,
    pub size: Size,
    /// Per-widget settings. Absent on the built-in defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl Widget {
    /// The registered kind, or `None` for inert widgets.
    pub fn kind(&self) -> Option<WidgetKind> {
        self.kind.parse().ok()
    }

    pub fn is_inert(&self) -> bool {
        self.kind().is_none()
    }

    /// Lowest canvas row this widget covers.
    pub fn bottom(&self) -> u32 {
        self.position.y.saturating_add(self.size.height)
    }
}

/// The complete persisted dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// A stored object without a widget list shows the default layout.
    #[serde(default = "super::defaults::default_widgets")]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub edit_mode: bool,
}

impl DashboardConfig {
    /// Decode the JSON string stored on the user profile.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Encode for storage on the user profile.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            widgets: super::defaults::default_widgets(),
            edit_mode: false,
        }
    }
}

/// Partial update applied by [`LayoutModel::update_widget`](super::LayoutModel::update_widget).
///
/// `position` and `size` follow the same edit-mode rule as the dedicated
/// move/resize operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetUpdate {
    pub title: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub config: Option<Map<String, Value>>,
}
