// Built-in layout: one row of six stat tiles.

use super::widget::{Point, Widget, WidgetKind};

const PRESETS: [(&str, WidgetKind, &str, u32); 6] = [
    ("total-vehicles-1", WidgetKind::TotalVehicles, "Total vehicles", 20),
    ("online-vehicles-1", WidgetKind::OnlineVehicles, "Online", 280),
    ("moving-vehicles-1", WidgetKind::MovingVehicles, "Moving", 540),
    ("total-distance-1", WidgetKind::TotalDistance, "Distance travelled", 800),
    ("average-speed-1", WidgetKind::AverageSpeed, "Average speed", 1060),
    ("recent-events-1", WidgetKind::RecentEvents, "Events", 1320),
];

/// The layout a new user starts with and `reset` returns to.
pub fn default_widgets() -> Vec<Widget> {
    PRESETS
        .iter()
        .map(|&(id, kind, title, x)| Widget {
            id: id.to_owned(),
            kind: kind.to_string(),
            title: title.to_owned(),
            position: Point { x, y: 20 },
            size: kind.default_size(),
            config: None,
        })
        .collect()
}
