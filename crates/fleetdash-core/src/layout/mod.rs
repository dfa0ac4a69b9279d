// ── Dashboard layout ──
//
// Widget types, the built-in default arrangement and the pure layout model.

mod defaults;
mod model;
mod widget;

pub use defaults::default_widgets;
pub use model::LayoutModel;
pub use widget::{
    DashboardConfig, FALLBACK_SIZE, Point, Size, Widget, WidgetKind, WidgetUpdate,
    default_size_for,
};
