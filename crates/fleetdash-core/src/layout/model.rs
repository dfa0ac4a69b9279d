// ── Layout model ──
//
// Pure, synchronous mutations over a `DashboardConfig`. Persistence is the
// caller's concern: every mutator reports whether the config changed so the
// owning store knows when to schedule a write.

use serde_json::Map;
use tracing::debug;

use super::widget::{DashboardConfig, Point, Size, Widget, WidgetUpdate, default_size_for};

/// Gap kept between stacked widgets and the canvas edge.
const MARGIN: u32 = 20;

/// Free space kept below the lowest widget.
const CANVAS_BOTTOM_PADDING: u32 = 300;

/// Canvas height never shrinks below this.
const MIN_CANVAS_HEIGHT: u32 = 800;

/// In-memory dashboard layout plus the (unpersisted) selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutModel {
    config: DashboardConfig,
    selected: Option<String>,
}

impl LayoutModel {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            selected: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.config.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.config.widgets.iter().find(|w| w.id == id)
    }

    pub fn edit_mode(&self) -> bool {
        self.config.edit_mode
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    // ── Geometry ─────────────────────────────────────────────────────

    /// Lowest edge over all widgets, `None` for an empty canvas.
    pub fn max_bottom(&self) -> Option<u32> {
        self.config.widgets.iter().map(Widget::bottom).max()
    }

    /// Where the next added widget goes: left-aligned below everything.
    pub fn next_insert_position(&self) -> Point {
        match self.max_bottom() {
            Some(bottom) => Point {
                x: MARGIN,
                y: bottom.saturating_add(MARGIN),
            },
            None => Point {
                x: MARGIN,
                y: MARGIN,
            },
        }
    }

    /// Height the canvas must offer so every widget fits with room to grow.
    pub fn min_canvas_height(&self) -> u32 {
        self.max_bottom().map_or(MIN_CANVAS_HEIGHT, |bottom| {
            bottom
                .saturating_add(CANVAS_BOTTOM_PADDING)
                .max(MIN_CANVAS_HEIGHT)
        })
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a widget of `kind` below the existing ones.
    ///
    /// The id is `"{kind}-{created_at_ms}"`; if that id is already taken the
    /// timestamp is bumped until it is unique. Returns the new id.
    pub fn add_widget(&mut self, kind: &str, title: Option<&str>, created_at_ms: i64) -> String {
        let mut stamp = created_at_ms;
        let mut id = format!("{kind}-{stamp}");
        while self.widget(&id).is_some() {
            stamp = stamp.saturating_add(1);
            id = format!("{kind}-{stamp}");
        }

        let widget = Widget {
            id: id.clone(),
            kind: kind.to_owned(),
            title: title.map_or_else(|| format!("Widget {kind}"), ToOwned::to_owned),
            position: self.next_insert_position(),
            size: default_size_for(kind),
            config: Some(Map::new()),
        };
        debug!(id = %widget.id, y = widget.position.y, "adding widget");
        self.config.widgets.push(widget);
        id
    }

    /// Remove a widget by id, clearing the selection if it pointed there.
    pub fn remove_widget(&mut self, id: &str) -> bool {
        let before = self.config.widgets.len();
        self.config.widgets.retain(|w| w.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.config.widgets.len() != before
    }

    /// Move a widget. Ignored outside edit mode.
    pub fn update_widget_position(&mut self, id: &str, position: Point) -> bool {
        self.update_widget(
            id,
            WidgetUpdate {
                position: Some(position),
                ..WidgetUpdate::default()
            },
        )
    }

    /// Resize a widget. Ignored outside edit mode.
    pub fn update_widget_size(&mut self, id: &str, size: Size) -> bool {
        self.update_widget(
            id,
            WidgetUpdate {
                size: Some(size),
                ..WidgetUpdate::default()
            },
        )
    }

    /// Apply a partial update to one widget.
    ///
    /// Geometry fields are dropped unless edit mode is on, so a persisted
    /// layout only ever reflects deliberate edits. Returns `true` if
    /// anything changed.
    pub fn update_widget(&mut self, id: &str, update: WidgetUpdate) -> bool {
        let edit_mode = self.config.edit_mode;
        let Some(widget) = self.config.widgets.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        let before = widget.clone();

        if let Some(title) = update.title {
            widget.title = title;
        }
        if let Some(config) = update.config {
            widget.config = Some(config);
        }
        if edit_mode {
            if let Some(position) = update.position {
                widget.position = position;
            }
            if let Some(size) = update.size {
                widget.size = size;
            }
        } else if update.position.is_some() || update.size.is_some() {
            debug!(id, "ignoring geometry change outside edit mode");
        }

        *widget != before
    }

    /// Toggle edit mode. Returns `true` if the flag changed.
    pub fn set_edit_mode(&mut self, enabled: bool) -> bool {
        let changed = self.config.edit_mode != enabled;
        self.config.edit_mode = enabled;
        changed
    }

    /// Replace every widget with the built-in defaults. Edit mode is kept.
    pub fn reset(&mut self) {
        self.config.widgets = super::defaults::default_widgets();
        self.selected = None;
    }

    /// Select a widget (or clear with `None`). Unknown ids clear the selection.
    pub fn select_widget(&mut self, id: Option<&str>) {
        self.selected = id
            .filter(|id| self.widget(id).is_some())
            .map(ToOwned::to_owned);
    }
}

impl Default for LayoutModel {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::default_widgets;
    use pretty_assertions::assert_eq;

    fn empty() -> LayoutModel {
        LayoutModel::new(DashboardConfig {
            widgets: Vec::new(),
            edit_mode: true,
        })
    }

    #[test]
    fn add_to_empty_layout_goes_top_left() {
        let mut model = empty();
        let id = model.add_widget("map", None, 1_700_000_000_000);

        let widget = model.widget(&id).unwrap();
        assert_eq!(id, "map-1700000000000");
        assert_eq!(widget.position, Point { x: 20, y: 20 });
        assert_eq!(widget.size, Size { width: 700, height: 500 });
        assert_eq!(widget.title, "Widget map");
        assert_eq!(widget.config, Some(Map::new()));
    }

    #[test]
    fn add_stacks_below_lowest_widget() {
        let mut model = empty();
        model.add_widget("devices", Some("Fleet"), 1);
        model.add_widget("totalVehicles", None, 2);
        // devices: y 20..420, tile: y 440..660
        let id = model.add_widget("chart", None, 3);
        assert_eq!(model.widget(&id).unwrap().position, Point { x: 20, y: 680 });
        assert_eq!(model.widgets()[0].title, "Fleet");
    }

    #[test]
    fn add_uses_lowest_edge_not_last_widget() {
        let mut model = empty();
        model.add_widget("map", None, 1); // bottom 520
        let small = model.add_widget("averageSpeed", None, 2); // y 540, bottom 760
        assert!(model.update_widget_position(&small, Point { x: 800, y: 20 }));
        let id = model.add_widget("events", None, 3);
        assert_eq!(model.widget(&id).unwrap().position.y, 540);
    }

    #[test]
    fn unknown_kind_gets_fallback_size() {
        let mut model = empty();
        let id = model.add_widget("weather", Some("Weather"), 5);
        assert_eq!(model.widget(&id).unwrap().size, Size { width: 400, height: 300 });
        assert!(model.widget(&id).unwrap().is_inert());
    }

    #[test]
    fn same_millisecond_ids_stay_unique() {
        let mut model = empty();
        let a = model.add_widget("map", None, 10);
        let b = model.add_widget("map", None, 10);
        assert_eq!(a, "map-10");
        assert_eq!(b, "map-11");
    }

    #[test]
    fn remove_clears_selection() {
        let mut model = empty();
        let id = model.add_widget("alerts", None, 1);
        model.select_widget(Some(&id));
        assert_eq!(model.selected(), Some(id.as_str()));

        assert!(model.remove_widget(&id));
        assert!(model.widgets().is_empty());
        assert_eq!(model.selected(), None);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut model = LayoutModel::default();
        assert!(!model.remove_widget("nope"));
        assert_eq!(model.widgets().len(), 6);
    }

    #[test]
    fn geometry_changes_require_edit_mode() {
        let mut model = LayoutModel::default();
        assert!(!model.edit_mode());

        let moved = model.update_widget_position("map-1", Point { x: 1, y: 1 });
        assert!(!moved);
        let resized =
            model.update_widget_size("total-vehicles-1", Size { width: 10, height: 10 });
        assert!(!resized);
        assert_eq!(model.widgets(), default_widgets().as_slice());

        model.set_edit_mode(true);
        assert!(model.update_widget_size("total-vehicles-1", Size { width: 10, height: 10 }));
        assert_eq!(model.widget("total-vehicles-1").unwrap().size.width, 10);
    }

    #[test]
    fn title_updates_allowed_outside_edit_mode() {
        let mut model = LayoutModel::default();
        let changed = model.update_widget(
            "online-vehicles-1",
            WidgetUpdate {
                title: Some("Connected".into()),
                position: Some(Point { x: 999, y: 999 }),
                ..WidgetUpdate::default()
            },
        );
        assert!(changed);
        let widget = model.widget("online-vehicles-1").unwrap();
        assert_eq!(widget.title, "Connected");
        assert_eq!(widget.position, Point { x: 280, y: 20 });
    }

    #[test]
    fn reset_restores_defaults_and_keeps_edit_mode() {
        let mut model = empty();
        model.add_widget("map", None, 1);
        model.reset();
        assert_eq!(model.widgets(), default_widgets().as_slice());
        assert!(model.edit_mode());
    }

    #[test]
    fn canvas_height() {
        let mut model = empty();
        assert_eq!(model.min_canvas_height(), 800);

        model.add_widget("totalVehicles", None, 1); // bottom 240
        assert_eq!(model.min_canvas_height(), 800);

        model.add_widget("fleetComparison", None, 2); // y 260, bottom 760
        assert_eq!(model.min_canvas_height(), 1060);
    }

    #[test]
    fn set_edit_mode_reports_change() {
        let mut model = LayoutModel::default();
        assert!(model.set_edit_mode(true));
        assert!(!model.set_edit_mode(true));
        assert!(model.config().edit_mode);
    }

    #[test]
    fn selecting_unknown_widget_clears_selection() {
        let mut model = LayoutModel::default();
        model.select_widget(Some("average-speed-1"));
        model.select_widget(Some("ghost"));
        assert_eq!(model.selected(), None);
    }
}
