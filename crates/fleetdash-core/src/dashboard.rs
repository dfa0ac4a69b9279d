// ── Dashboard store ──
//
// Owns the layout model and its persistence. Every mutation is applied
// locally first and, when it changed something, handed to persistence as a
// full snapshot. Selection is view state and is never persisted.

use std::sync::Mutex;

use chrono::Utc;
use fleetdash_api::User;
use tokio::sync::watch;

use crate::layout::{DashboardConfig, LayoutModel, Point, Size, Widget, WidgetUpdate};
use crate::lock;
use crate::persistence::{DashboardPersistence, PersistenceStatus, ProfileStore};

/// The dashboard a host application renders and edits.
pub struct Dashboard<P> {
    model: Mutex<LayoutModel>,
    persistence: DashboardPersistence<P>,
}

impl<P: ProfileStore> Dashboard<P> {
    /// Start with the default layout. Call [`load`](Self::load) once the
    /// signed-in user is known.
    pub fn new(persistence: DashboardPersistence<P>) -> Self {
        Self {
            model: Mutex::new(LayoutModel::default()),
            persistence,
        }
    }

    /// Replace the layout with the one stored on `user`.
    pub fn load(&self, user: Option<User>) {
        let config = self.persistence.load(user, DashboardConfig::default());
        *lock(&self.model) = LayoutModel::new(config);
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn config(&self) -> DashboardConfig {
        lock(&self.model).config().clone()
    }

    pub fn widgets(&self) -> Vec<Widget> {
        lock(&self.model).widgets().to_vec()
    }

    pub fn widget(&self, id: &str) -> Option<Widget> {
        lock(&self.model).widget(id).cloned()
    }

    pub fn edit_mode(&self) -> bool {
        lock(&self.model).edit_mode()
    }

    pub fn selected(&self) -> Option<String> {
        lock(&self.model).selected().map(ToOwned::to_owned)
    }

    pub fn min_canvas_height(&self) -> u32 {
        lock(&self.model).min_canvas_height()
    }

    pub fn status(&self) -> PersistenceStatus {
        self.persistence.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PersistenceStatus> {
        self.persistence.subscribe_status()
    }

    pub fn persistence(&self) -> &DashboardPersistence<P> {
        &self.persistence
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Add a widget stamped with the current time. Returns its id.
    pub fn add_widget(&self, kind: &str, title: Option<&str>) -> String {
        let created_at_ms = Utc::now().timestamp_millis();
        self.edit(|model| (model.add_widget(kind, title, created_at_ms), true))
    }

    pub fn remove_widget(&self, id: &str) -> bool {
        self.edit(|model| {
            let removed = model.remove_widget(id);
            (removed, removed)
        })
    }

    pub fn update_widget_position(&self, id: &str, position: Point) -> bool {
        self.edit(|model| {
            let changed = model.update_widget_position(id, position);
            (changed, changed)
        })
    }

    pub fn update_widget_size(&self, id: &str, size: Size) -> bool {
        self.edit(|model| {
            let changed = model.update_widget_size(id, size);
            (changed, changed)
        })
    }

    pub fn update_widget(&self, id: &str, update: WidgetUpdate) -> bool {
        self.edit(|model| {
            let changed = model.update_widget(id, update);
            (changed, changed)
        })
    }

    pub fn set_edit_mode(&self, enabled: bool) -> bool {
        self.edit(|model| {
            let changed = model.set_edit_mode(enabled);
            (changed, changed)
        })
    }

    /// Restore the six default widgets. Always persisted.
    pub fn reset_dashboard(&self) {
        self.edit(|model| {
            model.reset();
            ((), true)
        });
    }

    pub fn select_widget(&self, id: Option<&str>) {
        lock(&self.model).select_widget(id);
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Send any unsaved layout change now.
    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    /// Drop a pending save without sending it.
    pub fn shutdown(&self) {
        self.persistence.shutdown();
    }

    /// Run `f` on the model and persist the result if it reports a change.
    ///
    /// The snapshot is handed over under the model lock so concurrent
    /// edits reach persistence in the order they were applied.
    fn edit<R>(&self, f: impl FnOnce(&mut LayoutModel) -> (R, bool)) -> R {
        let mut model = lock(&self.model);
        let (result, changed) = f(&mut *model);
        if changed {
            self.persistence.update_config(model.config().clone());
        }
        result
    }
}

/// Leaving the dashboard drops any save still waiting on the debounce.
/// Hosts that need the last edit on the server call
/// [`flush`](Dashboard::flush) first.
impl<P> Drop for Dashboard<P> {
    fn drop(&mut self) {
        self.persistence.shutdown();
    }
}
