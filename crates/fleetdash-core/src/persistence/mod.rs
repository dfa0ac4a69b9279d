// ── Dashboard persistence ──
//
// Keeps the dashboard configuration in memory and mirrors it to the
// `dashboardConfig` attribute of the user profile. Writes are debounced on
// the trailing edge: each update cancels the pending write and schedules a
// new one, so a burst of edits produces one request carrying the last
// snapshot.
//
// The in-memory config is authoritative. Failed writes are logged and
// dropped; the next edit schedules a fresh attempt.

mod profile;
mod scheduler;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetdash_api::User;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use profile::ProfileStore;
pub use scheduler::ScheduledTask;

use crate::config::PersistenceConfig;
use crate::layout::DashboardConfig;
use crate::lock;

/// Profile attribute holding the JSON-encoded [`DashboardConfig`].
pub const DASHBOARD_CONFIG_ATTRIBUTE: &str = "dashboardConfig";

/// Observable persistence state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStatus {
    /// `true` until the initial load has completed.
    pub loading: bool,
    /// `true` while a profile write is in flight.
    pub saving: bool,
}

/// Debounced bridge between the dashboard config and the user profile.
///
/// Clones share state. Scheduling a write spawns onto the current tokio
/// runtime, so [`update_config`](Self::update_config) must be called from
/// within one.
pub struct DashboardPersistence<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for DashboardPersistence<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<P> {
    store: P,
    debounce: Duration,
    user: Mutex<Option<User>>,
    config: watch::Sender<DashboardConfig>,
    status: watch::Sender<PersistenceStatus>,
    /// Set by every update, cleared when a write picks up the snapshot.
    dirty: AtomicBool,
    saves_in_flight: AtomicUsize,
    pending: Mutex<Option<ScheduledTask>>,
}

impl<P: ProfileStore> DashboardPersistence<P> {
    pub fn new(store: P, config: PersistenceConfig) -> Self {
        let (config_tx, _) = watch::channel(DashboardConfig::default());
        let (status_tx, _) = watch::channel(PersistenceStatus {
            loading: true,
            saving: false,
        });

        Self {
            inner: Arc::new(Inner {
                store,
                debounce: config.debounce,
                user: Mutex::new(None),
                config: config_tx,
                status: status_tx,
                dirty: AtomicBool::new(false),
                saves_in_flight: AtomicUsize::new(0),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Adopt `user` and read its stored dashboard configuration.
    ///
    /// A missing or malformed attribute yields `default`. Without a user
    /// the default is used and later writes are skipped.
    pub fn load(&self, user: Option<User>, default: DashboardConfig) -> DashboardConfig {
        let stored = user
            .as_ref()
            .and_then(|u| u.attribute_str(DASHBOARD_CONFIG_ATTRIBUTE));

        let config = match stored {
            Some(raw) => match DashboardConfig::from_json(raw) {
                Ok(config) => {
                    info!(widgets = config.widgets.len(), "dashboard configuration loaded");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "stored dashboard configuration is malformed, using default");
                    default
                }
            },
            None => {
                debug!("no stored dashboard configuration, using default");
                default
            }
        };

        *lock(&self.inner.user) = user;
        self.inner.config.send_replace(config.clone());
        self.inner.status.send_modify(|s| s.loading = false);
        config
    }

    /// Replace the in-memory config and schedule a write after the
    /// debounce delay, superseding any write still waiting.
    pub fn update_config(&self, config: DashboardConfig) {
        self.inner.config.send_replace(config);
        self.inner.dirty.store(true, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let task = ScheduledTask::schedule(self.inner.debounce, async move {
            inner.save().await;
        });

        if let Some(previous) = lock(&self.inner.pending).replace(task) {
            debug!("superseding pending dashboard save");
            previous.cancel();
        }
    }

    /// Write the latest config now instead of waiting for the timer.
    ///
    /// Waits for a write that is already running. Does nothing when every
    /// update has been picked up by a write.
    pub async fn flush(&self) {
        let pending = lock(&self.inner.pending).take();
        if let Some(task) = pending {
            task.cancel();
            task.join().await;
        }

        if self.inner.dirty.load(Ordering::SeqCst) {
            self.inner.save().await;
        }
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn config(&self) -> DashboardConfig {
        self.inner.config.borrow().clone()
    }

    pub fn subscribe_config(&self) -> watch::Receiver<DashboardConfig> {
        self.inner.config.subscribe()
    }

    pub fn status(&self) -> PersistenceStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PersistenceStatus> {
        self.inner.status.subscribe()
    }

    /// The user as last returned by the server.
    pub fn user(&self) -> Option<User> {
        lock(&self.inner.user).clone()
    }

    /// `true` if an update has not yet been picked up by a write.
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &P {
        &self.inner.store
    }
}

impl<P> DashboardPersistence<P> {
    /// Cancel a waiting write. A write already in flight completes.
    pub fn shutdown(&self) {
        let pending = lock(&self.inner.pending).take();
        if let Some(task) = pending {
            debug!("cancelling pending dashboard save");
            task.cancel();
        }
    }
}

impl<P: ProfileStore> Inner<P> {
    async fn save(&self) {
        self.dirty.store(false, Ordering::SeqCst);

        let user = lock(&self.user).clone();
        let Some(mut user) = user else {
            debug!("no user loaded, skipping dashboard save");
            return;
        };

        let config = self.config.borrow().clone();
        let raw = match config.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode dashboard configuration");
                return;
            }
        };
        user.attributes
            .insert(DASHBOARD_CONFIG_ATTRIBUTE.to_owned(), Value::String(raw));

        let _saving = SavingGuard::enter(self);
        match self.store.update_user(&user).await {
            Ok(saved) => {
                info!(
                    user = saved.id,
                    widgets = config.widgets.len(),
                    "dashboard configuration saved"
                );
                *lock(&self.user) = Some(saved);
            }
            Err(e) => {
                warn!(error = %e, "failed to save dashboard configuration");
            }
        }
    }
}

/// Holds `saving` high for the lifetime of one write.
struct SavingGuard<'a, P> {
    inner: &'a Inner<P>,
}

impl<'a, P> SavingGuard<'a, P> {
    fn enter(inner: &'a Inner<P>) -> Self {
        inner.saves_in_flight.fetch_add(1, Ordering::SeqCst);
        inner.status.send_modify(|s| s.saving = true);
        Self { inner }
    }
}

impl<P> Drop for SavingGuard<'_, P> {
    fn drop(&mut self) {
        if self.inner.saves_in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.status.send_modify(|s| s.saving = false);
        }
    }
}
