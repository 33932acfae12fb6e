//! TabSessionStore - единственный владелец списка табов и активного таба.
//!
//! Все изменения идут через стор: после каждого изменения он пишет
//! очищенный снимок в durable storage и синхронно оповещает подписчиков.
//! Стор не зависит от Leptos; привязка к сигналам живёт в `global_context`.

use super::registry::TabModuleRegistry;
use super::session::{CloseOutcome, OpenTabError, TabSession};
use super::snapshot;
use super::storage::SnapshotStorage;
use crate::config::{SessionConfig, DEFAULT_CAPACITY, DEFAULT_STORAGE_KEY};
use crate::layout::tabs::registry::RegistryError;
use crate::shared::clock::{Clock, SystemClock};
use contracts::shared::tabs::{Tab, TabOptions, TabPatch};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What subscribers receive after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<String>,
}

impl SessionSnapshot {
    fn of(session: &TabSession) -> Self {
        Self {
            tabs: session.tabs().to_vec(),
            active_tab_id: session.active_tab_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Snapshots waiting for delivery. A listener that mutates the store only
/// queues its snapshot; the outer `notify` delivers it after the current round.
#[derive(Default)]
struct Dispatch {
    pending: VecDeque<SessionSnapshot>,
    draining: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub capacity: usize,
    pub storage_key: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

struct StoreInner {
    registry: TabModuleRegistry,
    settings: StoreSettings,
    storage: Arc<dyn SnapshotStorage>,
    clock: Arc<dyn Clock>,
    session: Mutex<TabSession>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    dispatch: Mutex<Dispatch>,
    next_subscription: AtomicU64,
}

/// Shared handle; clones point at the same session.
#[derive(Clone)]
pub struct TabSessionStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for TabSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session();
        f.debug_struct("TabSessionStore")
            .field("storage_key", &self.inner.settings.storage_key)
            .field("tabs", &session.len())
            .field("active_tab_id", &session.active_tab_id())
            .finish()
    }
}

impl TabSessionStore {
    /// Creates the store and rehydrates it from `storage`.
    pub fn new(
        registry: TabModuleRegistry,
        settings: StoreSettings,
        storage: Arc<dyn SnapshotStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = Self::hydrate(storage.as_ref(), &registry, &settings);
        Self {
            inner: Arc::new(StoreInner {
                registry,
                settings,
                storage,
                clock,
                session: Mutex::new(session),
                listeners: Mutex::new(Vec::new()),
                dispatch: Mutex::new(Dispatch::default()),
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    pub fn from_config(
        config: &SessionConfig,
        storage: Arc<dyn SnapshotStorage>,
    ) -> Result<Self, RegistryError> {
        let registry = config.registry()?;
        let settings = StoreSettings {
            capacity: config.capacity,
            storage_key: config.storage_key.clone(),
        };
        Ok(Self::new(registry, settings, storage, Arc::new(SystemClock)))
    }

    fn hydrate(
        storage: &dyn SnapshotStorage,
        registry: &TabModuleRegistry,
        settings: &StoreSettings,
    ) -> TabSession {
        let raw = match storage.load(&settings.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return TabSession::new(settings.capacity),
            Err(e) => {
                log::warn!("Tab session not restored: {}", e);
                return TabSession::new(settings.capacity);
            }
        };
        match snapshot::decode(&raw) {
            Ok(Some(persisted)) => {
                let session = TabSession::restore(persisted, registry, settings.capacity);
                log::info!("Restored {} tabs from '{}'", session.len(), settings.storage_key);
                session
            }
            Ok(None) => TabSession::new(settings.capacity),
            Err(e) => {
                log::warn!("Tab session snapshot unreadable, starting empty: {}", e);
                TabSession::new(settings.capacity)
            }
        }
    }

    fn session(&self) -> MutexGuard<'_, TabSession> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the session; when it reports a change the snapshot is
    /// persisted and subscribers are notified after the lock is released.
    fn mutate<R>(&self, f: impl FnOnce(&mut TabSession) -> (R, bool)) -> R {
        let (result, snapshot) = {
            let mut session = self.session();
            let (result, changed) = f(&mut *session);
            (result, changed.then(|| SessionSnapshot::of(&*session)))
        };
        if let Some(snapshot) = snapshot {
            self.persist(&snapshot);
            self.notify(snapshot);
        }
        result
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        let persisted = snapshot::to_persisted(&snapshot.tabs, snapshot.active_tab_id.as_deref());
        let result = snapshot::encode(&persisted).and_then(|raw| {
            self.inner
                .storage
                .save(&self.inner.settings.storage_key, &raw)
        });
        if let Err(e) = result {
            log::warn!("Tab session not persisted: {}", e);
        }
    }

    fn dispatch(&self) -> MutexGuard<'_, Dispatch> {
        self.inner
            .dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Every listener sees every snapshot, in mutation order.
    fn notify(&self, snapshot: SessionSnapshot) {
        {
            let mut dispatch = self.dispatch();
            dispatch.pending.push_back(snapshot);
            if dispatch.draining {
                return;
            }
            dispatch.draining = true;
        }
        loop {
            let next = {
                let mut dispatch = self.dispatch();
                match dispatch.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        dispatch.draining = false;
                        return;
                    }
                }
            };
            let listeners: Vec<Listener> = self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            for listener in listeners {
                listener(&next);
            }
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(subscription, _)| *subscription != id);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn registry(&self) -> &TabModuleRegistry {
        &self.inner.registry
    }

    pub fn capacity(&self) -> usize {
        self.session().capacity()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::of(&self.session())
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.session().tabs().to_vec()
    }

    pub fn active_tab_id(&self) -> Option<String> {
        self.session().active_tab_id().map(str::to_string)
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.session().active_tab().cloned()
    }

    pub fn get_tab(&self, id: &str) -> Option<Tab> {
        self.session().get(id).cloned()
    }

    pub fn find_tab_by_module_key(&self, module_key: &str) -> Option<Tab> {
        self.session().find_by_module_key(module_key).cloned()
    }

    pub fn dirty_tabs_count(&self) -> usize {
        self.session().dirty_count()
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Opens (or focuses) a tab for `module_key` and returns its id.
    pub fn open_tab(&self, module_key: &str, options: TabOptions) -> Result<String, OpenTabError> {
        let now = self.inner.clock.now_millis();
        let registry = &self.inner.registry;
        self.mutate(|session| {
            match session.open(registry, module_key, options, now) {
                Ok(outcome) => (Ok(outcome.id().to_string()), true),
                Err(e) => (Err(e), false),
            }
        })
    }

    /// Returns false only when a dirty tab was not force-closed.
    pub fn close_tab(&self, id: &str, force: bool) -> bool {
        self.mutate(|session| match session.close(id, force) {
            CloseOutcome::NotFound => (true, false),
            CloseOutcome::Blocked => (false, false),
            CloseOutcome::Closed => (true, true),
        })
    }

    pub fn switch_tab(&self, id: &str) {
        self.mutate(|session| ((), session.switch(id)));
    }

    pub fn update_tab_state(&self, id: &str, patch: TabPatch) {
        if patch.is_empty() {
            return;
        }
        self.mutate(|session| ((), session.update(id, patch)));
    }

    pub fn update_tab_title(&self, id: &str, title: &str) {
        self.update_tab_state(id, TabPatch::title(title));
    }

    pub fn set_tab_dirty(&self, id: &str, is_dirty: bool) {
        self.mutate(|session| ((), session.set_dirty(id, is_dirty)));
    }

    pub fn save_scroll_position(&self, id: &str, position: f64) {
        self.mutate(|session| ((), session.save_scroll_position(id, position)));
    }

    pub fn close_other_tabs(&self, id: &str) {
        self.mutate(|session| ((), session.close_others(id)));
    }

    pub fn close_all_tabs(&self) {
        self.mutate(|session| ((), session.close_all()));
    }

    /// Drops the whole session, including the persisted record (logout).
    pub fn reset(&self) {
        let snapshot = {
            let mut session = self.session();
            *session = TabSession::new(self.inner.settings.capacity);
            SessionSnapshot::of(&session)
        };
        if let Err(e) = self.inner.storage.remove(&self.inner.settings.storage_key) {
            log::warn!("Persisted tab session not removed: {}", e);
        }
        log::info!("Tab session reset");
        self.notify(snapshot);
    }
}
