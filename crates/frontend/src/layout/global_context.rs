use crate::config::load_config;
use crate::layout::tabs::session::OpenTabError;
use crate::layout::tabs::storage::default_storage;
use crate::layout::tabs::store::{SessionSnapshot, StoreSettings, TabSessionStore};
use crate::layout::tabs::{url_sync, TabModuleRegistry, TabNavigation};
use crate::shared::clock::SystemClock;
use crate::shared::state::TabState;
use contracts::shared::tabs::{Tab, TabOptions};
use leptos::prelude::Effect;
use leptos::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use web_sys::window;

/// Leptos-side mirror of the tab session.
///
/// `opened` / `active` are kept in sync by a store subscription, so components
/// read them reactively; every change still goes through the store.
#[derive(Clone, Copy)]
pub struct AppGlobalContext {
    pub opened: RwSignal<Vec<Tab>>,
    pub active: RwSignal<Option<String>>,
    store: StoredValue<TabSessionStore>,
}

impl AppGlobalContext {
    pub fn new(store: TabSessionStore) -> Self {
        let opened = RwSignal::new(store.tabs());
        let active = RwSignal::new(store.active_tab_id());

        let subscription = store.subscribe(move |snapshot: &SessionSnapshot| {
            opened.set(snapshot.tabs.clone());
            active.set(snapshot.active_tab_id.clone());
        });
        let store_for_cleanup = store.clone();
        on_cleanup(move || store_for_cleanup.unsubscribe(subscription));

        Self {
            opened,
            active,
            store: StoredValue::new(store),
        }
    }

    pub fn store(&self) -> TabSessionStore {
        self.store.get_value()
    }

    pub fn navigation(&self) -> TabNavigation {
        TabNavigation::new(self.store())
    }

    pub fn open_tab(&self, key: &str, options: TabOptions) -> Result<String, OpenTabError> {
        log::debug!("🔷 open_tab: key='{}'", key);
        self.store().open_tab(key, options)
    }

    pub fn activate_tab(&self, id: &str) {
        log::debug!("🔶 activate_tab: id='{}'", id);
        self.store().switch_tab(id);
    }

    pub fn close_tab(&self, id: &str, force: bool) -> bool {
        log::debug!("🔴 close_tab: id='{}', force={}", id, force);
        self.store().close_tab(id, force)
    }

    pub fn update_tab_title(&self, id: &str, new_title: &str) {
        self.store().update_tab_title(id, new_title);
    }

    /// Reactive lookup of one tab.
    pub fn tab(&self, id: &str) -> Option<Tab> {
        self.opened
            .with(|tabs| tabs.iter().find(|tab| tab.id == id).cloned())
    }

    /// Reactive active tab.
    pub fn active_tab(&self) -> Option<Tab> {
        let active = self.active.get()?;
        self.tab(&active)
    }

    /// Reactive count of tabs with unsaved changes (for a "leave page?" prompt).
    pub fn dirty_count(&self) -> usize {
        self.opened
            .with(|tabs| tabs.iter().filter(|tab| tab.is_dirty).count())
    }

    /// Opens/focuses the tab named in `?active=` and keeps the URL in sync with
    /// the active tab afterwards. Browser only.
    pub fn init_router_integration(&self) {
        let search = window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        url_sync::restore_from_query(&self.navigation(), &search);

        let this = *self;
        Effect::new(move |_| {
            let Some(tab) = this.active_tab() else {
                return;
            };
            let new_url = url_sync::query_for_active(&tab.module_key);

            let current_search = window()
                .and_then(|w| w.location().search().ok())
                .unwrap_or_default();

            // Only update URL if it actually changed
            if current_search != new_url {
                if let Some(w) = window() {
                    if let Ok(history) = w.history() {
                        let _ = history.replace_state_with_url(
                            &wasm_bindgen::JsValue::NULL,
                            "",
                            Some(&new_url),
                        );
                    }
                }
            }
        });
    }
}

pub fn provide_tab_session(store: TabSessionStore) -> AppGlobalContext {
    let ctx = AppGlobalContext::new(store);
    provide_context(ctx);
    ctx
}

pub fn use_tab_session() -> AppGlobalContext {
    use_context::<AppGlobalContext>()
        .expect("AppGlobalContext not found. Wrap your app with TabSessionProvider.")
}

pub fn use_tab_state<T>(tab_id: &str, initial: T) -> TabState<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    TabState::new(use_tab_session().store(), tab_id, initial)
}

pub fn use_tab_navigation() -> TabNavigation {
    use_tab_session().navigation()
}

/// Provides the tab session to children components.
///
/// `config` is optional TOML overriding the embedded `config/tabs.toml`.
#[component]
pub fn TabSessionProvider(
    #[prop(optional)] config: Option<String>,
    children: Children,
) -> impl IntoView {
    let config = load_config(config.as_deref());
    let registry = config.registry().unwrap_or_else(|e| {
        log::error!("Tab module registry rejected: {}", e);
        TabModuleRegistry::new()
    });
    let store = TabSessionStore::new(
        registry,
        StoreSettings {
            capacity: config.capacity,
            storage_key: config.storage_key.clone(),
        },
        default_storage(),
        Arc::new(SystemClock),
    );

    let ctx = provide_tab_session(store);
    ctx.init_router_integration();

    children()
}
