use crate::layout::tabs::store::TabSessionStore;
use contracts::shared::tabs::{StateMap, TabPatch};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Typed view over one tab's `state` blob.
///
/// Nothing is cached here: every read goes to the store, so all handles for
/// the same tab agree and a re-created handle picks up where the last left off.
/// Writes mark the tab dirty; `reset_state` puts the initial value back and
/// marks it clean.
#[derive(Debug, Clone)]
pub struct TabState<T> {
    store: TabSessionStore,
    tab_id: String,
    initial: T,
    initial_map: StateMap,
}

fn to_map<S: Serialize>(value: &S) -> Option<StateMap> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            log::warn!("Tab state must serialize to an object, got {}", other);
            None
        }
        Err(e) => {
            log::warn!("Tab state not serializable: {}", e);
            None
        }
    }
}

impl<T> TabState<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(store: TabSessionStore, tab_id: impl Into<String>, initial: T) -> Self {
        let initial_map = to_map(&initial).unwrap_or_default();
        Self {
            store,
            tab_id: tab_id.into(),
            initial,
            initial_map,
        }
    }

    fn stored_map(&self) -> Option<StateMap> {
        self.store.get_tab(&self.tab_id).and_then(|tab| tab.state)
    }

    /// Stored state, with fields it lacks taken from the initial value.
    pub fn state(&self) -> T {
        let Some(stored) = self.stored_map() else {
            return self.initial.clone();
        };
        let mut merged = self.initial_map.clone();
        merged.extend(stored);
        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
            log::warn!("Tab '{}' state does not match its type: {}", self.tab_id, e);
            self.initial.clone()
        })
    }

    /// Shallow merge: top-level fields of `partial` replace the current ones.
    pub fn set_state<P: Serialize>(&self, partial: P) {
        let Some(partial) = to_map(&partial) else {
            return;
        };
        let mut current = self
            .stored_map()
            .unwrap_or_else(|| self.initial_map.clone());
        current.extend(partial);
        self.write(current, true);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut state = self.state();
        f(&mut state);
        self.replace_state(state);
    }

    pub fn replace_state(&self, state: T) {
        if let Some(map) = to_map(&state) {
            self.write(map, true);
        }
    }

    pub fn mark_dirty(&self) {
        self.store.set_tab_dirty(&self.tab_id, true);
    }

    pub fn mark_clean(&self) {
        self.store.set_tab_dirty(&self.tab_id, false);
    }

    /// Discard changes.
    pub fn reset_state(&self) {
        self.write(self.initial_map.clone(), false);
    }

    pub fn is_dirty(&self) -> bool {
        self.store
            .get_tab(&self.tab_id)
            .map(|tab| tab.is_dirty)
            .unwrap_or(false)
    }

    fn write(&self, state: StateMap, is_dirty: bool) {
        self.store.update_tab_state(
            &self.tab_id,
            TabPatch {
                state: Some(state),
                is_dirty: Some(is_dirty),
                ..TabPatch::default()
            },
        );
    }
}
