//! Tab session state machine: the open-tab list, the active pointer and the
//! capacity/eviction rules. Pure and synchronous; persistence and change
//! notification live in [`super::store`].

use super::registry::TabModuleRegistry;
use contracts::shared::tabs::{PersistedSession, Tab, TabOptions, TabPatch};
use std::collections::HashSet;
use thiserror::Error;

/// Why `open_tab` / `navigate` did not produce a tab. Both are soft failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenTabError {
    #[error("module '{0}' is not a tab module")]
    UnknownModule(String),
    #[error("all {capacity} open tabs hold unsaved changes")]
    CapacityExhausted { capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Created {
        id: String,
        evicted: Option<String>,
    },
    /// Single-instance module already open; it was activated.
    Focused { id: String },
}

impl OpenOutcome {
    pub fn id(&self) -> &str {
        match self {
            OpenOutcome::Created { id, .. } | OpenOutcome::Focused { id } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    NotFound,
    /// Dirty tab, close not forced.
    Blocked,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabSession {
    tabs: Vec<Tab>,
    active_tab_id: Option<String>,
    capacity: usize,
}

impl TabSession {
    pub fn new(capacity: usize) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: None,
            capacity: capacity.max(1),
        }
    }

    /// Rebuilds a session from an already sanitized snapshot, dropping what
    /// the current registry and invariants no longer allow: duplicate ids,
    /// unregistered modules, extra instances of single-instance modules and
    /// tabs past capacity. A dangling active id falls back to the first tab.
    pub fn restore(
        persisted: PersistedSession,
        registry: &TabModuleRegistry,
        capacity: usize,
    ) -> Self {
        let mut session = Self::new(capacity);
        let mut seen = HashSet::new();
        for tab in persisted.tabs {
            if !seen.insert(tab.id.clone()) {
                log::warn!("Dropping restored tab with duplicate id '{}'", tab.id);
                continue;
            }
            if !registry.contains(&tab.module_key) {
                log::warn!(
                    "Dropping restored tab '{}': module '{}' is not registered",
                    tab.id,
                    tab.module_key
                );
                continue;
            }
            if !registry.allows_multiple(&tab.module_key)
                && session.find_by_module_key(&tab.module_key).is_some()
            {
                log::warn!(
                    "Dropping restored tab '{}': module '{}' is single-instance",
                    tab.id,
                    tab.module_key
                );
                continue;
            }
            if session.tabs.len() >= session.capacity {
                log::warn!("Restored session exceeds capacity {}, truncating", session.capacity);
                break;
            }
            session.tabs.push(tab);
        }
        session.active_tab_id = match persisted.active_tab_id {
            Some(id) if session.contains(&id) => Some(id),
            _ => session.tabs.first().map(|tab| tab.id.clone()),
        };
        session
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn find_by_module_key(&self, module_key: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.module_key == module_key)
    }

    pub fn dirty_count(&self) -> usize {
        self.tabs.iter().filter(|tab| tab.is_dirty).count()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.id == id)
    }

    /// Oldest clean tab; the left-most one wins on equal `created_at`.
    fn eviction_candidate(&self) -> Option<usize> {
        self.tabs
            .iter()
            .enumerate()
            .filter(|(_, tab)| !tab.is_dirty)
            .min_by_key(|(_, tab)| tab.created_at)
            .map(|(index, _)| index)
    }

    fn generate_id(&self, module_key: &str, now: i64) -> String {
        let base = format!("{}-{}", module_key, now);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.contains(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        candidate
    }

    pub fn open(
        &mut self,
        registry: &TabModuleRegistry,
        module_key: &str,
        options: TabOptions,
        now: i64,
    ) -> Result<OpenOutcome, OpenTabError> {
        let Some(module) = registry.get(module_key) else {
            log::warn!("open_tab: unknown module '{}'", module_key);
            return Err(OpenTabError::UnknownModule(module_key.to_string()));
        };

        if !module.allow_multiple && !options.force_new {
            if let Some(existing) = self.find_by_module_key(module_key) {
                let id = existing.id.clone();
                log::debug!("🔶 open_tab: '{}' already open as '{}', activating", module_key, id);
                self.active_tab_id = Some(id.clone());
                return Ok(OpenOutcome::Focused { id });
            }
        }

        let mut evicted = None;
        if self.tabs.len() >= self.capacity {
            let Some(index) = self.eviction_candidate() else {
                log::warn!(
                    "open_tab: capacity {} reached and every tab is dirty, '{}' not opened",
                    self.capacity,
                    module_key
                );
                return Err(OpenTabError::CapacityExhausted {
                    capacity: self.capacity,
                });
            };
            let removed = self.tabs.remove(index);
            log::info!("open_tab: evicted '{}' to make room", removed.id);
            evicted = Some(removed.id);
        }

        let id = match options.id {
            Some(id) if !self.contains(&id) => id,
            Some(id) => {
                log::warn!("open_tab: id '{}' is taken, generating a new one", id);
                self.generate_id(module_key, now)
            }
            None => self.generate_id(module_key, now),
        };

        let tab = Tab {
            id: id.clone(),
            module_key: module_key.to_string(),
            title: options.title.unwrap_or_else(|| module.title.clone()),
            icon: module.icon.clone(),
            params: options.params,
            state: options.initial_state,
            scroll_position: 0.0,
            is_dirty: false,
            created_at: now,
        };
        self.tabs.push(tab);
        self.active_tab_id = Some(id.clone());
        log::debug!("🔷 open_tab: '{}' as '{}', total {}", module_key, id, self.tabs.len());

        Ok(OpenOutcome::Created { id, evicted })
    }

    pub fn close(&mut self, id: &str, force: bool) -> CloseOutcome {
        let Some(index) = self.position(id) else {
            return CloseOutcome::NotFound;
        };
        if self.tabs[index].is_dirty && !force {
            log::debug!("close_tab: '{}' has unsaved changes", id);
            return CloseOutcome::Blocked;
        }

        self.tabs.remove(index);
        if self.active_tab_id.as_deref() == Some(id) {
            let next_active = self
                .tabs
                .get(index)
                .or_else(|| self.tabs.last())
                .map(|tab| tab.id.clone());
            log::debug!("➡️ close_tab: next active {:?}", next_active);
            self.active_tab_id = next_active;
        }
        CloseOutcome::Closed
    }

    pub fn switch(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active_tab_id = Some(id.to_string());
        true
    }

    /// Shallow merge of `patch` into the tab. Returns false when the tab is gone.
    pub fn update(&mut self, id: &str, patch: TabPatch) -> bool {
        let Some(tab) = self.get_mut(id) else {
            return false;
        };
        if let Some(title) = patch.title {
            tab.title = title;
        }
        if let Some(icon) = patch.icon {
            tab.icon = Some(icon);
        }
        if let Some(state) = patch.state {
            tab.state = Some(state);
        }
        if let Some(position) = patch.scroll_position {
            tab.scroll_position = position;
        }
        if let Some(is_dirty) = patch.is_dirty {
            tab.is_dirty = is_dirty;
        }
        true
    }

    pub fn set_dirty(&mut self, id: &str, is_dirty: bool) -> bool {
        self.update(
            id,
            TabPatch {
                is_dirty: Some(is_dirty),
                ..TabPatch::default()
            },
        )
    }

    pub fn save_scroll_position(&mut self, id: &str, position: f64) -> bool {
        self.update(
            id,
            TabPatch {
                scroll_position: Some(position),
                ..TabPatch::default()
            },
        )
    }

    /// Keeps `id` and every dirty tab.
    pub fn close_others(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.tabs.retain(|tab| tab.id == id || tab.is_dirty);
        self.active_tab_id = Some(id.to_string());
        true
    }

    /// Keeps only dirty tabs.
    pub fn close_all(&mut self) -> bool {
        let before = self.tabs.len();
        let active_before = self.active_tab_id.clone();
        self.tabs.retain(|tab| tab.is_dirty);
        self.active_tab_id = self.tabs.first().map(|tab| tab.id.clone());
        before != self.tabs.len() || active_before != self.active_tab_id
    }
}
