//! Навигация между табами: единая точка входа для UI-кода.
//!
//! Пути, которых нет в реестре, не трогают стор: вызывающий код сам уходит
//! на обычную навигацию по страницам.

use super::session::OpenTabError;
use super::store::TabSessionStore;
use contracts::shared::tabs::{Tab, TabOptions};

#[derive(Debug, Clone)]
pub struct TabNavigation {
    store: TabSessionStore,
}

impl TabNavigation {
    pub fn new(store: TabSessionStore) -> Self {
        Self { store }
    }

    pub fn navigate(&self, path: &str, options: TabOptions) -> Result<String, OpenTabError> {
        if !self.is_tab_path(path) {
            log::debug!("navigate: '{}' is not a tab path", path);
            return Err(OpenTabError::UnknownModule(path.to_string()));
        }
        self.store.open_tab(path, options)
    }

    pub fn open_tab(&self, path: &str, options: TabOptions) -> Result<String, OpenTabError> {
        self.navigate(path, options)
    }

    pub fn is_tab_path(&self, path: &str) -> bool {
        self.store.registry().contains(path)
    }

    pub fn get_active_tab(&self) -> Option<Tab> {
        self.store.active_tab()
    }

    pub fn navigate_to_existing(&self, path: &str) -> bool {
        match self.store.find_tab_by_module_key(path) {
            Some(tab) => {
                self.store.switch_tab(&tab.id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tabs::store::tests::test_store;

    #[test]
    fn test_navigate_opens_once_per_single_instance_path() {
        let store = test_store();
        let nav = TabNavigation::new(store.clone());

        let first = nav.navigate("/samples", TabOptions::default()).unwrap();
        let second = nav.navigate("/samples", TabOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.tabs().len(), 1);
    }

    #[test]
    fn test_unknown_path_leaves_store_untouched() {
        let store = test_store();
        let nav = TabNavigation::new(store.clone());
        nav.navigate("/samples", TabOptions::default()).unwrap();

        assert_eq!(
            nav.navigate("/unknown", TabOptions::default()),
            Err(OpenTabError::UnknownModule("/unknown".to_string()))
        );
        assert_eq!(store.tabs().len(), 1);
        assert!(!nav.is_tab_path("/unknown"));
        assert!(nav.is_tab_path("/storage"));
    }

    #[test]
    fn test_open_tab_is_navigate() {
        let store = test_store();
        let nav = TabNavigation::new(store.clone());
        let id = nav.open_tab("/storage", TabOptions::default()).unwrap();
        assert_eq!(nav.get_active_tab().map(|tab| tab.id), Some(id));
    }

    #[test]
    fn test_navigate_to_existing() {
        let store = test_store();
        let nav = TabNavigation::new(store.clone());
        assert_eq!(nav.get_active_tab(), None);
        assert!(!nav.navigate_to_existing("/samples"));
        assert!(store.tabs().is_empty());

        let samples = nav.navigate("/samples", TabOptions::default()).unwrap();
        nav.navigate("/storage", TabOptions::default()).unwrap();
        assert!(nav.navigate_to_existing("/samples"));
        assert_eq!(store.active_tab_id(), Some(samples));
        assert_eq!(store.tabs().len(), 2);
    }
}
