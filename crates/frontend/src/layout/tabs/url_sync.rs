//! Active tab ⇄ `?active=<module key>` in the page URL, so a refresh or a
//! shared link lands on the same module.

use super::navigation::TabNavigation;
use contracts::shared::tabs::TabOptions;
use std::collections::HashMap;

pub const ACTIVE_PARAM: &str = "active";

pub fn active_key_from_query(search: &str) -> Option<String> {
    let params: HashMap<String, String> =
        serde_qs::from_str(search.trim_start_matches('?')).unwrap_or_default();
    params
        .get(ACTIVE_PARAM)
        .filter(|key| !key.is_empty())
        .cloned()
}

pub fn query_for_active(module_key: &str) -> String {
    let query = serde_qs::to_string(&HashMap::from([(ACTIVE_PARAM, module_key)]))
        .unwrap_or_default();
    format!("?{}", query)
}

/// Focuses (or opens) the module named in the query string. Returns the tab id.
pub fn restore_from_query(navigation: &TabNavigation, search: &str) -> Option<String> {
    let module_key = active_key_from_query(search)?;
    if navigation.navigate_to_existing(&module_key) {
        return navigation.get_active_tab().map(|tab| tab.id);
    }
    match navigation.navigate(&module_key, TabOptions::default()) {
        Ok(id) => Some(id),
        Err(e) => {
            log::debug!("URL tab '{}' not opened: {}", module_key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tabs::store::tests::test_store;

    #[test]
    fn test_query_roundtrip() {
        let query = query_for_active("/samples/receive");
        assert!(query.starts_with("?active="));
        assert_eq!(
            active_key_from_query(&query).as_deref(),
            Some("/samples/receive")
        );
    }

    #[test]
    fn test_missing_or_empty_param() {
        assert_eq!(active_key_from_query(""), None);
        assert_eq!(active_key_from_query("?page=2"), None);
        assert_eq!(active_key_from_query("?active="), None);
    }

    #[test]
    fn test_restore_opens_then_focuses() {
        let store = test_store();
        let nav = TabNavigation::new(store.clone());
        let query = query_for_active("/samples");

        let opened = restore_from_query(&nav, &query).unwrap();
        nav.navigate("/storage", TabOptions::default()).unwrap();
        let focused = restore_from_query(&nav, &query).unwrap();

        assert_eq!(opened, focused);
        assert_eq!(store.active_tab_id(), Some(opened));
        assert_eq!(store.tabs().len(), 2);
    }

    #[test]
    fn test_restore_ignores_unknown_modules() {
        let store = test_store();
        let nav = TabNavigation::new(store.clone());
        assert_eq!(restore_from_query(&nav, &query_for_active("/nowhere")), None);
        assert!(store.tabs().is_empty());
    }
}
