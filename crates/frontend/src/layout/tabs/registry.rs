//! Реестр модулей табов - единственный источник правды для маппинга
//! module key → {title, icon, allow_multiple}.
//!
//! Сессия табов только читает реестр. Компоненты для отрисовки маршрутов
//! регистрирует UI-слой отдельно.

use contracts::shared::tabs::TabModule;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("module key must not be empty")]
    EmptyKey,
    #[error("module '{0}' is registered twice")]
    DuplicateKey(String),
    #[error("module '{0}' has an empty title")]
    EmptyTitle(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabModuleRegistry {
    modules: HashMap<String, TabModule>,
}

impl TabModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, rejecting empty keys, blank titles and duplicates.
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (String, TabModule)>,
    {
        let mut modules = HashMap::new();
        for (key, module) in entries {
            if key.trim().is_empty() {
                return Err(RegistryError::EmptyKey);
            }
            if module.title.trim().is_empty() {
                return Err(RegistryError::EmptyTitle(key));
            }
            if modules.contains_key(&key) {
                return Err(RegistryError::DuplicateKey(key));
            }
            modules.insert(key, module);
        }
        Ok(Self { modules })
    }

    /// Builder-style registration; a later entry replaces an earlier one.
    pub fn with(mut self, key: impl Into<String>, module: TabModule) -> Self {
        self.modules.insert(key.into(), module);
        self
    }

    pub fn get(&self, key: &str) -> Option<&TabModule> {
        self.modules.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.modules.contains_key(key)
    }

    pub fn allows_multiple(&self, key: &str) -> bool {
        self.modules
            .get(key)
            .map(|module| module.allow_multiple)
            .unwrap_or(false)
    }

    /// Заголовок таба по ключу модуля. Fallback: пустая строка.
    pub fn tab_label_for_key(&self, key: &str) -> &str {
        self.modules
            .get(key)
            .map(|module| module.title.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, title: &str) -> (String, TabModule) {
        (key.to_string(), TabModule::new(title))
    }

    #[test]
    fn test_lookup() {
        let registry = TabModuleRegistry::new()
            .with("/samples", TabModule::new("样本查询").with_icon("search"))
            .with("/projects/detail", TabModule::new("项目详情").multiple());

        assert!(registry.contains("/samples"));
        assert!(!registry.contains("/unknown"));
        assert_eq!(registry.get("/samples").unwrap().icon.as_deref(), Some("search"));
        assert!(registry.allows_multiple("/projects/detail"));
        assert!(!registry.allows_multiple("/samples"));
        assert!(!registry.allows_multiple("/unknown"));
        assert_eq!(registry.tab_label_for_key("/samples"), "样本查询");
        assert_eq!(registry.tab_label_for_key("/unknown"), "");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let result = TabModuleRegistry::from_entries(vec![
            entry("/samples", "A"),
            entry("/samples", "B"),
        ]);
        assert_eq!(result, Err(RegistryError::DuplicateKey("/samples".to_string())));
    }

    #[test]
    fn test_from_entries_rejects_blank_values() {
        assert_eq!(
            TabModuleRegistry::from_entries(vec![entry(" ", "A")]),
            Err(RegistryError::EmptyKey)
        );
        assert_eq!(
            TabModuleRegistry::from_entries(vec![entry("/storage", "")]),
            Err(RegistryError::EmptyTitle("/storage".to_string()))
        );
    }
}
