use crate::layout::tabs::registry::{RegistryError, TabModuleRegistry};
use contracts::shared::tabs::TabModule;
use serde::Deserialize;

pub const DEFAULT_CAPACITY: usize = 20;
pub const DEFAULT_STORAGE_KEY: &str = "tabs-storage";

/// Default configuration embedded in the bundle
const DEFAULT_CONFIG: &str = include_str!("../config/tabs.toml");

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

/// `[[modules]]` entry: module key plus its registry defaults
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModuleEntry {
    pub key: String,
    #[serde(flatten)]
    pub module: TabModule,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            modules: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Builds the module registry described by `[[modules]]`.
    pub fn registry(&self) -> Result<TabModuleRegistry, RegistryError> {
        TabModuleRegistry::from_entries(
            self.modules
                .iter()
                .map(|entry| (entry.key.clone(), entry.module.clone())),
        )
    }
}

/// Parse and validate a TOML session configuration.
pub fn parse_config(text: &str) -> anyhow::Result<SessionConfig> {
    let config: SessionConfig = toml::from_str(text)?;
    anyhow::ensure!(config.capacity > 0, "capacity must be at least 1");
    anyhow::ensure!(
        !config.storage_key.trim().is_empty(),
        "storage_key must not be empty"
    );
    Ok(config)
}

/// Load the session configuration.
///
/// Order:
/// 1. `custom` TOML supplied by the host page (if any and valid)
/// 2. the embedded `config/tabs.toml`
/// 3. built-in defaults without modules
pub fn load_config(custom: Option<&str>) -> SessionConfig {
    if let Some(text) = custom {
        match parse_config(text) {
            Ok(config) => {
                log::info!("Loaded custom tab session config");
                return config;
            }
            Err(e) => log::warn!("Custom tab session config rejected: {:#}", e),
        }
    }

    match parse_config(DEFAULT_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Embedded tab session config is invalid: {:#}", e);
            SessionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.capacity, 20);
        assert_eq!(config.storage_key, "tabs-storage");

        let registry = config.registry().unwrap();
        let samples = registry.get("/samples").unwrap();
        assert_eq!(samples.title, "样本查询");
        assert!(!samples.allow_multiple);
        assert!(registry.get("/projects/detail").unwrap().allow_multiple);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = parse_config(
            r#"
            [[modules]]
            key = "/samples"
            title = "Samples"
            "#,
        )
        .unwrap();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.modules[0].module.icon, None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(parse_config("capacity = 0").is_err());
    }

    #[test]
    fn test_invalid_custom_config_falls_back_to_embedded() {
        let config = load_config(Some("capacity = \"many\""));
        assert_eq!(config.capacity, 20);
        assert!(!config.modules.is_empty());
    }

    #[test]
    fn test_custom_config_wins() {
        let config = load_config(Some("capacity = 3\nstorage_key = \"lims-tabs\""));
        assert_eq!(config.capacity, 3);
        assert_eq!(config.storage_key, "lims-tabs");
        assert!(config.modules.is_empty());
    }
}
