use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Произвольное key→value состояние (params / state таба)
pub type StateMap = Map<String, Value>;

/// Версия формата сохранённой сессии. Записи другой версии при загрузке отбрасываются.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Открытый таб: логическое рабочее пространство, привязанное к модулю (маршруту).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub module_key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<StateMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateMap>,
    #[serde(default)]
    pub scroll_position: f64,
    #[serde(default)]
    pub is_dirty: bool,
    /// epoch millis, only used to order capacity eviction
    pub created_at: i64,
}

/// Запись реестра модулей: настройки по умолчанию для табов одного маршрута.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabModule {
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub allow_multiple: bool,
}

impl TabModule {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            allow_multiple: false,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }
}

/// Параметры открытия таба
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabOptions {
    pub id: Option<String>,
    pub title: Option<String>,
    pub params: Option<StateMap>,
    pub initial_state: Option<StateMap>,
    pub force_new: bool,
}

impl TabOptions {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_params(mut self, params: StateMap) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_initial_state(mut self, state: StateMap) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

/// Частичное обновление таба. `id`, `module_key`, `params` и `created_at`
/// не меняются после создания, поэтому их здесь нет.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabPatch {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub state: Option<StateMap>,
    pub scroll_position: Option<f64>,
    pub is_dirty: Option<bool>,
}

impl TabPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn state(state: StateMap) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.icon.is_none()
            && self.state.is_none()
            && self.scroll_position.is_none()
            && self.is_dirty.is_none()
    }
}

/// Сессия в том виде, в котором она лежит в durable storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub active_tab_id: Option<String>,
}

/// Конверт записи в storage: `{"state": {...}, "version": 1}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub state: PersistedSession,
    pub version: u32,
}

impl PersistedRecord {
    pub fn new(state: PersistedSession) -> Self {
        Self {
            state,
            version: SNAPSHOT_VERSION,
        }
    }
}
