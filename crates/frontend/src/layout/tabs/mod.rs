//! Tab session management
//!
//! Содержит:
//! - `registry` - маппинг module key → настройки таба (единственный источник правды)
//! - `session` - список табов, активный таб, лимит и вытеснение
//! - `snapshot` - очищенный снимок сессии для durable storage
//! - `storage` - localStorage / in-memory хранилище снимка
//! - `store` - общий стор: персист после каждого изменения и подписки
//! - `navigation` - навигация по путям с проверкой по реестру
//! - `url_sync` - активный таб в query string

pub mod navigation;
pub mod registry;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod url_sync;

pub use navigation::TabNavigation;
pub use registry::{RegistryError, TabModuleRegistry};
pub use session::OpenTabError;
pub use storage::{default_storage, BrowserStorage, MemoryStorage, SnapshotStorage, StorageError};
pub use store::{SessionSnapshot, StoreSettings, SubscriptionId, TabSessionStore};
