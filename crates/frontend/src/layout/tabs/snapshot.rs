//! Snapshot codec: live session ⇄ sanitized persisted record.
//!
//! `scroll_position` and `is_dirty` only live for the current page load, so
//! both are zeroed once on the way out (`to_persisted`) and once on the way
//! in (`decode`). `encode` only wraps what it is given.

use super::storage::StorageError;
use contracts::shared::tabs::{PersistedRecord, PersistedSession, Tab, SNAPSHOT_VERSION};

/// Copy of `tab` without session-only fields.
pub fn sanitize(tab: &Tab) -> Tab {
    Tab {
        scroll_position: 0.0,
        is_dirty: false,
        ..tab.clone()
    }
}

pub fn to_persisted(tabs: &[Tab], active_tab_id: Option<&str>) -> PersistedSession {
    PersistedSession {
        tabs: tabs.iter().map(sanitize).collect(),
        active_tab_id: active_tab_id.map(str::to_string),
    }
}

pub fn encode(session: &PersistedSession) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&PersistedRecord::new(session.clone()))?)
}

/// Decodes a stored record. A record written by another format version is
/// treated as absent.
pub fn decode(raw: &str) -> Result<Option<PersistedSession>, StorageError> {
    let record: PersistedRecord = serde_json::from_str(raw)?;
    if record.version != SNAPSHOT_VERSION {
        log::warn!(
            "Discarding tab snapshot version {} (expected {})",
            record.version,
            SNAPSHOT_VERSION
        );
        return Ok(None);
    }
    let PersistedSession {
        tabs,
        active_tab_id,
    } = record.state;
    Ok(Some(to_persisted(&tabs, active_tab_id.as_deref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dirty_tab(id: &str) -> Tab {
        Tab {
            id: id.to_string(),
            module_key: "/samples".to_string(),
            title: "样本查询".to_string(),
            icon: Some("search".to_string()),
            params: None,
            state: json!({"page": 3}).as_object().cloned(),
            scroll_position: 420.0,
            is_dirty: true,
            created_at: 7,
        }
    }

    #[test]
    fn test_sanitize_resets_session_fields_only() {
        let tab = dirty_tab("a");
        let clean = sanitize(&tab);
        assert!(!clean.is_dirty);
        assert_eq!(clean.scroll_position, 0.0);
        assert_eq!(clean.state, tab.state);
        assert_eq!(clean.icon, tab.icon);
        assert_eq!(clean.created_at, 7);
    }

    #[test]
    fn test_encoded_record_never_carries_dirty_or_scroll() {
        let session = to_persisted(&[dirty_tab("a"), dirty_tab("b")], Some("b"));
        let raw = encode(&session).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["version"], SNAPSHOT_VERSION);
        assert_eq!(value["state"]["activeTabId"], "b");
        for tab in value["state"]["tabs"].as_array().unwrap() {
            assert_eq!(tab["isDirty"], false);
            assert_eq!(tab["scrollPosition"], 0.0);
        }
    }

    #[test]
    fn test_decode_sanitizes_hand_edited_records() {
        let raw = r#"{"version":1,"state":{"tabs":[
            {"id":"a","moduleKey":"/samples","title":"S","createdAt":1,"isDirty":true,"scrollPosition":99}
        ],"activeTabId":"a"}}"#;
        let session = decode(raw).unwrap().unwrap();
        assert!(!session.tabs[0].is_dirty);
        assert_eq!(session.tabs[0].scroll_position, 0.0);
    }

    #[test]
    fn test_decode_discards_other_versions() {
        let raw = r#"{"version":0,"state":{"tabs":[],"activeTabId":null}}"#;
        assert_eq!(decode(raw).unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not json"), Err(StorageError::Codec(_))));
    }
}
