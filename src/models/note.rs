use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single captured note. Written once, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedNote {
    pub id: String,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Reserved for edit support; always `None` when a note is created.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl CapturedNote {
    /// Builds a fresh note. `text` must already be trimmed and non-empty.
    pub fn new(text: String, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            created_at,
            updated_at: None,
        }
    }
}

/// Trims `raw` and returns `None` when nothing is left to save.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_whitespace_only() {
        assert_eq!(normalize_text(""), None);
        assert_eq!(normalize_text("  \n\t "), None);
        assert_eq!(normalize_text("  buy milk \n"), Some("buy milk".to_string()));
    }

    #[test]
    fn new_notes_get_distinct_ids_and_no_update_stamp() {
        let a = CapturedNote::new("a".into(), 1);
        let b = CapturedNote::new("b".into(), 2);
        assert_ne!(a.id, b.id);
        assert_eq!(a.updated_at, None);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let note = CapturedNote {
            id: "n1".into(),
            text: "hello".into(),
            created_at: 42,
            updated_at: None,
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["createdAt"], 42);
        assert!(json["updatedAt"].is_null());
    }
}
