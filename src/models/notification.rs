use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{timestamp, Keyed};

/// Notification type tag. Unknown tags survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    TaskAssigned,
    TaskUpdated,
    TaskStatusChanged,
    FileUploaded,
    NoteAdded,
    ProgressUpdated,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::TaskUpdated => "task_updated",
            NotificationKind::TaskStatusChanged => "task_status_changed",
            NotificationKind::FileUploaded => "file_uploaded",
            NotificationKind::NoteAdded => "note_added",
            NotificationKind::ProgressUpdated => "progress_updated",
            NotificationKind::Other(tag) => tag,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "info" => NotificationKind::Info,
            "success" => NotificationKind::Success,
            "warning" => NotificationKind::Warning,
            "error" => NotificationKind::Error,
            "task_assigned" => NotificationKind::TaskAssigned,
            "task_updated" => NotificationKind::TaskUpdated,
            "task_status_changed" => NotificationKind::TaskStatusChanged,
            "file_uploaded" => NotificationKind::FileUploaded,
            "note_added" => NotificationKind::NoteAdded,
            "progress_updated" => NotificationKind::ProgressUpdated,
            _ => NotificationKind::Other(tag),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque cross-reference bag. Never interpreted by the sync engine; the
/// accessors exist for display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationMeta(pub Map<String, Value>);

impl NotificationMeta {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn task_id(&self) -> Option<&str> {
        self.str_field("task_id")
    }

    pub fn file_name(&self) -> Option<&str> {
        self.str_field("file_name")
    }

    /// Whoever caused the event: assigner, note author, or uploader.
    pub fn actor(&self) -> Option<&str> {
        self.str_field("assigned_by")
            .or_else(|| self.str_field("added_by"))
            .or_else(|| self.str_field("uploaded_by"))
    }

    pub fn kind_tag(&self) -> Option<&str> {
        self.str_field("type")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NotificationRecord")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub meta: NotificationMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Keyed for Notification {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Raw row as served by `/api/notifications`.
#[derive(Debug, Deserialize)]
struct NotificationRecord {
    id: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    is_read: Option<bool>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    read_at: Option<DateTime<Utc>>,
}

impl From<NotificationRecord> for Notification {
    fn from(raw: NotificationRecord) -> Self {
        let meta = NotificationMeta(raw.meta.unwrap_or_default());
        // meta.type wins over the top-level column.
        let kind = meta
            .kind_tag()
            .map(str::to_string)
            .or(raw.kind)
            .filter(|t| !t.is_empty())
            .map(NotificationKind::from)
            .unwrap_or(NotificationKind::Info);

        Self {
            id: match raw.id {
                Value::String(s) => s,
                other => other.to_string(),
            },
            message: raw
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "No message".to_string()),
            kind,
            is_read: raw.is_read.unwrap_or(false),
            meta,
            priority: raw.priority,
            created_at: raw.created_at,
            read_at: raw.read_at,
        }
    }
}

/// Body of `GET /api/notifications`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationFeed {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    /// Server-side count; the client derives its own and only logs a mismatch.
    #[serde(default)]
    pub unread_count: Option<usize>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_row_is_normalized() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "to_employee": "e1",
            "channel": "in_app",
            "message": "Task assigned: Q3 report",
            "meta": { "type": "task_assigned", "task_id": "t9", "assigned_by": "Dana" },
            "priority": "high",
            "is_read": null,
            "created_at": "2024-05-01T09:30:00.123456"
        }))
        .unwrap();

        assert_eq!(n.id, "n1");
        assert_eq!(n.kind, NotificationKind::TaskAssigned);
        assert!(!n.is_read);
        assert_eq!(n.meta.task_id(), Some("t9"));
        assert_eq!(n.meta.actor(), Some("Dana"));
        assert!(n.created_at.is_some());
        assert!(n.read_at.is_none());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let n: Notification = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(n.id, "42");
        assert_eq!(n.message, "No message");
        assert_eq!(n.kind, NotificationKind::Info);
        assert!(n.meta.0.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let n: Notification =
            serde_json::from_value(json!({ "id": "x", "type": "employee_created" })).unwrap();
        assert_eq!(n.kind, NotificationKind::Other("employee_created".into()));
        assert_eq!(n.kind.to_string(), "employee_created");
    }

    #[test]
    fn test_serialized_form_reads_back() {
        let n: Notification = serde_json::from_value(json!({
            "id": "a",
            "type": "note_added",
            "is_read": true,
            "read_at": "2024-05-02T10:00:00Z"
        }))
        .unwrap();
        let again: Notification = serde_json::from_value(serde_json::to_value(&n).unwrap()).unwrap();
        assert_eq!(again, n);
    }
}
