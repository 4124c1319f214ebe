use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!(
                "invalid status '{}': expected not_started, in_progress, completed or cancelled",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!(
                "invalid priority '{}': expected low, medium, high or urgent",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assigned_to_multiple: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    /// Calendar date as sent by the backend (`YYYY-MM-DD` or a timestamp).
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_percentage: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub objective_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_admin_created: bool,
}

impl Keyed for Task {
    fn key(&self) -> &str {
        &self.id
    }
}

pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Query parameters for `GET /api/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Create or partial-update body for a task. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assigned_to_multiple: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskPayload {
    pub fn is_empty(&self) -> bool {
        *self == TaskPayload::default()
    }

    /// Status change body; completing a task also stamps `completed_at`.
    pub fn status_change(status: TaskStatus, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            completed_at: (status == TaskStatus::Completed).then_some(now),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub not_started: usize,
    #[serde(default)]
    pub in_progress: usize,
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub cancelled: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(
            TaskStats {
                total: tasks.len(),
                ..Default::default()
            },
            |mut stats, task| {
                match task.status {
                    TaskStatus::NotStarted => stats.not_started += 1,
                    TaskStatus::InProgress => stats.in_progress += 1,
                    TaskStatus::Completed => stats.completed += 1,
                    TaskStatus::Cancelled => stats.cancelled += 1,
                }
                stats
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAttachment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default, alias = "filename", alias = "name")]
    pub file_name: Option<String>,
    #[serde(default, alias = "type")]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default, alias = "url")]
    pub public_url: Option<String>,
    #[serde(default, alias = "size")]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub uploaded_by_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "uploaded_at", deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TaskAttachment {
    pub fn url(&self) -> Option<&str> {
        self.public_url.as_deref().or(self.file_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNote {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default, alias = "employee_name")]
    pub updated_by_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachments: Vec<TaskAttachment>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for `POST /api/tasks/{id}/add-note`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewNote {
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_to: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached_to_multiple: Vec<String>,
}

/// Result of a task file upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReceipt {
    #[serde(default, alias = "file_url", alias = "public_url")]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str, status: TaskStatus) -> Task {
        serde_json::from_value(json!({ "id": id, "title": id, "status": status })).unwrap()
    }

    #[test]
    fn test_task_row_with_nulls() {
        let t: Task = serde_json::from_value(json!({
            "id": "t1",
            "title": "Quarterly report",
            "status": "in_progress",
            "priority": null,
            "assigned_to_multiple": null,
            "is_admin_created": null,
            "created_at": "2024-04-01T08:00:00.5",
            "objectives": { "title": "Growth" }
        }))
        .unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        assert!(t.priority.is_none());
        assert!(t.assigned_to_multiple.is_empty());
        assert!(!t.is_admin_created);
        assert!(t.created_at.is_some());
    }

    #[test]
    fn test_stats_from_tasks() {
        let tasks = vec![
            task("a", TaskStatus::NotStarted),
            task("b", TaskStatus::Completed),
            task("c", TaskStatus::Completed),
            task("d", TaskStatus::Cancelled),
        ];
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.not_started, 1);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.cancelled, 1);
    }

    #[test]
    fn test_status_change_stamps_completion() {
        let now = Utc::now();
        let done = TaskPayload::status_change(TaskStatus::Completed, now);
        assert_eq!(done.completed_at, Some(now));

        let started = TaskPayload::status_change(TaskStatus::InProgress, now);
        let body = serde_json::to_value(&started).unwrap();
        assert_eq!(body, json!({ "status": "in_progress" }));
    }

    #[test]
    fn test_filter_omits_unset_fields() {
        let filter = TaskFilter {
            status: Some(TaskStatus::NotStarted),
            search: Some("invoice".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(&filter).unwrap();
        assert_eq!(body, json!({ "status": "not_started", "search": "invoice" }));
    }

    #[test]
    fn test_attachment_field_aliases() {
        let a: TaskAttachment = serde_json::from_value(json!({
            "id": "u1-0",
            "filename": "plan.pdf",
            "public_url": "https://cdn.example.com/plan.pdf",
            "file_type": "application/pdf",
            "size": 2048,
            "created_at": "2024-04-02T11:00:00"
        }))
        .unwrap();
        assert_eq!(a.file_name.as_deref(), Some("plan.pdf"));
        assert_eq!(a.file_size, Some(2048));
        assert_eq!(a.url(), Some("https://cdn.example.com/plan.pdf"));
    }

    #[test]
    fn test_status_parsing_accepts_dashes() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("pending".parse::<TaskStatus>().is_err());
        assert_eq!("URGENT".parse::<Priority>(), Ok(Priority::Urgent));
    }
}
