use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{null_as_false, Priority};
use super::{timestamp, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    Draft,
    InProgress,
    Completed,
    Cancelled,
}

impl ObjectiveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveStatus::Draft => "draft",
            ObjectiveStatus::InProgress => "in_progress",
            ObjectiveStatus::Completed => "completed",
            ObjectiveStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectiveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "draft" => Ok(ObjectiveStatus::Draft),
            "in_progress" => Ok(ObjectiveStatus::InProgress),
            "completed" => Ok(ObjectiveStatus::Completed),
            "cancelled" => Ok(ObjectiveStatus::Cancelled),
            other => Err(format!(
                "invalid objective status '{}': expected draft, in_progress, completed or cancelled",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<ObjectiveStatus>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_admin_created: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Keyed for Objective {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectivePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ObjectiveStatus>,
}

impl ObjectivePayload {
    pub fn is_empty(&self) -> bool {
        *self == ObjectivePayload::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_objective_row() {
        let o: Objective = serde_json::from_value(json!({
            "id": "o1",
            "title": "Expand to EU",
            "deadline": "2024-12-31",
            "priority": "high",
            "status": "draft",
            "is_admin_created": true
        }))
        .unwrap();
        assert_eq!(o.status, Some(ObjectiveStatus::Draft));
        assert_eq!(o.priority, Some(Priority::High));
        assert!(o.is_admin_created);
    }

    #[test]
    fn test_payload_skips_unset() {
        let p = ObjectivePayload {
            status: Some(ObjectiveStatus::InProgress),
            ..Default::default()
        };
        assert!(!p.is_empty());
        assert_eq!(serde_json::to_value(&p).unwrap(), json!({ "status": "in_progress" }));
    }
}
