use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;

use super::{extract, extract_optional, segment, ApiClient};
use crate::errors::ApiError;
use crate::models::task::{
    NewNote, Task, TaskAttachment, TaskFilter, TaskNote, TaskPayload, TaskStats,
    UploadReceipt,
};
use crate::sync::Resource;

#[derive(Clone, Debug)]
pub struct TasksApi {
    client: ApiClient,
}

impl TasksApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        let body = self
            .client
            .get_query("/tasks", filter, "Failed to fetch tasks")
            .await?;
        extract(body, "tasks")
    }

    /// Tasks assigned to or created by the signed-in employee.
    pub async fn mine(&self) -> Result<Vec<Task>, ApiError> {
        let body = self.client.get("/tasks/my-tasks", "Failed to fetch tasks").await?;
        extract(body, "tasks")
    }

    pub async fn get(&self, id: &str) -> Result<Task, ApiError> {
        let body = self
            .client
            .get(&format!("/tasks/{}", segment(id)), "Task not found")
            .await?;
        extract(body, "task")
    }

    /// `None` when the server acknowledged without echoing the task.
    pub async fn create(&self, payload: &TaskPayload) -> Result<Option<Task>, ApiError> {
        let body = self
            .client
            .send(Method::POST, "/tasks", payload, "Failed to create task")
            .await?;
        extract_optional(body, "task")
    }

    pub async fn update(&self, id: &str, payload: &TaskPayload) -> Result<Option<Task>, ApiError> {
        let body = self
            .client
            .send(
                Method::PUT,
                &format!("/tasks/{}", segment(id)),
                payload,
                "Failed to update task",
            )
            .await?;
        extract_optional(body, "task")
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .call(
                Method::DELETE,
                &format!("/tasks/{}", segment(id)),
                "Failed to delete task",
            )
            .await?;
        Ok(())
    }

    pub async fn upload_file(&self, id: &str, file: &Path) -> Result<UploadReceipt, ApiError> {
        let body = self
            .client
            .upload(
                &format!("/tasks/{}/upload-file", segment(id)),
                "file",
                file,
                "Failed to upload file",
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn attachments(&self, id: &str) -> Result<Vec<TaskAttachment>, ApiError> {
        let body = self
            .client
            .get(
                &format!("/tasks/{}/attachments", segment(id)),
                "Failed to fetch attachments",
            )
            .await?;
        extract(body, "attachments")
    }

    pub async fn notes(&self, id: &str) -> Result<Vec<TaskNote>, ApiError> {
        let body = self
            .client
            .get(&format!("/tasks/{}/notes", segment(id)), "Failed to fetch notes")
            .await?;
        extract(body, "notes")
    }

    pub async fn add_note(&self, id: &str, note: &NewNote) -> Result<Option<TaskNote>, ApiError> {
        let body = self
            .client
            .send(
                Method::POST,
                &format!("/tasks/{}/add-note", segment(id)),
                note,
                "Failed to add note",
            )
            .await?;
        extract_optional(body, "update")
    }

    /// Server-side dashboard counters.
    pub async fn stats(&self) -> Result<TaskStats, ApiError> {
        let body = self
            .client
            .get("/tasks/dashboard", "Failed to fetch dashboard stats")
            .await?;
        extract(body, "stats")
    }

    pub fn query(&self, filter: TaskFilter) -> TaskQuery {
        TaskQuery {
            api: self.clone(),
            scope: TaskScope::Filtered(filter),
        }
    }

    pub fn my_tasks(&self) -> TaskQuery {
        TaskQuery {
            api: self.clone(),
            scope: TaskScope::Mine,
        }
    }
}

#[derive(Clone, Debug)]
enum TaskScope {
    Filtered(TaskFilter),
    Mine,
}

/// A task list view that can be mirrored and polled.
#[derive(Clone, Debug)]
pub struct TaskQuery {
    api: TasksApi,
    scope: TaskScope,
}

impl TaskQuery {
    pub fn api(&self) -> &TasksApi {
        &self.api
    }

    /// Whether a task belongs in this view, judged from local fields only.
    pub fn admits(&self, task: &Task) -> bool {
        match &self.scope {
            TaskScope::Mine => true,
            TaskScope::Filtered(f) => {
                f.status.map_or(true, |s| s == task.status)
                    && f.priority.map_or(true, |p| task.priority == Some(p))
                    && f
                        .assigned_to
                        .as_deref()
                        .map_or(true, |a| task.assigned_to.as_deref() == Some(a))
                    && f
                        .objective_id
                        .as_deref()
                        .map_or(true, |o| task.objective_id.as_deref() == Some(o))
            }
        }
    }
}

#[async_trait]
impl Resource for TaskQuery {
    type Item = Task;
    const NAME: &'static str = "tasks";

    async fn fetch_all(&self) -> Result<Vec<Task>, ApiError> {
        match &self.scope {
            TaskScope::Filtered(filter) => self.api.list(filter).await,
            TaskScope::Mine => self.api.mine().await,
        }
    }
}
