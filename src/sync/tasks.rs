use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use super::{ApplyOutcome, Consistency, Mirror, Refresh};
use crate::api::{TaskQuery, TasksApi};
use crate::errors::ApiError;
use crate::models::task::{Task, TaskPayload, TaskStats, TaskStatus, UploadReceipt};
use crate::session::Session;

/// A mirrored task list (one filter, or "my tasks") with optimistic edits.
#[derive(Clone)]
pub struct TaskBoard {
    mirror: Arc<Mirror<TaskQuery>>,
}

impl TaskBoard {
    pub fn new(query: TaskQuery, session: Session, consistency: Consistency) -> Self {
        Self {
            mirror: Arc::new(Mirror::new(query, session, consistency)),
        }
    }

    pub fn refresher(&self) -> Arc<dyn Refresh> {
        self.mirror.clone()
    }

    fn api(&self) -> &TasksApi {
        self.mirror.source().api()
    }

    pub async fn refresh(&self) -> Result<ApplyOutcome, ApiError> {
        self.mirror.refresh().await
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.mirror.items().items().await
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        self.mirror.items().get(id).await
    }

    /// Counters derived from the local list.
    pub async fn stats(&self) -> TaskStats {
        self.mirror.items().with(TaskStats::from_tasks).await
    }

    pub async fn create(&self, payload: &TaskPayload) -> Result<Option<Task>, ApiError> {
        match self.mirror.remote(self.api().create(payload)).await? {
            Some(task) => {
                self.place(task.clone()).await;
                Ok(Some(task))
            }
            None => {
                self.reload("create").await;
                Ok(None)
            }
        }
    }

    pub async fn update(&self, id: &str, payload: &TaskPayload) -> Result<Option<Task>, ApiError> {
        match self.mirror.remote(self.api().update(id, payload)).await? {
            Some(task) => {
                self.place(task.clone()).await;
                Ok(Some(task))
            }
            None => {
                self.reload("update").await;
                Ok(None)
            }
        }
    }

    /// Completing a task also stamps `completed_at`, locally and on the server.
    pub async fn set_status(&self, id: &str, status: TaskStatus) -> Result<(), ApiError> {
        let now = Utc::now();
        let payload = TaskPayload::status_change(status, now);
        let echoed = self.mirror.remote(self.api().update(id, &payload)).await?;

        match echoed {
            Some(task) => self.place(task).await,
            None => {
                self.mirror
                    .items()
                    .mutate(|items| {
                        if let Some(task) = items.iter_mut().find(|t| t.id == id) {
                            task.status = status;
                            if status == TaskStatus::Completed {
                                task.completed_at = Some(now);
                            }
                            task.updated_at = Some(now);
                        }
                    })
                    .await
            }
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.api().delete(id)).await?;
        self.mirror.items().remove(id).await;
        Ok(())
    }

    /// Attachments live outside the task row; the list is not touched.
    pub async fn upload_file(&self, id: &str, file: &Path) -> Result<UploadReceipt, ApiError> {
        self.mirror.remote(self.api().upload_file(id, file)).await
    }

    pub async fn reset(&self) {
        self.mirror.items().clear().await;
    }

    /// Insert or replace, dropping the task if it no longer matches the view.
    async fn place(&self, task: Task) {
        if self.mirror.source().admits(&task) {
            self.mirror.items().upsert(task).await;
        } else {
            self.mirror.items().remove(&task.id).await;
        }
    }

    async fn reload(&self, after: &'static str) {
        if let Err(e) = self.mirror.refresh().await {
            tracing::warn!(resource = "tasks", after, error = %e, "reload after mutation failed");
        }
    }
}
