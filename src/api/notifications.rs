use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::{extract_optional, segment, ApiClient};
use crate::errors::ApiError;
use crate::models::notification::{Notification, NotificationFeed};
use crate::sync::{reconcile, Resource};

#[derive(Clone, Debug)]
pub struct NotificationsApi {
    client: ApiClient,
}

impl NotificationsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<NotificationFeed, ApiError> {
        let body = self
            .client
            .get("/notifications", "Failed to fetch notifications")
            .await?;
        if body.is_array() {
            return Ok(NotificationFeed {
                notifications: serde_json::from_value(body)?,
                unread_count: None,
                total: None,
            });
        }
        Ok(serde_json::from_value(body)?)
    }

    pub async fn unread_count(&self) -> Result<usize, ApiError> {
        let body = self
            .client
            .get("/notifications/count", "Failed to fetch notification count")
            .await?;
        Ok(body.get("unread_count").and_then(Value::as_u64).unwrap_or(0) as usize)
    }

    /// Returns the updated row when the server echoes it.
    pub async fn mark_read(&self, id: &str) -> Result<Option<Notification>, ApiError> {
        let body = self
            .client
            .call(
                Method::PUT,
                &format!("/notifications/{}/read", segment(id)),
                "Failed to mark notification as read",
            )
            .await?;
        extract_optional(body, "notification")
    }

    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.client
            .call(
                Method::PUT,
                "/notifications/read-all",
                "Failed to mark all notifications as read",
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .call(
                Method::DELETE,
                &format!("/notifications/{}", segment(id)),
                "Failed to delete notification",
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for NotificationsApi {
    type Item = Notification;
    const NAME: &'static str = "notifications";

    /// The local count is always derived from `is_read`; a server count that
    /// disagrees is only logged.
    async fn fetch_all(&self) -> Result<Vec<Notification>, ApiError> {
        let feed = self.list().await?;
        if let Some(reported) = feed.unread_count {
            let derived = reconcile::unread_count(&feed.notifications);
            if reported != derived {
                tracing::debug!(reported, derived, "server unread count differs from feed");
            }
        }
        Ok(feed.notifications)
    }
}
