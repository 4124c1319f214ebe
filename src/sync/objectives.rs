use std::sync::Arc;

use super::{ApplyOutcome, Consistency, Mirror, Refresh};
use crate::api::{ApiClient, ObjectivesApi};
use crate::errors::ApiError;
use crate::models::objective::{Objective, ObjectivePayload};

#[derive(Clone)]
pub struct ObjectiveBoard {
    mirror: Arc<Mirror<ObjectivesApi>>,
}

impl ObjectiveBoard {
    pub fn new(client: &ApiClient, consistency: Consistency) -> Self {
        Self {
            mirror: Arc::new(Mirror::new(
                client.objectives(),
                client.session().clone(),
                consistency,
            )),
        }
    }

    pub fn refresher(&self) -> Arc<dyn Refresh> {
        self.mirror.clone()
    }

    pub async fn refresh(&self) -> Result<ApplyOutcome, ApiError> {
        self.mirror.refresh().await
    }

    pub async fn objectives(&self) -> Vec<Objective> {
        self.mirror.items().items().await
    }

    pub async fn get(&self, id: &str) -> Option<Objective> {
        self.mirror.items().get(id).await
    }

    pub async fn create(&self, payload: &ObjectivePayload) -> Result<Option<Objective>, ApiError> {
        let created = self.mirror.remote(self.mirror.source().create(payload)).await?;
        self.settle(created.clone(), "create").await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, payload: &ObjectivePayload) -> Result<Option<Objective>, ApiError> {
        let updated = self.mirror.remote(self.mirror.source().update(id, payload)).await?;
        self.settle(updated.clone(), "update").await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.mirror.source().delete(id)).await?;
        self.mirror.items().remove(id).await;
        Ok(())
    }

    pub async fn reset(&self) {
        self.mirror.items().clear().await;
    }

    /// Apply the entity the server echoed, or reload when it sent none.
    async fn settle(&self, echoed: Option<Objective>, after: &'static str) {
        match echoed {
            Some(objective) => self.mirror.items().upsert(objective).await,
            None => {
                if let Err(e) = self.mirror.refresh().await {
                    tracing::warn!(resource = "objectives", after, error = %e, "reload after mutation failed");
                }
            }
        }
    }
}
