use async_trait::async_trait;
use reqwest::Method;

use super::{extract, extract_optional, segment, ApiClient};
use crate::errors::ApiError;
use crate::models::objective::{Objective, ObjectivePayload};
use crate::sync::Resource;

#[derive(Clone, Debug)]
pub struct ObjectivesApi {
    client: ApiClient,
}

impl ObjectivesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Objective>, ApiError> {
        let body = self
            .client
            .get("/objectives", "Failed to fetch objectives")
            .await?;
        extract(body, "objectives")
    }

    pub async fn get(&self, id: &str) -> Result<Objective, ApiError> {
        let body = self
            .client
            .get(&format!("/objectives/{}", segment(id)), "Objective not found")
            .await?;
        extract(body, "objective")
    }

    pub async fn create(&self, payload: &ObjectivePayload) -> Result<Option<Objective>, ApiError> {
        let body = self
            .client
            .send(Method::POST, "/objectives", payload, "Failed to create objective")
            .await?;
        extract_optional(body, "objective")
    }

    pub async fn update(&self, id: &str, payload: &ObjectivePayload) -> Result<Option<Objective>, ApiError> {
        let body = self
            .client
            .send(
                Method::PUT,
                &format!("/objectives/{}", segment(id)),
                payload,
                "Failed to update objective",
            )
            .await?;
        extract_optional(body, "objective")
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .call(
                Method::DELETE,
                &format!("/objectives/{}", segment(id)),
                "Failed to delete objective",
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for ObjectivesApi {
    type Item = Objective;
    const NAME: &'static str = "objectives";

    async fn fetch_all(&self) -> Result<Vec<Objective>, ApiError> {
        self.list().await
    }
}
