use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

use super::{extract, extract_optional, segment, ApiClient};
use crate::errors::ApiError;
use crate::models::employee::{Employee, EmployeePayload, PasswordReset};
use crate::sync::Resource;

#[derive(Serialize)]
struct ListParams {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    include_inactive: bool,
}

#[derive(Clone, Debug)]
pub struct EmployeesApi {
    client: ApiClient,
    include_inactive: bool,
}

impl EmployeesApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            include_inactive: false,
        }
    }

    /// Same client, listing deactivated employees too when `include` is set.
    pub fn including_inactive(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }

    pub fn includes_inactive(&self) -> bool {
        self.include_inactive
    }

    pub async fn list(&self) -> Result<Vec<Employee>, ApiError> {
        let params = ListParams {
            include_inactive: self.include_inactive,
        };
        let body = self
            .client
            .get_query("/employees", &params, "Failed to fetch employees")
            .await?;
        extract(body, "employees")
    }

    pub async fn get(&self, id: &str) -> Result<Employee, ApiError> {
        let body = self
            .client
            .get(&format!("/employees/{}", segment(id)), "Employee not found")
            .await?;
        extract(body, "employee")
    }

    /// The new employee can sign in with one of `login_info.default_passwords`.
    pub async fn create(&self, payload: &EmployeePayload) -> Result<(Option<Employee>, PasswordReset), ApiError> {
        let mut body = self
            .client
            .send(Method::POST, "/employees", payload, "Failed to create employee")
            .await?;
        let login = body
            .get_mut("login_info")
            .map(Value::take)
            .map(serde_json::from_value::<PasswordReset>)
            .transpose()?
            .unwrap_or_default();
        Ok((extract_optional(body, "employee")?, login))
    }

    pub async fn update(&self, id: &str, payload: &EmployeePayload) -> Result<Option<Employee>, ApiError> {
        let body = self
            .client
            .send(
                Method::PUT,
                &format!("/employees/{}", segment(id)),
                payload,
                "Failed to update employee",
            )
            .await?;
        extract_optional(body, "employee")
    }

    /// Soft delete: the server flips `is_active` off.
    pub async fn deactivate(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .call(
                Method::DELETE,
                &format!("/employees/{}", segment(id)),
                "Failed to deactivate employee",
            )
            .await?;
        Ok(())
    }

    /// There is no dedicated status route; this is a partial update.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<Option<Employee>, ApiError> {
        let payload = EmployeePayload {
            is_active: Some(active),
            ..Default::default()
        };
        self.update(id, &payload).await
    }

    pub async fn delete_permanently(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .call(
                Method::DELETE,
                &format!("/employees/{}/permanent", segment(id)),
                "Failed to delete employee permanently",
            )
            .await?;
        Ok(())
    }

    pub async fn reset_password(&self, id: &str) -> Result<PasswordReset, ApiError> {
        let body = self
            .client
            .call(
                Method::POST,
                &format!("/employees/{}/reset-password", segment(id)),
                "Failed to reset password",
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Returns the new public photo URL.
    pub async fn upload_photo(&self, id: &str, file: &Path) -> Result<Option<String>, ApiError> {
        let body = self
            .client
            .upload(
                &format!("/employees/{}/upload-photo", segment(id)),
                "photo",
                file,
                "Failed to upload photo",
            )
            .await?;
        extract_optional(body, "photo_url")
    }

    pub async fn remove_photo(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .call(
                Method::DELETE,
                &format!("/employees/{}/remove-photo", segment(id)),
                "Failed to remove photo",
            )
            .await?;
        Ok(())
    }

    /// An empty `url` clears the link.
    pub async fn set_job_description(&self, id: &str, url: &str) -> Result<(), ApiError> {
        self.client
            .send(
                Method::PUT,
                &format!("/employees/{}/jd-link", segment(id)),
                &json!({ "job_description_url": url }),
                "Failed to update JD link",
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for EmployeesApi {
    type Item = Employee;
    const NAME: &'static str = "employees";

    async fn fetch_all(&self) -> Result<Vec<Employee>, ApiError> {
        self.list().await
    }
}
