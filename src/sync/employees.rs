use std::path::Path;
use std::sync::Arc;

use super::{ApplyOutcome, Consistency, Mirror, Refresh};
use crate::api::{ApiClient, EmployeesApi};
use crate::errors::ApiError;
use crate::models::employee::{Employee, EmployeePayload, PasswordReset};

/// Mirrored employee list. Hides deactivated employees unless built with
/// `include_inactive`.
#[derive(Clone)]
pub struct EmployeeDirectory {
    mirror: Arc<Mirror<EmployeesApi>>,
}

impl EmployeeDirectory {
    pub fn new(client: &ApiClient, include_inactive: bool, consistency: Consistency) -> Self {
        Self {
            mirror: Arc::new(Mirror::new(
                client.employees().including_inactive(include_inactive),
                client.session().clone(),
                consistency,
            )),
        }
    }

    pub fn refresher(&self) -> Arc<dyn Refresh> {
        self.mirror.clone()
    }

    fn api(&self) -> &EmployeesApi {
        self.mirror.source()
    }

    pub async fn refresh(&self) -> Result<ApplyOutcome, ApiError> {
        self.mirror.refresh().await
    }

    pub async fn employees(&self) -> Vec<Employee> {
        self.mirror.items().items().await
    }

    pub async fn get(&self, id: &str) -> Option<Employee> {
        self.mirror.items().get(id).await
    }

    pub async fn create(&self, payload: &EmployeePayload) -> Result<(Option<Employee>, PasswordReset), ApiError> {
        let (created, login) = self.mirror.remote(self.api().create(payload)).await?;
        self.settle(created.clone(), "create").await;
        Ok((created, login))
    }

    pub async fn update(&self, id: &str, payload: &EmployeePayload) -> Result<Option<Employee>, ApiError> {
        let updated = self.mirror.remote(self.api().update(id, payload)).await?;
        self.settle(updated.clone(), "update").await;
        Ok(updated)
    }

    /// Soft delete on the server. Locally the employee is flagged inactive,
    /// or dropped when inactive employees are hidden.
    pub async fn deactivate(&self, id: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.api().deactivate(id)).await?;
        self.patch_active(id, false).await;
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<(), ApiError> {
        match self.mirror.remote(self.api().set_active(id, active)).await? {
            Some(employee) => self.place(employee).await,
            None if active && !self.api().includes_inactive() => {
                // The reactivated row was not in the hidden-inactive list.
                self.reload("set_active").await
            }
            None => self.patch_active(id, active).await,
        }
        Ok(())
    }

    pub async fn delete_permanently(&self, id: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.api().delete_permanently(id)).await?;
        self.mirror.items().remove(id).await;
        Ok(())
    }

    pub async fn reset_password(&self, id: &str) -> Result<PasswordReset, ApiError> {
        self.mirror.remote(self.api().reset_password(id)).await
    }

    pub async fn upload_photo(&self, id: &str, file: &Path) -> Result<Option<String>, ApiError> {
        let url = self.mirror.remote(self.api().upload_photo(id, file)).await?;
        if let Some(url) = &url {
            let url = url.clone();
            self.mirror
                .items()
                .mutate(|items| {
                    if let Some(e) = items.iter_mut().find(|e| e.id == id) {
                        e.photo_url = Some(url);
                    }
                })
                .await;
        }
        Ok(url)
    }

    pub async fn remove_photo(&self, id: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.api().remove_photo(id)).await?;
        self.mirror
            .items()
            .mutate(|items| {
                if let Some(e) = items.iter_mut().find(|e| e.id == id) {
                    e.photo_url = None;
                }
            })
            .await;
        Ok(())
    }

    pub async fn set_job_description(&self, id: &str, url: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.api().set_job_description(id, url)).await?;
        let url = url.trim();
        let link = (!url.is_empty()).then(|| url.to_string());
        self.mirror
            .items()
            .mutate(|items| {
                if let Some(e) = items.iter_mut().find(|e| e.id == id) {
                    e.job_description_url = link;
                }
            })
            .await;
        Ok(())
    }

    pub async fn reset(&self) {
        self.mirror.items().clear().await;
    }

    async fn patch_active(&self, id: &str, active: bool) {
        let hide = !active && !self.api().includes_inactive();
        self.mirror
            .items()
            .mutate(|items| {
                if hide {
                    items.retain(|e| e.id != id);
                } else if let Some(e) = items.iter_mut().find(|e| e.id == id) {
                    e.is_active = active;
                }
            })
            .await;
    }

    async fn place(&self, employee: Employee) {
        if employee.is_active || self.api().includes_inactive() {
            self.mirror.items().upsert(employee).await;
        } else {
            self.mirror.items().remove(&employee.id).await;
        }
    }

    async fn settle(&self, echoed: Option<Employee>, after: &'static str) {
        match echoed {
            Some(employee) => self.place(employee).await,
            None => self.reload(after).await,
        }
    }

    async fn reload(&self, after: &'static str) {
        if let Err(e) = self.mirror.refresh().await {
            tracing::warn!(resource = "employees", after, error = %e, "reload after mutation failed");
        }
    }
}
