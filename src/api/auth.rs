use reqwest::Method;
use serde_json::Value;

use super::{extract, ApiClient};
use crate::errors::ApiError;
use crate::models::auth::{ChangePasswordRequest, LoginRequest, LoginResponse, User};
use crate::models::employee::Employee;
use crate::session::Credentials;

/// Sign-in lifecycle: login, token validation on start, logout.
#[derive(Clone, Debug)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange email and password for a token and store it in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let body = self
            .client
            .send_anonymous(
                Method::POST,
                "/auth/login",
                &LoginRequest { email, password },
                "Login failed",
            )
            .await?;

        let resp: LoginResponse = serde_json::from_value(body)
            .map_err(|_| ApiError::Decode("Invalid response from server".to_string()))?;
        let user = resp.user.clone();
        self.client.session().establish(Credentials {
            token: resp.token,
            user: resp.user,
        });
        Ok(user)
    }

    /// Clear the local session, then tell the server. The server call is best
    /// effort: the client is signed out whatever it answers.
    pub async fn logout(&self) {
        let token = self.client.session().token();
        self.client.session().invalidate();

        if let Some(token) = token {
            if let Err(e) = self
                .client
                .call_with_token(Method::POST, "/auth/logout", &token, "Logout failed")
                .await
            {
                tracing::debug!(error = %e, "server-side logout failed");
            }
        }
    }

    pub async fn validate_token(&self) -> Result<bool, ApiError> {
        let body = self.client.get("/auth/validate-token", "Token validation failed").await?;
        Ok(body.get("valid").and_then(Value::as_bool).unwrap_or(false))
    }

    /// Load a cached credential and check it with the server. Any failure to
    /// confirm the token, a network error included, clears the cache.
    pub async fn restore(&self) -> Result<Option<User>, ApiError> {
        let session = self.client.session();
        if !session.load_cached() {
            return Ok(None);
        }

        match self.validate_token().await {
            Ok(true) => Ok(session.user()),
            Ok(false) => {
                tracing::info!("cached token is no longer valid");
                session.invalidate();
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not validate cached token");
                session.invalidate();
                Err(e)
            }
        }
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        self.client
            .send(
                Method::POST,
                "/auth/change-password",
                &ChangePasswordRequest {
                    current_password: current,
                    new_password: new,
                },
                "Failed to change password",
            )
            .await?;
        Ok(())
    }

    /// Profile of the signed-in employee. Admin tokens get a list back; the
    /// first entry is used.
    pub async fn profile(&self) -> Result<Employee, ApiError> {
        let body = self.client.get("/employee/profile", "Failed to fetch profile").await?;

        if body.get("employee").is_some_and(|v| !v.is_null()) {
            return extract(body, "employee");
        }
        let mut list: Vec<Employee> = extract(body, "employees")?;
        if list.is_empty() {
            return Err(ApiError::NotFound("No employee data found".to_string()));
        }
        Ok(list.swap_remove(0))
    }
}
