//! Remote store client for the task management REST backend.
//!
//! Every call returns `Result<T, ApiError>`. Transport errors, non-2xx
//! statuses and `{success: false}` envelopes are all folded into `ApiError`
//! here, so nothing above this layer deals with raw HTTP.

pub mod auth;
pub mod employees;
pub mod notifications;
pub mod objectives;
pub mod tasks;

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::errors::ApiError;
use crate::session::Session;

pub use auth::AuthApi;
pub use employees::EmployeesApi;
pub use notifications::NotificationsApi;
pub use objectives::ObjectivesApi;
pub use tasks::{TaskQuery, TasksApi};

/// Shared HTTP client bound to one backend and one session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &Config, session: Session) -> Result<Self, ApiError> {
        Self::with_timeout(&config.api_url, config.request_timeout, session)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration, session: Session) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("taskdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: crate::config::normalize_base_url(base_url),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.clone())
    }

    pub fn tasks(&self) -> TasksApi {
        TasksApi::new(self.clone())
    }

    pub fn objectives(&self) -> ObjectivesApi {
        ObjectivesApi::new(self.clone())
    }

    pub fn employees(&self) -> EmployeesApi {
        EmployeesApi::new(self.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("x-request-id", uuid::Uuid::new_v4().to_string())
    }

    /// Authenticated request. Fails with `Unauthenticated` before touching
    /// the network when no token is held.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.session.token().ok_or(ApiError::Unauthenticated)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    pub(crate) async fn get(&self, path: &str, fallback: &str) -> Result<Value, ApiError> {
        let req = self.authed(Method::GET, path)?;
        self.execute(req, true, fallback).await
    }

    pub(crate) async fn get_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        fallback: &str,
    ) -> Result<Value, ApiError> {
        let req = self.authed(Method::GET, path)?.query(query);
        self.execute(req, true, fallback).await
    }

    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Value, ApiError> {
        let req = self.authed(method, path)?.json(body);
        self.execute(req, true, fallback).await
    }

    /// Body-less POST/PUT/DELETE.
    pub(crate) async fn call(&self, method: Method, path: &str, fallback: &str) -> Result<Value, ApiError> {
        let req = self.authed(method, path)?;
        self.execute(req, true, fallback).await
    }

    /// Unauthenticated JSON request; a 401 here is an ordinary rejection.
    pub(crate) async fn send_anonymous<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Value, ApiError> {
        let req = self.request(method, path).json(body);
        self.execute(req, false, fallback).await
    }

    /// Request with an explicit token that is no longer held by the session.
    /// A 401 does not touch the session.
    pub(crate) async fn call_with_token(
        &self,
        method: Method,
        path: &str,
        token: &str,
        fallback: &str,
    ) -> Result<Value, ApiError> {
        let req = self.request(method, path).bearer_auth(token);
        self.execute(req, false, fallback).await
    }

    /// Multipart upload of a single local file under `field`.
    pub(crate) async fn upload(
        &self,
        path: &str,
        field: &'static str,
        file: &Path,
        fallback: &str,
    ) -> Result<Value, ApiError> {
        let part = file_part(file).await?;
        let req = self.authed(Method::POST, path)?.multipart(Form::new().part(field, part));
        self.execute(req, true, fallback).await
    }

    async fn execute(&self, req: RequestBuilder, authenticated: bool, fallback: &str) -> Result<Value, ApiError> {
        let resp = req.send().await.map_err(|e| {
            tracing::debug!(error = %e, "request failed before a response");
            ApiError::from(e)
        })?;

        let status = resp.status();
        let text = resp.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if status == StatusCode::UNAUTHORIZED {
            if authenticated {
                tracing::warn!("server rejected the session token; signing out");
                self.session.invalidate();
                return Err(ApiError::Unauthenticated);
            }
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: server_message(&body).unwrap_or_else(|| fallback.to_string()),
            });
        }

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request rejected");
            return Err(ApiError::from_status(status, server_message(&body), fallback));
        }

        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: server_message(&body).unwrap_or_else(|| fallback.to_string()),
            });
        }

        Ok(body)
    }
}

/// `error`, then `message`, from a JSON error body.
fn server_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["error", "message"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        Value::String(s) if !s.trim().is_empty() && s.len() <= 200 => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Decode `body[field]` if the body is an envelope carrying it, else the
/// whole body. Covers `{success, employees: [...]}` and a bare `[...]`.
pub(crate) fn extract<T: DeserializeOwned>(body: Value, field: &str) -> Result<T, ApiError> {
    let inner = match body {
        Value::Object(mut map) if map.contains_key(field) => map.remove(field).unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ApiError::Decode(format!("{}: {}", field, e)))
}

/// Like `extract`, but yields `None` when the envelope has no entity (for
/// endpoints that answer with only `{success, message}`).
pub(crate) fn extract_optional<T: DeserializeOwned>(body: Value, field: &str) -> Result<Option<T>, ApiError> {
    match body {
        Value::Object(mut map) => match map.remove(field) {
            Some(Value::Null) | None => Ok(None),
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| ApiError::Decode(format!("{}: {}", field, e))),
        },
        _ => Ok(None),
    }
}

pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::File(format!("cannot read {}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Part::bytes(bytes)
        .file_name(name)
        .mime_str(mime_for(path))
        .map_err(|e| ApiError::Transport(e.to_string()))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
