#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::MockServer;

use taskdesk::models::auth::{Role, User};
use taskdesk::{ApiClient, Credentials, Session};

pub const TOKEN: &str = "tok-123";

pub fn user() -> User {
    User {
        email: "dana@corp.io".into(),
        role: Role::Admin,
        employee_id: Some("e-1".into()),
        name: Some("Dana".into()),
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        token: TOKEN.into(),
        user: user(),
    }
}

pub fn client_for(server: &MockServer, session: Session) -> ApiClient {
    ApiClient::with_timeout(&server.uri(), Duration::from_secs(5), session).unwrap()
}

/// Client whose in-memory session already holds `TOKEN`.
pub fn signed_in(server: &MockServer) -> ApiClient {
    let session = Session::in_memory();
    session.establish(credentials());
    client_for(server, session)
}

/// Signed-in client that also persists to `file`.
pub fn signed_in_with_file(server: &MockServer, file: PathBuf) -> ApiClient {
    let session = Session::new(Some(file));
    session.establish(credentials());
    client_for(server, session)
}

pub fn notification(id: &str, is_read: bool) -> Value {
    json!({
        "id": id,
        "message": format!("event {}", id),
        "meta": { "type": "task_updated", "task_id": "t-1" },
        "is_read": is_read,
        "created_at": "2024-05-01T09:30:00.000000"
    })
}

pub fn feed(items: Vec<Value>) -> Value {
    let unread = items.iter().filter(|n| n["is_read"] == json!(false)).count();
    json!({
        "success": true,
        "total": items.len(),
        "unread_count": unread,
        "notifications": items
    })
}

pub fn task(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Task {}", id),
        "status": status,
        "priority": "medium",
        "assigned_to": "e-1",
        "created_at": "2024-04-01T08:00:00"
    })
}

pub fn employee(id: &str, active: bool) -> Value {
    json!({
        "id": id,
        "name": format!("Employee {}", id),
        "email": format!("{}@corp.io", id),
        "role": "employee",
        "department": "Ops",
        "is_active": active
    })
}

pub async fn requests_to(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}
