//! Remote store client against a mock backend: auth lifecycle, envelope
//! decoding, error taxonomy, and 401 handling.

mod common;

mod auth_tests {
    use super::common::*;
    use serde_json::json;
    use taskdesk::errors::ApiError;
    use taskdesk::Session;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_establishes_and_persists_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "email": "dana@corp.io", "password": "s3cret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "token": TOKEN,
                "user": { "email": "dana@corp.io", "role": "admin", "employee_id": "e-1", "name": "Dana" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        let client = client_for(&server, Session::new(Some(file.clone())));

        let user = assert_ok!(client.auth().login("dana@corp.io", "s3cret").await);
        assert!(user.is_admin());
        assert_eq!(client.session().token().as_deref(), Some(TOKEN));
        assert!(file.exists());

        // A fresh process picks the credential back up.
        let next = Session::new(Some(file));
        assert!(next.load_cached());
        assert_eq!(next.user(), Some(user));
    }

    #[tokio::test]
    async fn test_login_401_is_a_plain_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "success": false, "error": "Invalid email or password" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Session::in_memory());
        let err = assert_err!(client.auth().login("dana@corp.io", "wrong").await);
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 401,
                message: "Invalid email or password".into()
            }
        );
        assert!(!err.is_session_fatal());
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_locally_then_notifies_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        let client = signed_in_with_file(&server, file.clone());
        assert!(file.exists());

        client.auth().logout().await;
        assert!(!client.session().is_authenticated());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_logout_survives_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = signed_in(&server);
        client.auth().logout().await;
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_keeps_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/validate-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "valid": true })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        Session::new(Some(file.clone())).establish(credentials());

        let client = client_for(&server, Session::new(Some(file)));
        let restored = assert_ok!(client.auth().restore().await);
        assert_eq!(restored, Some(user()));
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_drops_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/validate-token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        Session::new(Some(file.clone())).establish(credentials());

        let client = client_for(&server, Session::new(Some(file.clone())));
        let err = assert_err!(client.auth().restore().await);
        assert_eq!(err, ApiError::Unauthenticated);
        assert!(!client.session().is_authenticated());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_restore_without_cache_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/validate-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&server, Session::new(Some(dir.path().join("missing.json"))));
        assert_eq!(assert_ok!(client.auth().restore().await), None);
    }

    #[tokio::test]
    async fn test_profile_falls_back_to_first_of_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/employee/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "employees": [employee("e-1", true), employee("e-2", true)]
            })))
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let me = assert_ok!(client.auth().profile().await);
        assert_eq!(me.id, "e-1");
    }
}

mod client_tests {
    use super::common::*;
    use serde_json::json;
    use std::time::Duration;
    use taskdesk::errors::ApiError;
    use taskdesk::models::task::{TaskFilter, TaskPayload, TaskStatus};
    use taskdesk::{ApiClient, Session};
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{header, header_exists, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_requests_carry_bearer_and_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/objectives"))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "objectives": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in(&server);
        assert!(assert_ok!(client.objectives().list().await).is_empty());
    }

    #[tokio::test]
    async fn test_no_token_means_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Session::in_memory());
        let err = assert_err!(client.tasks().list(&TaskFilter::default()).await);
        assert_eq!(err, ApiError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_401_clears_session_and_cached_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token is invalid" })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        let client = signed_in_with_file(&server, file.clone());
        let mut auth = client.session().subscribe();
        auth.borrow_and_update();

        let err = assert_err!(client.tasks().list(&TaskFilter::default()).await);
        assert!(err.is_session_fatal());
        assert!(!client.session().is_authenticated());
        assert!(!file.exists());
        assert!(auth.has_changed().unwrap());
        assert!(!auth.borrow_and_update().is_signed_in());
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "success": false, "error": "Title is required" })),
            )
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let err = assert_err!(client.tasks().create(&TaskPayload::default()).await);
        assert_eq!(err.to_string(), "Title is required");
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_success_false_on_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/notifications/read-all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let err = assert_err!(client.notifications().mark_all_read().await);
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 200,
                message: "Failed to mark all notifications as read".into()
            }
        );
    }

    #[tokio::test]
    async fn test_not_found_and_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/tasks/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "success": false, "error": "Task not found" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/dashboard"))
            .respond_with(ResponseTemplate::new(503).set_body_string(""))
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let nf = assert_err!(client.tasks().delete("gone").await);
        assert!(nf.is_not_found());
        assert_eq!(nf.to_string(), "Task not found");

        let se = assert_err!(client.tasks().stats().await);
        assert_eq!(
            se,
            ApiError::Server {
                status: 503,
                message: "Failed to fetch dashboard stats".into()
            }
        );
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/objectives"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "objectives": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let session = Session::in_memory();
        session.establish(credentials());
        let client = ApiClient::with_timeout(&server.uri(), Duration::from_millis(200), session).unwrap();

        let err = assert_err!(client.objectives().list().await);
        assert_eq!(err, ApiError::Transport("request timed out".into()));
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        let session = Session::in_memory();
        session.establish(credentials());
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2), session).unwrap();

        let err = assert_err!(client.objectives().list().await);
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_task_filter_becomes_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .and(query_param("status", "in_progress"))
            .and(query_param("assigned_to", "e-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "tasks": [task("t1", "in_progress")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let filter = TaskFilter {
            status: Some(TaskStatus::InProgress),
            assigned_to: Some("e-9".into()),
            ..Default::default()
        };
        let tasks = assert_ok!(client.tasks().list(&filter).await);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_employee_list_accepts_bare_array_and_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/employees"))
            .and(query_param("include_inactive", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "employees": [employee("a", true), employee("b", false)]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/employees"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([employee("a", true)])))
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let active = assert_ok!(client.employees().list().await);
        assert_eq!(active.len(), 1);

        let all = assert_ok!(client.employees().including_inactive(true).list().await);
        assert_eq!(all.len(), 2);
        assert!(!all[1].is_active);
    }

    #[tokio::test]
    async fn test_ids_are_encoded_in_paths() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/notifications/a%20b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in(&server);
        assert_ok!(client.notifications().delete("a b").await);
    }

    #[tokio::test]
    async fn test_task_file_upload_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks/t1/upload-file"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "attachment_url": "https://cdn.example.com/t1/report.pdf",
                "message": "File uploaded successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.pdf");
        std::fs::write(&file, b"%PDF-1.4 test").unwrap();

        let client = signed_in(&server);
        let receipt = assert_ok!(client.tasks().upload_file("t1", &file).await);
        assert_eq!(
            receipt.attachment_url.as_deref(),
            Some("https://cdn.example.com/t1/report.pdf")
        );

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"report.pdf\""));
    }

    #[tokio::test]
    async fn test_missing_upload_file_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let err = assert_err!(
            client
                .employees()
                .upload_photo("e1", std::path::Path::new("/nonexistent/photo.png"))
                .await
        );
        assert!(matches!(err, ApiError::File(_)));
    }

    #[tokio::test]
    async fn test_reset_password_returns_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/employees/e7/reset-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Password reset successfully",
                "default_passwords": ["e7", "1234"]
            })))
            .mount(&server)
            .await;

        let client = signed_in(&server);
        let reset = assert_ok!(client.employees().reset_password("e7").await);
        assert_eq!(reset.default_passwords, vec!["e7", "1234"]);
    }
}
