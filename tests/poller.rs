//! Background polling follows the session: idle while signed out, polling
//! while signed in, reset on sign-out.

mod common;

use std::time::Duration;

use common::*;
use serde_json::json;
use taskdesk::sync::{Consistency, NotificationCenter, Poller};
use taskdesk::Session;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = "/api/notifications";
const TICK: Duration = Duration::from_millis(50);

async fn mount_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(FEED))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed(vec![
            notification("a", false),
            notification("b", true),
        ])))
        .mount(server)
        .await;
}

/// Poll `check` until it holds or two seconds pass.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..40 {
        if check().await {
            return true;
        }
        tokio::time::sleep(TICK).await;
    }
    false
}

#[tokio::test]
async fn test_signed_out_poller_sends_nothing() {
    let server = MockServer::start().await;
    mount_feed(&server).await;

    let client = client_for(&server, Session::in_memory());
    let center = NotificationCenter::new(&client, Consistency::LastWriteWins);
    let mut poller = Poller::spawn(center.refresher(), client.session(), TICK);

    tokio::time::sleep(TICK * 5).await;
    assert!(poller.is_running());
    assert_eq!(requests_to(&server, FEED).await, 0);
    poller.shutdown();
}

#[tokio::test]
async fn test_sign_in_starts_and_sign_out_stops_polling() {
    let server = MockServer::start().await;
    mount_feed(&server).await;

    let client = client_for(&server, Session::in_memory());
    let center = NotificationCenter::new(&client, Consistency::LastWriteWins);
    let mut poller = Poller::spawn(center.refresher(), client.session(), TICK);

    client.session().establish(credentials());
    assert!(eventually(|| async { requests_to(&server, FEED).await >= 2 }).await);
    assert_eq!(center.unread_count().await, 1);

    client.session().invalidate();
    assert!(eventually(|| async { center.notifications().await.is_empty() }).await);

    tokio::time::sleep(TICK * 2).await;
    let settled = requests_to(&server, FEED).await;
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(requests_to(&server, FEED).await, settled);
    assert!(poller.is_running());

    // Signing back in resumes.
    client.session().establish(credentials());
    assert!(eventually(|| async { requests_to(&server, FEED).await > settled }).await);

    poller.shutdown();
}

#[tokio::test]
async fn test_expired_token_during_poll_signs_out_and_idles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed(vec![notification("a", false)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FEED))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" })))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let center = NotificationCenter::new(&client, Consistency::LastWriteWins);
    let mut poller = Poller::spawn(center.refresher(), client.session(), TICK);

    assert!(eventually(|| async { !client.session().is_authenticated() }).await);
    assert!(eventually(|| async { center.notifications().await.is_empty() }).await);

    let settled = requests_to(&server, FEED).await;
    assert_eq!(settled, 2);
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(requests_to(&server, FEED).await, settled);

    poller.shutdown();
}

#[tokio::test]
async fn test_transient_errors_keep_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_feed(&server).await;

    let client = signed_in(&server);
    let center = NotificationCenter::new(&client, Consistency::LastWriteWins);
    let mut poller = Poller::spawn(center.refresher(), client.session(), TICK);

    assert!(eventually(|| async { center.notifications().await.len() == 2 }).await);
    assert!(client.session().is_authenticated());
    poller.shutdown();
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let server = MockServer::start().await;
    mount_feed(&server).await;

    let client = signed_in(&server);
    let center = NotificationCenter::new(&client, Consistency::LastWriteWins);
    let mut poller = Poller::spawn(center.refresher(), client.session(), TICK);
    assert!(poller.is_running());

    poller.shutdown();
    assert!(!poller.is_running());
    poller.shutdown();
    assert!(!poller.is_running());

    tokio::time::sleep(TICK).await;
    let stopped = requests_to(&server, FEED).await;
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(requests_to(&server, FEED).await, stopped);
}
