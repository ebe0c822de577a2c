//! Integration tests for the resilient session
//!
//! These tests use wiremock to stand in for a prefecture server and verify
//! the retry, backoff and rotation behavior by counting received requests.

use std::time::Duration;
use veilleur::config::{CrawlConfig, ThrottleConfig};
use veilleur::session::{FetchOutcome, FetchRequest, ResilientSession};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast-retry configuration so tests spend no real time backing off
fn test_config(max_attempts: u32) -> (CrawlConfig, ThrottleConfig) {
    let crawl = CrawlConfig {
        max_attempts,
        backoff_base_ms: 1,
        backoff_cap_ms: 10,
        request_timeout_secs: 5,
        ..CrawlConfig::default()
    };
    let throttle = ThrottleConfig {
        min_delay_ms: 0,
        max_delay_ms: 0,
    };
    (crawl, throttle)
}

fn test_session(max_attempts: u32) -> ResilientSession {
    let (crawl, throttle) = test_config(max_attempts);
    ResilientSession::new(&crawl, &throttle).expect("Failed to build session")
}

#[tokio::test]
async fn test_successful_fetch_uses_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = test_session(3);
    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/page", server.uri())))
        .await;

    match outcome {
        FetchOutcome::Success { status, body, .. } => {
            assert_eq!(status, 200);
            assert_eq!(body, "<html>ok</html>");
        }
        other => panic!("Expected success, got {:?}", other),
    }
    assert_eq!(session.pages_since_reset(), 1);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = test_session(3);
    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/missing", server.uri())))
        .await;

    assert!(matches!(outcome, FetchOutcome::PermanentFailure { .. }));
}

#[tokio::test]
async fn test_server_errors_consume_the_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut session = test_session(3);
    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/flaky", server.uri())))
        .await;

    assert!(matches!(outcome, FetchOutcome::TransientFailure { .. }));
}

#[tokio::test]
async fn test_rate_limiting_consumes_the_shared_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let mut session = test_session(3);
    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/busy", server.uri())))
        .await;

    assert!(matches!(outcome, FetchOutcome::RateLimited { .. }));
}

#[tokio::test]
async fn test_retry_after_hint_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .mount(&server)
        .await;

    let mut session = test_session(2);
    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/busy", server.uri())))
        .await;

    match outcome {
        FetchOutcome::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(1)));
        }
        other => panic!("Expected rate-limited, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recovery_within_the_budget() {
    let server = MockServer::start().await;

    // Two failures, then success: three attempts fit a budget of three
    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = test_session(3);
    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/recovering", server.uri())))
        .await;

    match outcome {
        FetchOutcome::Success { body, .. } => assert_eq!(body, "recovered"),
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_separate_rate_limit_allowance_extends_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(5)
        .mount(&server)
        .await;

    let (mut crawl, throttle) = test_config(3);
    crawl.rate_limit_attempts = Some(5);
    let mut session = ResilientSession::new(&crawl, &throttle).unwrap();

    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/busy", server.uri())))
        .await;

    assert!(matches!(outcome, FetchOutcome::RateLimited { .. }));
}

#[tokio::test]
async fn test_rotation_after_threshold_of_successful_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let (mut crawl, throttle) = test_config(3);
    crawl.session_rotation_pages = 2;
    let mut session = ResilientSession::new(&crawl, &throttle).unwrap();
    let url = format!("{}/page", server.uri());

    for _ in 0..3 {
        let outcome = session.fetch(&FetchRequest::get(&url)).await;
        assert!(outcome.is_success());
    }

    // The third fetch crossed the threshold and triggered a reset first
    assert_eq!(session.resets(), 1);
    assert_eq!(session.pages_since_reset(), 1);
}

#[tokio::test]
async fn test_failed_fetches_do_not_advance_rotation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (mut crawl, throttle) = test_config(3);
    crawl.session_rotation_pages = 2;
    let mut session = ResilientSession::new(&crawl, &throttle).unwrap();
    let url = format!("{}/missing", server.uri());

    for _ in 0..4 {
        session.fetch(&FetchRequest::get(&url)).await;
    }

    assert_eq!(session.resets(), 0);
    assert_eq!(session.pages_since_reset(), 0);
}

/// Reads a received header, rejoining values the server split on commas
fn received_header(request: &wiremock::Request, name: &str) -> Option<String> {
    request.headers.iter().find_map(|(key, values)| {
        if key.as_str() == name {
            Some(
                values
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        } else {
            None
        }
    })
}

#[tokio::test]
async fn test_requests_carry_the_session_identity() {
    let server = MockServer::start().await;
    let mut session = test_session(3);

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let outcome = session
        .fetch(&FetchRequest::get(format!("{}/page", server.uri())))
        .await;
    assert!(outcome.is_success());

    // Below the rotation threshold the identity chosen at construction is
    // the one on the wire
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let user_agent =
        received_header(&requests[0], "user-agent").expect("Request carried no user-agent");
    assert_eq!(user_agent, session.current_user_agent());

    let accept_language = received_header(&requests[0], "accept-language")
        .expect("Request carried no accept-language");
    assert!(accept_language.starts_with("fr-FR"));

    assert!(received_header(&requests[0], "accept").is_some());
    assert!(received_header(&requests[0], "accept-encoding").is_some());
}
