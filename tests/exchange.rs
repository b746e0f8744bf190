//! End-to-end tests of the upload/download exchange over real HTTP.
//!
//! A `wiremock` server stands in for the feedback service, so these run
//! offline and need no environment setup.
//!
//! Run with:
//!   cargo test --test exchange -- --nocapture

use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tutor_feedback::{
    request_feedback, ClientConfig, FeedbackError, Session, SessionState, SubmissionInput,
    SubmitOutcome, TransferError, ValidationError, DOCX_MIME,
};
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .endpoint(format!("{}/upload/", server.uri()))
        .build()
        .expect("valid config")
}

fn essay(name: &str) -> SubmissionInput {
    SubmissionInput::with_file(name, "essay.docx", b"ESSAY-BODY".to_vec())
}

fn feedback_body(n: u8) -> Vec<u8> {
    (0..n).map(|i| b'a' + (i % 26)).collect()
}

fn docx_response(body: Vec<u8>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", DOCX_MIME)
        .insert_header(
            "content-disposition",
            "attachment; filename=\"output_essay.docx\"",
        )
        .set_body_bytes(body)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn alice_gets_twenty_bytes_of_feedback() {
    let server = MockServer::start().await;
    let body = feedback_body(20);
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(docx_response(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    let input = essay("Alice");
    assert_eq!(input.file.as_ref().unwrap().len(), 10);

    let outcome = assert_ok!(session.submit(&input).await);
    let SubmitOutcome::Ready(handle) = outcome else {
        panic!("expected Ready");
    };

    assert!(matches!(session.state(), SessionState::Ready(_)));
    let artifact = session.resolve(&handle).unwrap();
    assert_eq!(artifact.bytes(), body.as_slice());
    assert_eq!(handle.filename(), "feedback.docx");
    assert_eq!(artifact.server_filename(), Some("output_essay.docx"));
}

#[tokio::test]
async fn multipart_carries_name_and_original_filename() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(docx_response(feedback_body(5)))
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    assert_ok!(session.submit(&essay("Alice")).await);

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;
    assert!(contains(body, b"name=\"name\"\r\n\r\nAlice"));
    assert!(contains(body, b"name=\"file\"; filename=\"essay.docx\""));
    assert!(contains(body, b"ESSAY-BODY"));
}

#[tokio::test]
async fn second_success_replaces_first_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(docx_response(b"first".to_vec()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(docx_response(b"second".to_vec()))
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    let SubmitOutcome::Ready(first) = session.submit(&essay("Alice")).await.unwrap() else {
        panic!("first submission should succeed");
    };
    let SubmitOutcome::Ready(second) = session.submit(&essay("Alice")).await.unwrap() else {
        panic!("second submission should succeed");
    };

    assert_ne!(first, second);
    assert_eq!(session.live_handles(), 1);
    assert_err!(session.resolve(&first));
    assert_eq!(session.resolve(&second).unwrap().bytes(), b"second");
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_name_never_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(docx_response(feedback_body(1)))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    let err = session.submit(&essay("")).await.unwrap_err();
    assert_eq!(err, ValidationError::MissingName);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn pdf_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(docx_response(feedback_body(1)))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    let input = SubmissionInput::with_file("Bob", "essay.pdf", b"%PDF-1.7".to_vec());
    assert_eq!(
        session.submit(&input).await.unwrap_err(),
        ValidationError::UnsupportedExtension
    );
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn server_error_fails_without_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    let outcome = session.submit(&essay("Alice")).await.unwrap();

    match outcome {
        SubmitOutcome::Failed(e) => assert_eq!(e.status(), Some(500)),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(session.state().name(), "failed");
    assert_eq!(session.live_handles(), 0);
    assert!(matches!(session.download(), Err(FeedbackError::NothingToDownload)));
}

#[tokio::test]
async fn connection_refused_is_a_connect_error() {
    // Bind and release a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::builder()
        .endpoint(format!("http://127.0.0.1:{port}/upload/"))
        .build()
        .unwrap();

    let session = Session::http(&config).unwrap();
    let outcome = session.submit(&essay("Alice")).await.unwrap();

    assert!(
        matches!(outcome, SubmitOutcome::Failed(TransferError::Connect { .. })),
        "got {outcome:?}"
    );
    assert_eq!(session.live_handles(), 0);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(docx_response(feedback_body(3)).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .endpoint(format!("{}/upload/", server.uri()))
        .timeout_secs(1)
        .build()
        .unwrap();
    let session = Session::http(&config).unwrap();
    let outcome = session.submit(&essay("Alice")).await.unwrap();

    assert!(
        matches!(outcome, SubmitOutcome::Failed(TransferError::Timeout { secs: 1, .. })),
        "got {outcome:?}"
    );
}

#[tokio::test]
async fn failure_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(docx_response(b"ok".to_vec()))
        .mount(&server)
        .await;

    let session = Session::http(&config_for(&server)).unwrap();
    assert!(matches!(
        session.submit(&essay("Alice")).await.unwrap(),
        SubmitOutcome::Failed(_)
    ));
    assert!(matches!(
        session.submit(&essay("Alice")).await.unwrap(),
        SubmitOutcome::Ready(_)
    ));
    assert_eq!(session.download().unwrap().bytes(), b"ok");
}

// ── One-shot API ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_feedback_returns_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(docx_response(b"annotated".to_vec()))
        .mount(&server)
        .await;

    let artifact = request_feedback(&essay("Alice"), &config_for(&server))
        .await
        .unwrap();
    assert_eq!(artifact.bytes(), b"annotated");
    assert_eq!(artifact.suggested_filename(), "feedback.docx");
}

#[tokio::test]
async fn request_feedback_surfaces_transfer_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = request_feedback(&essay("Alice"), &config_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Transfer(TransferError::Status { status: 500, .. })));
}

#[tokio::test]
async fn request_feedback_to_file_saves_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(docx_response(b"annotated".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("unit3.docx");
    std::fs::write(&doc, b"student work").unwrap();

    let saved = tutor_feedback::request_feedback_to_file("Alice", &doc, dir.path(), &config_for(&server))
        .await
        .unwrap();
    assert_eq!(saved, dir.path().join("feedback.docx"));
    assert_eq!(std::fs::read(saved).unwrap(), b"annotated");

    let requests = server.received_requests().await.unwrap();
    assert!(contains(&requests[0].body, b"filename=\"unit3.docx\""));
}
