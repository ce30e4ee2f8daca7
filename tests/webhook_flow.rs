use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use assignmentace::config::ClientConfig;
use assignmentace::error::UploadError;
use assignmentace::models::{FileAttachment, SubmissionForm};
use assignmentace::{routes, AssignmentClient};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn test_config(webhook_url: String) -> ClientConfig {
    ClientConfig {
        webhook_url,
        request_timeout: Duration::from_secs(5),
        max_retries: 2,
        retry_delay: Duration::from_millis(50),
        enable_mock_fallback: false,
    }
}

fn valid_form() -> SubmissionForm {
    SubmissionForm {
        subject: "computer-science".to_string(),
        academic_level: "masters".to_string(),
        page_count: "12".to_string(),
        deadline: Some(Utc::now()),
        instructions: "Harvard referencing".to_string(),
        email: "student@example.com".to_string(),
    }
}

fn attachment(name: &str, size: usize) -> FileAttachment {
    FileAttachment::new(name, vec![b'x'; size])
}

#[tokio::test]
async fn submission_round_trip_against_real_receiver() {
    let addr = serve(routes::router()).await;
    let client = AssignmentClient::new(test_config(format!("http://{}/webhook", addr)));

    let result = client
        .submit(valid_form(), vec![attachment("essay.pdf", 4096)])
        .await
        .expect("submission should succeed");

    assert!(result.success);
    assert!(result.reference_id.starts_with("REQ-"));
    assert_eq!(result.message, "Assignment uploaded successfully");
}

#[tokio::test]
async fn receiver_acknowledges_with_discovery_report() {
    let addr = serve(routes::router()).await;

    let form = reqwest::multipart::Form::new()
        .part(
            "file0",
            reqwest::multipart::Part::bytes(vec![b'y'; 1024])
                .file_name("essay.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
        .text("file0_name", "essay.pdf")
        .text("file0_type", "application/pdf")
        .text("file0_size", "1024")
        .text("file_0_name", "essay.pdf")
        .text("file_0_type", "application/pdf")
        .text("file_0_size", "1024")
        .text("subject", "science")
        .text("email", "a@b.com")
        .text("fileCount", "1")
        .text("referenceId", "REQ-TESTABCD");

    let response = reqwest::Client::new()
        .post(format!("http://{}/webhook", addr))
        .header("Accept", "application/json")
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["success"], json!(true));
    assert_eq!(ack["referenceId"], json!("REQ-TESTABCD"));
    assert_eq!(ack["message"], json!("Assignment uploaded successfully"));

    // Binary part and metadata triple share the name, so one file remains.
    assert_eq!(ack["files"]["count"], json!(1));
    assert_eq!(ack["files"]["names"][0], json!("essay.pdf"));
    assert_eq!(ack["files"]["hasBinaryData"], json!(true));

    let diag = &ack["files"]["diagnostics"];
    assert_eq!(diag["expectedFileCount"], json!(1));
    assert_eq!(diag["detectedFileCount"], json!(1));
    assert!(diag["contentType"]
        .as_str()
        .unwrap()
        .starts_with("multipart/form-data"));
    assert!(diag["detectedFileKeys"]
        .as_array()
        .unwrap()
        .contains(&json!("file_0_name")));

    // Scalar fields the client never sent fall back to echo defaults.
    assert_eq!(ack["formData"]["subject"], json!("science"));
    assert_eq!(ack["formData"]["academicLevel"], json!("Not specified"));
    assert_eq!(ack["formData"]["instructions"], json!("None"));
    assert_eq!(ack["formData"]["deadline"], json!("Not specified"));

    // Binary payload echoed as metadata for downstream persistence.
    assert_eq!(ack["binary"]["file0"]["sizeBytes"], json!(1024));
}

#[tokio::test]
async fn receiver_without_files_or_reference_id_still_acknowledges() {
    let addr = serve(routes::router()).await;

    let form = reqwest::multipart::Form::new().text("subject", "humanities");
    let ack: Value = reqwest::Client::new()
        .post(format!("http://{}/webhook", addr))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(ack["success"], json!(true));
    assert!(ack["referenceId"].as_str().unwrap().starts_with("REF-"));
    assert_eq!(ack["files"]["count"], json!(0));
    assert_eq!(ack["formData"]["uploadedFiles"][0], json!("No files detected"));
    assert_eq!(ack["formData"]["fileCount"], json!("0"));
}

#[tokio::test]
async fn array_shaped_response_yields_client_reference_id() {
    let app = Router::new().route(
        "/webhook",
        post(|| async { Json(json!([{"json": {"referenceId": "SRV-IGNORED"}}])) }),
    );
    let addr = serve(app).await;
    let client = AssignmentClient::new(test_config(format!("http://{}/webhook", addr)));

    let result = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.reference_id.starts_with("REQ-"));
    assert_ne!(result.reference_id, "SRV-IGNORED");
}

#[tokio::test]
async fn server_errors_are_retried_then_surfaced() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let app = Router::new()
        .route(
            "/webhook",
            post(|State(counter): State<Arc<AtomicUsize>>| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }),
        )
        .with_state(counter);
    let addr = serve(app).await;
    let client = AssignmentClient::new(test_config(format!("http://{}/webhook", addr)));

    let err = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("500"), "got: {}", err);
    assert!(matches!(err, UploadError::Server { status: 500, .. }));
    // First attempt plus two retries.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn reference_id_is_stable_across_retries() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let state = seen.clone();

    let app = Router::new()
        .route(
            "/webhook",
            post(
                |State(seen): State<Arc<Mutex<Vec<String>>>>, mut multipart: Multipart| async move {
                    let mut reference_id = String::new();
                    while let Ok(Some(field)) = multipart.next_field().await {
                        if field.name() == Some("referenceId") {
                            reference_id = field.text().await.unwrap_or_default();
                        }
                    }
                    let mut seen = seen.lock().unwrap();
                    seen.push(reference_id.clone());
                    if seen.len() < 3 {
                        (
                            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({})),
                        )
                    } else {
                        (
                            axum::http::StatusCode::OK,
                            Json(json!({
                                "success": true,
                                "message": "ok",
                                "referenceId": reference_id,
                            })),
                        )
                    }
                },
            ),
        )
        .with_state(state);
    let addr = serve(app).await;
    let client = AssignmentClient::new(test_config(format!("http://{}/webhook", addr)));

    let result = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1], seen[2]);
    assert_eq!(result.reference_id, seen[0]);
}

#[tokio::test]
async fn mock_fallback_synthesizes_success_when_enabled() {
    // Nothing listens on the target port; every attempt fails.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = test_config(format!("http://{}/webhook", addr));
    config.enable_mock_fallback = true;
    let client = AssignmentClient::new(config);

    let result = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .expect("fallback should synthesize success");

    assert!(result.success);
    assert_eq!(result.message, "Assignment received successfully");
    assert_eq!(result.expected_response_time, "within 1 hour");
    assert!(result.reference_id.starts_with("REQ-"));
}

#[tokio::test]
async fn without_fallback_unreachable_webhook_is_an_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AssignmentClient::new(test_config(format!("http://{}/webhook", addr)));
    let err = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Network(_)), "got: {:?}", err);
}

#[tokio::test]
async fn slow_webhook_times_out_distinctly() {
    let app = Router::new().route(
        "/webhook",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"success": true}))
        }),
    );
    let addr = serve(app).await;

    let mut config = test_config(format!("http://{}/webhook", addr));
    config.request_timeout = Duration::from_millis(200);
    config.max_retries = 0;
    let client = AssignmentClient::new(config);

    let err = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Timeout), "got: {:?}", err);
}

#[tokio::test]
async fn validation_failures_never_reach_the_network() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let app = Router::new()
        .route(
            "/webhook",
            post(|State(counter): State<Arc<AtomicUsize>>| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(json!({"success": true}))
            }),
        )
        .with_state(counter);
    let addr = serve(app).await;
    let client = AssignmentClient::new(test_config(format!("http://{}/webhook", addr)));

    let err = client.submit(valid_form(), vec![]).await.unwrap_err();
    assert!(matches!(err, UploadError::NoFiles));

    let err = client
        .submit(valid_form(), vec![attachment("virus.exe", 128)])
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedFormat { .. }));

    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unresolvable_webhook_host_reports_offline() {
    let client = AssignmentClient::new(test_config(
        "http://no-such-host.invalid/webhook".to_string(),
    ));

    let err = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Offline), "got: {:?}", err);
}

#[tokio::test]
async fn shape_b_failure_message_is_surfaced_verbatim() {
    let app = Router::new().route(
        "/webhook",
        post(|| async { Json(json!({"success": false, "message": "workflow disabled"})) }),
    );
    let addr = serve(app).await;

    let mut config = test_config(format!("http://{}/webhook", addr));
    config.max_retries = 0;
    let client = AssignmentClient::new(config);

    let err = client
        .submit(valid_form(), vec![attachment("essay.pdf", 128)])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "workflow disabled");
}
