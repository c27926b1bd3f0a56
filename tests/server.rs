//! HTTP backend tests: the router driven in-process with `tower::oneshot`.
//!
//! Multipart bodies are assembled by hand with the same field names the web
//! front end sends.

#![cfg(feature = "server")]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{generator, FixedText, RecordingSleeper, ScriptedClient, LECTURE, TWO_QUESTIONS};
use edgequake_quiz::server::{create_router, create_router_with_body_limit};
use edgequake_quiz::GenerationConfig;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----quiz-test-boundary";

enum Part<'a> {
    File(&'a str, &'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn pdf<'a>() -> Part<'a> {
    Part::File("pdf_file", "lecture.pdf", b"%PDF-1.7 fake")
}

fn app(client: Arc<ScriptedClient>, config: GenerationConfig) -> Router {
    let gen = generator(
        FixedText::text(LECTURE),
        client,
        Arc::new(RecordingSleeper::default()),
        config,
    );
    create_router(Arc::new(gen))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_reports_running_with_cors() {
    let app = app(Arc::new(ScriptedClient::replying("")), GenerationConfig::default());
    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap()),
        Some("*")
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"quiz backend is running!");
}

// ── Upload validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_is_rejected() {
    let client = Arc::new(ScriptedClient::replying("[]"));
    let app = app(Arc::clone(&client), GenerationConfig::default());

    let (status, body) = send(app, upload("/extract_topics", &[Part::Text("difficulty", "easy")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No PDF file provided");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let app = app(Arc::new(ScriptedClient::replying("[]")), GenerationConfig::default());
    let (status, body) = send(
        app,
        upload("/extract_summary", &[Part::File("pdf_file", "", b"%PDF")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No selected file");
}

#[tokio::test]
async fn non_pdf_is_rejected() {
    let app = app(Arc::new(ScriptedClient::replying("[]")), GenerationConfig::default());
    let (status, body) = send(
        app,
        upload("/extract_keywords", &[Part::File("pdf_file", "notes.txt", b"hello")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file type. Please upload a PDF.");
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let client = Arc::new(ScriptedClient::replying("[]"));
    let gen = generator(
        FixedText::text(LECTURE),
        Arc::clone(&client),
        Arc::new(RecordingSleeper::default()),
        GenerationConfig::default(),
    );
    let app = create_router_with_body_limit(Arc::new(gen), 1024);
    let big = vec![b'x'; 8 * 1024];

    let (status, body) = send(
        app,
        upload("/extract_topics", &[Part::File("pdf_file", "big.pdf", &big)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
    assert_eq!(client.calls(), 0);
}

// ── Artifacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_topics_returns_list() {
    let app = app(
        Arc::new(ScriptedClient::replying(r#"Topics: ["Photosynthesis", "Pigments"]"#)),
        GenerationConfig::default(),
    );
    let (status, body) = send(app, upload("/extract_topics", &[pdf()])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "topics": ["Photosynthesis", "Pigments"] }));
}

#[tokio::test]
async fn extract_keywords_returns_list() {
    let client = Arc::new(ScriptedClient::replying(
        "Keywords:\n[\"chlorophyll\", \"Calvin cycle\", \"light energy\"]",
    ));
    let app = app(Arc::clone(&client), GenerationConfig::default());
    let (status, body) = send(app, upload("/extract_keywords", &[pdf()])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "keywords": ["chlorophyll", "Calvin cycle", "light energy"] })
    );
    assert!(client.prompts()[0].contains("keywords and key phrases"));
}

#[tokio::test]
async fn extract_summary_returns_text() {
    let app = app(
        Arc::new(ScriptedClient::replying(" Plants make sugar. ")),
        GenerationConfig::default(),
    );
    let (status, body) = send(app, upload("/extract_summary", &[pdf()])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Plants make sugar.");
}

#[tokio::test]
async fn provider_failure_is_500() {
    let app = app(
        Arc::new(ScriptedClient::failing("401 invalid api key")),
        GenerationConfig::default(),
    );
    let (status, body) = send(app, upload("/extract_topics", &[pdf()])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to extract topics:"));
    assert!(message.contains("invalid api key"));
}

#[tokio::test]
async fn topics_and_summary_reports_partial_failure() {
    let app = app(
        Arc::new(ScriptedClient::new(vec![
            Ok(r#"["Photosynthesis"]"#),
            Err("upstream timeout"),
            Ok(r#"["chlorophyll"]"#),
        ])),
        GenerationConfig::default(),
    );
    let (status, body) = send(app, upload("/extract_topics_and_summary", &[pdf()])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topics"], serde_json::json!(["Photosynthesis"]));
    assert_eq!(body["summary"], Value::Null);
    assert_eq!(body["keywords"], serde_json::json!(["chlorophyll"]));
    assert_eq!(body["failures"].as_array().map(Vec::len), Some(1));
}

// ── Quiz ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_quiz_with_form_parameters() {
    let client = Arc::new(ScriptedClient::replying(TWO_QUESTIONS));
    let app = app(Arc::clone(&client), GenerationConfig::default());

    let (status, body) = send(
        app,
        upload(
            "/generate_quiz",
            &[
                pdf(),
                Part::Text("difficulty", "Hard"),
                Part::Text("numQuestions", "3"),
                Part::Text("topics", r#"["Pigments", "Calvin cycle"]"#),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let mcqs = body["mcqs"].as_array().unwrap();
    assert_eq!(mcqs.len(), 2);
    assert!(mcqs[0].as_str().unwrap().starts_with("Question:"));
    assert_eq!(body["questions"][1]["answer"], "B");
    assert_eq!(body["questions"][0]["options"]["A"], "Chlorophyll");

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("create exactly 3"));
    assert!(prompt.contains("difficulty level of Hard"));
    assert!(prompt.contains("following topics: Pigments, Calvin cycle."));
}

#[tokio::test]
async fn generate_quiz_defaults_missing_fields() {
    let client = Arc::new(ScriptedClient::replying(TWO_QUESTIONS));
    let app = app(Arc::clone(&client), GenerationConfig::default());

    let (status, _) = send(app, upload("/generate_quiz", &[pdf()])).await;
    assert_eq!(status, StatusCode::OK);
    let prompt = &client.prompts()[0];
    assert!(prompt.contains("create exactly 5"));
    assert!(prompt.contains("difficulty level of Medium"));
    assert!(!prompt.contains("following topics"));
}

#[tokio::test]
async fn generate_quiz_rejects_bad_parameters() {
    for (field, value) in [
        ("numQuestions", "many"),
        ("numQuestions", "0"),
        ("difficulty", "impossible"),
        ("topics", "Pigments"),
    ] {
        let client = Arc::new(ScriptedClient::replying(TWO_QUESTIONS));
        let app = app(Arc::clone(&client), GenerationConfig::default());
        let (status, body) = send(
            app,
            upload("/generate_quiz", &[pdf(), Part::Text(field, value)]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}={value}");
        assert!(body["error"].is_string());
        assert_eq!(client.calls(), 0, "{field}={value}");
    }
}

#[tokio::test]
async fn generate_quiz_exhausted_retries_is_single_message() {
    let config = GenerationConfig::builder().max_retries(2).build().unwrap();
    let app = app(Arc::new(ScriptedClient::failing("quota exceeded")), config);

    let (status, body) = send(app, upload("/generate_quiz", &[pdf()])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["mcqs"],
        serde_json::json!(["Failed to generate MCQs after 2 retries due to API limits."])
    );
    assert_eq!(body["questions"], serde_json::json!([]));
}

#[tokio::test]
async fn generate_quiz_fatal_error_is_500() {
    let app = app(
        Arc::new(ScriptedClient::failing("model not found")),
        GenerationConfig::default(),
    );
    let (status, body) = send(app, upload("/generate_quiz", &[pdf()])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate MCQs:"));
}
