//! HTTP-level tests for the upload server.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! pdfium extractor and the LLM are replaced by doubles that count calls and
//! record prompts, so these tests need neither libpdfium nor an API key.

use act_review::{
    router, upload_pdf, AnalysisConfig, Analyzer, ReviewError, ServerConfig, TextExtractor,
    TextModel,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "act-review-test-boundary";
const ACT_TEXT: &str = "Universal Credit Act 2025. In this Act 'claimant' means ...";

// ── Test doubles ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct CountingExtractor {
    calls: AtomicUsize,
    seen: Mutex<Vec<PathBuf>>,
}

impl TextExtractor for CountingExtractor {
    fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ReviewError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(path.to_path_buf());
        let exists = path.exists();
        async move {
            assert!(exists, "upload must be on disk while it is analysed");
            Ok(ACT_TEXT.to_string())
        }
        .boxed()
    }
}

/// Answers each of the three prompts with a canned string.
struct FakeModel {
    summary: Result<String, String>,
    sections: String,
    rules: String,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    fn new(sections: &str, rules: &str) -> Self {
        Self {
            summary: Ok("- Introduces Universal Credit\n- Replaces legacy benefits".into()),
            sections: sections.into(),
            rules: rules.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing_summary(mut self) -> Self {
        self.summary = Err("quota exceeded".into());
        self
    }

    fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl TextModel for FakeModel {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let answer = if prompt.starts_with("Summarize") {
            self.summary.clone()
        } else if prompt.starts_with("Extract") {
            Ok(self.sections.clone())
        } else {
            Ok(self.rules.clone())
        };
        async move { answer }.boxed()
    }
}

struct Harness {
    app: axum::Router,
    extractor: Arc<CountingExtractor>,
    model: Arc<FakeModel>,
    upload_dir: PathBuf,
    _tmp: tempfile::TempDir,
}

fn harness(model: FakeModel) -> Harness {
    harness_with(model, ServerConfig::default())
}

fn harness_with(model: FakeModel, server: ServerConfig) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("uploads");
    let extractor = Arc::new(CountingExtractor::default());
    let model = Arc::new(model);
    let config = AnalysisConfig::builder()
        .temp_dir(&upload_dir)
        .build()
        .unwrap();
    let analyzer = Analyzer::new(extractor.clone(), model.clone(), config);
    Harness {
        app: router(analyzer, &server),
        extractor,
        model,
        upload_dir,
        _tmp: tmp,
    }
}

fn six_rules() -> String {
    let rules = [
        ("Act must define key terms", "pass", 95),
        ("Act must specify eligibility criteria", "pass", 90),
        ("Act must specify responsibilities of the administering authority", "pass", 85),
        ("Act must include enforcement or penalties", "fail", 70),
        ("Act must include payment calculation or entitlement structure", "pass", 88),
        ("Act must include record-keeping or reporting requirements", "fail", 60),
    ];
    let records: Vec<Value> = rules
        .iter()
        .map(|(rule, status, confidence)| {
            json!({"rule": rule, "status": status, "evidence": "s.1", "confidence": confidence})
        })
        .collect();
    Value::Array(records).to_string()
}

fn multipart_body(field: &str, filename: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-pdf/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&bytes)));
    (status, value)
}

fn leftover_uploads(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

// ── Upload endpoint ──────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_is_rejected_before_any_work() {
    let h = harness(FakeModel::new("{}", "[]"));
    let body = multipart_body("file", "notes.txt", Some("text/plain"), b"hello");
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_file_type");
    assert!(json["detail"].as_str().unwrap().contains("Please upload a PDF"));
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.model.prompt_count(), 0);
    assert!(!h.upload_dir.exists(), "nothing may be written for a rejected upload");
}

#[tokio::test]
async fn file_part_without_content_type_is_rejected() {
    let h = harness(FakeModel::new("{}", "[]"));
    let body = multipart_body("file", "act.pdf", None, b"%PDF-1.7");
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_file_type");
    assert_eq!(h.model.prompt_count(), 0);
}

#[tokio::test]
async fn missing_file_field_is_unprocessable() {
    let h = harness(FakeModel::new("{}", "[]"));
    let body = multipart_body("document", "act.pdf", Some("application/pdf"), b"%PDF-1.7");
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "missing_file");
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let server = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let h = harness_with(FakeModel::new("{}", "[]"), server);
    let body = multipart_body("file", "act.pdf", Some("application/pdf"), &[b'x'; 4096]);
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "body: {json}");
    assert_eq!(json["code"], "upload_too_large");
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.model.prompt_count(), 0);
    assert_eq!(leftover_uploads(&h.upload_dir), 0);
}

#[tokio::test]
async fn pdf_upload_returns_combined_report() {
    let h = harness(FakeModel::new(
        "```json\n{\"Definitions\": [\"claimant\", \"assessment period\"], \"Penalties\": \"Not specified\"}\n```",
        &six_rules(),
    ));
    let body = multipart_body("file", "Universal Credit Act.pdf", Some("application/pdf"), b"%PDF-1.7 ...");
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(
        json["summary"],
        "- Introduces Universal Credit\n- Replaces legacy benefits"
    );
    assert_eq!(
        json["sections"],
        json!({"Definitions": ["claimant", "assessment period"], "Penalties": "Not specified"})
    );

    let rules = json["rule_checks"].as_array().unwrap();
    assert_eq!(rules.len(), 6);
    for rc in rules {
        for key in ["rule", "status", "evidence", "confidence"] {
            assert!(rc.get(key).is_some(), "missing {key} in {rc}");
        }
    }

    // One extraction, three prompts, each carrying the extracted text
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 1);
    let prompts = h.model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|p| p.contains(ACT_TEXT)));

    // The scoped upload is gone once the response is out
    let seen = h.extractor.seen.lock().unwrap().clone();
    assert!(seen[0].starts_with(&h.upload_dir));
    assert!(!seen[0].exists());
    assert_eq!(leftover_uploads(&h.upload_dir), 0);
}

#[tokio::test]
async fn unparseable_rule_checks_are_returned_as_data() {
    let h = harness(FakeModel::new("{}", "not json at all"));
    let body = multipart_body("file", "act.pdf", Some("application/pdf"), b"%PDF-1.7");
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["rule_checks"],
        json!({
            "error": "Could not parse the response into JSON",
            "raw_response": "not json at all"
        })
    );
    assert!(json["summary"].is_string());
    assert_eq!(json["sections"], json!({}));
}

#[tokio::test]
async fn model_failure_is_bad_gateway_and_cleans_up() {
    let h = harness(FakeModel::new("{}", "[]").failing_summary());
    let body = multipart_body("file", "act.pdf", Some("application/pdf"), b"%PDF-1.7");
    let (status, json) = send_json(h.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "model_call_error");
    assert!(json["detail"].as_str().unwrap().contains("quota exceeded"));
    assert_eq!(leftover_uploads(&h.upload_dir), 0);
}

// ── Other routes ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_version() {
    let h = harness(FakeModel::new("{}", "[]"));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send_json(h.app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn index_serves_upload_page() {
    let h = harness(FakeModel::new("{}", "[]"));
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = h.app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/html"), "got {ct}");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("Rule Check Results"));
}

// ── Client against a live listener ───────────────────────────────────────────

async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn client_round_trip() {
    let h = harness(FakeModel::new("{\"Definitions\": []}", &six_rules()));
    let url = spawn_server(h.app).await;

    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("act.pdf");
    std::fs::write(&pdf, b"%PDF-1.7").unwrap();

    let report = upload_pdf(&url, &pdf).await.unwrap();
    assert_eq!(report.rule_check_records().unwrap().len(), 6);
    assert_eq!(report.section_entries().unwrap().len(), 1);
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn client_surfaces_server_errors() {
    let h = harness(FakeModel::new("{}", "[]").failing_summary());
    let url = spawn_server(h.app).await;

    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("act.pdf");
    std::fs::write(&pdf, b"%PDF-1.7").unwrap();

    let err = upload_pdf(&url, &pdf).await.unwrap_err();
    match &err {
        ReviewError::ServerRejected { status, body } => {
            assert_eq!(*status, 502);
            assert!(body.contains("model_call_error"), "got {body}");
        }
        other => panic!("expected ServerRejected, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Error: 502 - "));
}
