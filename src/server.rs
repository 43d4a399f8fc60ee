//! HTTP surface: one upload endpoint, an embedded browser page, a health check.
//!
//! ```text
//! POST /upload-pdf/   multipart field `file` → CombinedReport JSON
//! GET  /              single-page upload UI
//! GET  /health        {"status":"ok","version":"…"}
//! ```
//!
//! Errors are answered as `{"detail": "...", "code": "..."}` with the status
//! from [`ReviewError::status_code`].

use crate::analyze::Analyzer;
use crate::config::ServerConfig;
use crate::error::ReviewError;
use crate::report::CombinedReport;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Browser UI, compiled into the binary.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// Shared handler state.
pub struct AppState {
    pub analyzer: Analyzer,
    /// Body limit on the upload route, reported back when it is hit.
    pub max_upload_bytes: usize,
}

/// JSON body for every non-200 answer.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            detail: self.to_string(),
            code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the application router.
pub fn router(analyzer: Analyzer, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState {
        analyzer,
        max_upload_bytes: config.max_upload_bytes,
    });

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route(
            "/upload-pdf/",
            post(upload_pdf_handler).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(analyzer: Analyzer, config: &ServerConfig) -> Result<(), ReviewError> {
    let app = router(analyzer, config);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ReviewError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ReviewError::Internal(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Accept one PDF and return its combined report.
async fn upload_pdf_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<CombinedReport>, ReviewError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?;
        let Some(field) = field else {
            return Err(ReviewError::MissingFile);
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        info!(
            "Upload '{}' ({})",
            filename,
            content_type.as_deref().unwrap_or("no content type")
        );

        // Reject before buffering the body
        if content_type.as_deref() != Some(crate::analyze::PDF_CONTENT_TYPE) {
            return Err(ReviewError::InvalidFileType {
                content_type: content_type.unwrap_or_default(),
            });
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?;

        let report = state
            .analyzer
            .analyze_upload(&bytes, &filename, content_type.as_deref())
            .await
            .inspect_err(|e| warn!("Analysis of '{}' failed: {}", filename, e))?;
        return Ok(Json(report));
    }
}

/// Body-limit hits are reported as such, anything else as a malformed body.
fn multipart_error(e: MultipartError, limit: usize) -> ReviewError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload rejected: body exceeds {} bytes", limit);
        ReviewError::UploadTooLarge { limit }
    } else {
        ReviewError::MalformedUpload(e.to_string())
    }
}
