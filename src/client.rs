//! HTTP client for a running analysis server.

use crate::analyze::PDF_CONTENT_TYPE;
use crate::error::ReviewError;
use crate::report::CombinedReport;
use crate::server::FILE_FIELD;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tracing::{debug, info};

/// Server used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Upload `path` to `server_url` and return the parsed report.
///
/// The file is always sent as `application/pdf`; the server decides whether
/// it is really one.
///
/// # Errors
/// - [`ReviewError::Upload`] if the file cannot be read
/// - [`ReviewError::ServerRejected`] for any non-200 answer, with the body as text
/// - [`ReviewError::Internal`] for transport or decoding failures
pub async fn upload_pdf(server_url: &str, path: &Path) -> Result<CombinedReport, ReviewError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ReviewError::Upload {
            path: path.to_path_buf(),
            source: e,
        })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string());

    let part = Part::bytes(bytes)
        .file_name(filename)
        .mime_str(PDF_CONTENT_TYPE)
        .map_err(|e| ReviewError::Internal(format!("Invalid multipart part: {}", e)))?;
    let form = Form::new().part(FILE_FIELD, part);

    let url = upload_url(server_url);
    info!("Uploading {} to {}", path.display(), url);
    let response = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| ReviewError::Internal(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    debug!("Server answered {}", status);
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(ReviewError::ServerRejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<CombinedReport>()
        .await
        .map_err(|e| ReviewError::Internal(format!("Malformed report from server: {}", e)))
}

fn upload_url(server_url: &str) -> String {
    format!("{}/upload-pdf/", server_url.trim_end_matches('/'))
}
