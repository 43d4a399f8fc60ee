//! Error types for the act-review library.
//!
//! There is exactly one fatal error type, [`ReviewError`]. Anything that
//! stops a request from producing a [`crate::report::CombinedReport`] (a
//! rejected upload, an unreadable PDF, a failed model call) is returned as
//! `Err(ReviewError)` and aborts the whole request; no partial report is
//! ever built.
//!
//! Unparseable model output is *not* an error. It is carried as data in
//! [`crate::pipeline::normalize::NormalizedResult::ParseError`] so that one
//! misbehaving prompt does not take the other two down with it.

use crate::prompts::PromptKind;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the act-review library.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload's declared content type is not `application/pdf`.
    #[error("Invalid file type '{content_type}'. Please upload a PDF.")]
    InvalidFileType { content_type: String },

    /// The multipart body carried no `file` field.
    #[error("No file provided: expected a multipart field named 'file'")]
    MissingFile,

    /// The multipart body could not be read.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The request body exceeded the configured upload limit.
    #[error("Upload exceeds the {limit}-byte limit")]
    UploadTooLarge { limit: usize },

    /// The upload could not be written to temporary storage.
    #[error("Failed to store upload at '{path}': {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Document errors ───────────────────────────────────────────────────
    /// The PDF could not be opened or its text could not be read.
    #[error("Could not read PDF '{path}': {detail}")]
    DocumentRead { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, \
or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model call failed (network, auth, quota, malformed request).
    #[error("{call} model call failed: {detail}")]
    ModelCall { call: PromptKind, detail: String },

    /// The model call did not finish within the configured timeout.
    #[error("{call} model call timed out after {secs}s")]
    ModelTimeout { call: PromptKind, secs: u64 },

    // ── Client errors ─────────────────────────────────────────────────────
    /// The analysis server answered with a non-200 status.
    #[error("Error: {status} - {body}")]
    ServerRejected { status: u16, body: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    /// HTTP status the server answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ReviewError::InvalidFileType { .. } => 400,
            ReviewError::MissingFile => 422,
            ReviewError::MalformedUpload(_) => 400,
            ReviewError::UploadTooLarge { .. } => 413,
            ReviewError::DocumentRead { .. } | ReviewError::PdfiumBindingFailed(_) => 422,
            ReviewError::ModelCall { .. } | ReviewError::ModelTimeout { .. } => 502,
            ReviewError::ProviderNotConfigured { .. } => 503,
            ReviewError::ServerRejected { status, .. } => *status,
            ReviewError::Upload { .. }
            | ReviewError::InvalidConfig(_)
            | ReviewError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code, sent alongside the message.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReviewError::InvalidFileType { .. } => "invalid_file_type",
            ReviewError::MissingFile => "missing_file",
            ReviewError::MalformedUpload(_) => "malformed_upload",
            ReviewError::UploadTooLarge { .. } => "upload_too_large",
            ReviewError::Upload { .. } => "upload_error",
            ReviewError::DocumentRead { .. } | ReviewError::PdfiumBindingFailed(_) => {
                "document_read_error"
            }
            ReviewError::ProviderNotConfigured { .. } => "provider_not_configured",
            ReviewError::ModelCall { .. } | ReviewError::ModelTimeout { .. } => "model_call_error",
            ReviewError::ServerRejected { .. } => "server_rejected",
            ReviewError::InvalidConfig(_) => "invalid_config",
            ReviewError::Internal(_) => "internal_error",
        }
    }
}
