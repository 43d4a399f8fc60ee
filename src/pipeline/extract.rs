//! Text extraction: PDF file → concatenated plain text.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. [`PdfiumExtractor`] opens the document on the blocking pool
//! so the server's worker threads keep serving other requests.
//!
//! The document handle is owned by the blocking closure and dropped (closed)
//! when the closure returns, on success and on every error path.

use crate::error::ReviewError;
use futures::future::BoxFuture;
use futures::FutureExt;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Anything that can turn a PDF on disk into text.
pub trait TextExtractor: Send + Sync {
    fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ReviewError>>;
}

/// Extractor backed by a dynamically loaded pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    lib_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    /// `lib_path` is the directory holding libpdfium; `None` tries `./`
    /// and then the system library.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ReviewError>> {
        let pdf_path = path.to_path_buf();
        let lib_path = self.lib_path.clone();
        async move {
            tokio::task::spawn_blocking(move || extract_text_blocking(&pdf_path, lib_path.as_deref()))
                .await
                .map_err(|e| ReviewError::Internal(format!("Extraction task panicked: {}", e)))?
        }
        .boxed()
    }
}

/// Bind pdfium from the configured directory, then `./`, then the system.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ReviewError> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(dir) = lib_path {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(dir));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => debug!("pdfium not usable at {}: {:?}", candidate.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ReviewError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(pdf_path: &Path, lib_path: Option<&Path>) -> Result<String, ReviewError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ReviewError::DocumentRead {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.text().map_err(|e| ReviewError::DocumentRead {
            path: pdf_path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        let all = page_text.all();
        debug!("Page {}: {} chars", idx + 1, all.len());
        text.push_str(&all);
    }

    Ok(text)
}
