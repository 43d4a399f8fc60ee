//! Analysis entry points: upload or file in, [`CombinedReport`] out.
//!
//! An [`Analyzer`] owns its collaborators (text extractor and prompt
//! executor) explicitly, so nothing here touches process-wide state and
//! tests can swap either one for a double.
//!
//! ## Failure policy
//!
//! Extraction and model-call failures abort the request. Malformed model
//! output does not: it is normalised into
//! [`NormalizedResult::ParseError`] and the report is still returned.

use crate::config::AnalysisConfig;
use crate::error::ReviewError;
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::pipeline::llm::{resolve_provider, PromptExecutor, ProviderModel, TextModel};
use crate::pipeline::normalize::{normalize_response, NormalizedResult};
use crate::prompts::{rule_check_request, sections_request, summary_request};
use crate::report::CombinedReport;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The only content type accepted for uploads.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Runs the extract → prompt ×3 → normalise pipeline.
#[derive(Clone)]
pub struct Analyzer {
    extractor: Arc<dyn TextExtractor>,
    executor: PromptExecutor,
    config: AnalysisConfig,
}

impl Analyzer {
    /// Assemble an analyzer from explicit collaborators.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        model: Arc<dyn TextModel>,
        config: AnalysisConfig,
    ) -> Self {
        let executor = PromptExecutor::new(model).with_timeout_secs(config.api_timeout_secs);
        Self {
            extractor,
            executor,
            config,
        }
    }

    /// Production wiring: pdfium extractor plus the resolved LLM provider.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, ReviewError> {
        let provider = resolve_provider(&config)?;
        info!(
            "Using model {} (temperature {})",
            config.effective_model(),
            config.temperature
        );
        let model = Arc::new(ProviderModel::new(provider, &config));
        let extractor = Arc::new(PdfiumExtractor::new(config.pdfium_lib_path.clone()));
        Ok(Self::new(extractor, model, config))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse an uploaded file.
    ///
    /// The content type is checked before anything else happens: a non-PDF
    /// upload never touches the disk, the extractor or the model. Accepted
    /// bytes are written to a uniquely named file under `temp_dir`, which
    /// is removed when this function returns, whether it succeeds or not.
    ///
    /// # Errors
    /// - [`ReviewError::InvalidFileType`] if `content_type` is not `application/pdf`
    /// - [`ReviewError::Upload`] if the temp file cannot be written
    /// - [`ReviewError::DocumentRead`] / [`ReviewError::ModelCall`] from the pipeline
    pub async fn analyze_upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<CombinedReport, ReviewError> {
        let content_type = content_type.unwrap_or("");
        if content_type != PDF_CONTENT_TYPE {
            return Err(ReviewError::InvalidFileType {
                content_type: content_type.to_string(),
            });
        }

        let dir = &self.config.temp_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ReviewError::Upload {
                path: dir.clone(),
                source: e,
            })?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("{}-", upload_stem(filename)))
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(|e| ReviewError::Upload {
                path: dir.clone(),
                source: e,
            })?;
        if let Err(e) = tmp.write_all(bytes).and_then(|()| tmp.flush()) {
            return Err(ReviewError::Upload {
                path: tmp.path().to_path_buf(),
                source: e,
            });
        }
        debug!(
            "Stored upload '{}' ({} bytes) at {}",
            filename,
            bytes.len(),
            tmp.path().display()
        );

        // `tmp` is dropped (and the file deleted) when this returns
        self.analyze_file(tmp.path()).await
    }

    /// Analyse a PDF already on disk. The file is left in place.
    pub async fn analyze_file(&self, path: &Path) -> Result<CombinedReport, ReviewError> {
        let start = Instant::now();
        info!("Extracting text from {}", path.display());
        let text = self.extractor.extract(path).await?;
        info!("Extracted {} chars", text.len());

        let report = self.analyze_text(&text).await?;
        info!("Analysis complete in {}ms", start.elapsed().as_millis());
        Ok(report)
    }

    /// Run the three prompts over already-extracted text.
    ///
    /// In the default concurrent mode all three calls run to completion even
    /// if one fails; the first failure in summary → sections → rule-checks
    /// order is returned.
    pub async fn analyze_text(&self, text: &str) -> Result<CombinedReport, ReviewError> {
        let summary_req = summary_request(text);
        let sections_req = sections_request(text, &self.config.sections);
        let rules_req = rule_check_request(text);

        let (summary, sections_raw, rules_raw) = if self.config.sequential {
            let summary = self.executor.execute(summary_req).await?;
            let sections = self.executor.execute(sections_req).await?;
            let rules = self.executor.execute(rules_req).await?;
            (summary, sections, rules)
        } else {
            let (summary, sections, rules) = tokio::join!(
                self.executor.execute(summary_req),
                self.executor.execute(sections_req),
                self.executor.execute(rules_req),
            );
            (summary?, sections?, rules?)
        };

        let sections = normalize_response(&sections_raw);
        let rule_checks = normalize_response(&rules_raw);
        log_shape("sections", &sections);
        log_shape("rule checks", &rule_checks);

        Ok(CombinedReport {
            summary,
            sections,
            rule_checks,
        })
    }
}

fn log_shape(what: &str, result: &NormalizedResult) {
    match result {
        NormalizedResult::Parsed(_) => debug!("{} parsed as JSON", what),
        NormalizedResult::ParseError { raw_response, .. } => info!(
            "{} response was not JSON ({} chars kept raw)",
            what,
            raw_response.len()
        ),
    }
}

static RE_UNSAFE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// File-system-safe stem of an uploaded filename, used as the temp prefix.
fn upload_stem(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let stem = base
        .strip_suffix(".pdf")
        .or_else(|| base.strip_suffix(".PDF"))
        .unwrap_or(base);
    let safe = RE_UNSAFE_FILENAME.replace_all(stem, "_");
    let safe = safe.trim_matches(|c: char| c == '.' || c == '_');
    if safe.is_empty() {
        "upload".to_string()
    } else {
        safe.chars().take(64).collect()
    }
}
