//! # act-review
//!
//! Upload a piece of legislation as a PDF and get back three things from an
//! LLM: a bullet-point summary, the text of a fixed set of sections, and a
//! pass/fail verdict against a fixed set of drafting rules.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Validate  content type must be application/pdf
//!  ├─ 2. Store     scoped temp file under temp_dir (removed on return)
//!  ├─ 3. Extract   page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. Prompt    summary / sections / rule checks, concurrently
//!  ├─ 5. Normalise strip code fences, parse JSON, keep failures as data
//!  └─ 6. Report    CombinedReport { summary, sections, rule_checks }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use act_review::{AnalysisConfig, Analyzer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let analyzer = Analyzer::from_config(AnalysisConfig::default())?;
//!     let report = analyzer.analyze_file("act.pdf".as_ref()).await?;
//!     println!("{}", act_review::render_report(&report));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `act-review` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod report;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::Analyzer;
pub use client::upload_pdf;
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ServerConfig};
pub use error::ReviewError;
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::llm::TextModel;
pub use pipeline::normalize::{normalize_response, NormalizedResult};
pub use render::render_report;
pub use report::{CombinedReport, RuleCheck, SectionValue};
pub use server::{router, serve};
