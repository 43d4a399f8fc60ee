//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ llm (summary)    ──────────────▶ summary text
//! extract ───┼─▶ llm (sections)   ──▶ normalize ─▶ sections
//!  (pdfium)  └─▶ llm (rule checks) ─▶ normalize ─▶ rule_checks
//! ```
//!
//! 1. [`extract`]   concatenate the text of every page, in page order
//! 2. [`llm`]       render a prompt and make one model call; the only
//!    stage with network I/O
//! 3. [`normalize`] strip code fences and parse JSON, turning failures
//!    into data

pub mod extract;
pub mod llm;
pub mod normalize;
