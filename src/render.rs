//! Render a [`CombinedReport`] as Markdown for the terminal.
//!
//! The layout matches the browser page: a summary, one subsection per
//! extracted section, and one block per rule check. Output is tolerant of
//! whatever shape the model produced; nothing here can fail.

use crate::pipeline::normalize::NormalizedResult;
use crate::report::{CombinedReport, SectionValue};

const NO_SUMMARY: &str = "No summary available.";
const NO_SECTIONS: &str = "No sections available.";
const NO_RULE_CHECKS: &str = "No rule check results available.";

/// Render the full report.
pub fn render_report(report: &CombinedReport) -> String {
    let mut out = String::new();

    out.push_str("## Summary\n\n");
    if report.summary.trim().is_empty() {
        out.push_str(NO_SUMMARY);
    } else {
        out.push_str(report.summary.trim_end());
    }
    out.push_str("\n\n");

    out.push_str("## Extracted Sections\n\n");
    render_sections(report, &mut out);

    out.push_str("## Rule Check Results\n\n");
    render_rule_checks(report, &mut out);

    out
}

fn render_sections(report: &CombinedReport, out: &mut String) {
    if let NormalizedResult::ParseError {
        error,
        raw_response,
    } = &report.sections
    {
        push_llm_error(out, error, Some(raw_response));
        return;
    }
    let Some(entries) = report.section_entries() else {
        out.push_str(NO_SECTIONS);
        out.push_str("\n\n");
        return;
    };
    for (name, value) in entries {
        out.push_str(&format!("### {}\n\n", capitalize(&name)));
        match value {
            SectionValue::List(items) => {
                for item in items {
                    out.push_str(&format!("- {}\n", item));
                }
            }
            SectionValue::Text(text) => {
                out.push_str(&text);
                out.push('\n');
            }
        }
        out.push('\n');
    }
}

fn render_rule_checks(report: &CombinedReport, out: &mut String) {
    if let Some(records) = report.rule_check_records() {
        for rc in records {
            out.push_str(&format!("**Rule:** {}\n", rc.display_rule()));
            out.push_str(&format!("**Status:** {}\n", rc.display_status()));
            out.push_str(&format!("**Evidence:** {}\n", rc.display_evidence()));
            out.push_str(&format!("**Confidence:** {}%\n", rc.display_confidence()));
            out.push_str("\n---\n\n");
        }
        return;
    }
    if let Some((error, raw)) = llm_error(&report.rule_checks) {
        push_llm_error(out, &error, raw.as_deref());
        return;
    }
    out.push_str(NO_RULE_CHECKS);
    out.push('\n');
}

/// An `{"error": ..}` object, either from normalisation or produced by the model itself.
fn llm_error(result: &NormalizedResult) -> Option<(String, Option<String>)> {
    match result {
        NormalizedResult::ParseError {
            error,
            raw_response,
        } => Some((error.clone(), Some(raw_response.clone()))),
        NormalizedResult::Parsed(serde_json::Value::Object(map)) => {
            let error = map.get("error")?;
            let text = |v: &serde_json::Value| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((text(error), map.get("raw_response").map(text)))
        }
        NormalizedResult::Parsed(_) => None,
    }
}

fn push_llm_error(out: &mut String, error: &str, raw: Option<&str>) {
    out.push_str(&format!("LLM Error: {}\n\n", error));
    if let Some(raw) = raw {
        out.push_str("```\n");
        out.push_str(raw.trim_end());
        out.push_str("\n```\n\n");
    }
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
