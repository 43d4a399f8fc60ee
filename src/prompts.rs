//! Prompt templates for the three analysis calls.
//!
//! Every instruction sent to the model is built here from a
//! [`PromptTemplate`] with named `{placeholder}` slots. Tests can render and
//! inspect prompts without a model, and the executor in
//! [`crate::pipeline::llm`] never sees anything but a finished
//! [`PromptRequest`].

use crate::error::ReviewError;
use std::fmt;

/// Section names extracted when the caller does not supply its own list.
pub const DEFAULT_SECTIONS: [&str; 6] = [
    "Definitions",
    "Obligations",
    "Responsibilities",
    "Eligibility",
    "Payments",
    "Penalties",
];

/// The fixed compliance rules evaluated against every document.
pub const RULES: [&str; 6] = [
    "Act must define key terms",
    "Act must specify eligibility criteria",
    "Act must specify responsibilities of the administering authority",
    "Act must include enforcement or penalties",
    "Act must include payment calculation or entitlement structure",
    "Act must include record-keeping or reporting requirements",
];

/// Literal the model is told to use for sections absent from the text.
pub const NOT_SPECIFIED: &str = "Not specified";

pub const SUMMARY_TEMPLATE: PromptTemplate =
    PromptTemplate::new("Summarize this document into 5-10 bullet points:\n{document}");

pub const SECTIONS_TEMPLATE: PromptTemplate = PromptTemplate::new(
    "Extract the following sections from the text and return ONLY a valid JSON object \
mapping each section name to its extracted content. \
Do not include Markdown formatting like ```.\n\n\
Sections to extract:\n{sections_list}\n\n\
Text:\n{text}\n\n\
If a section is not present in the text, return 'Not specified' instead of an empty string.",
);

pub const RULES_TEMPLATE: PromptTemplate = PromptTemplate::new(
    "Evaluate the following rules against this legislative text. \
For each rule, return a JSON object with keys 'rule', 'status' (pass/fail), \
'evidence' (section or supporting text), and 'confidence' (0-100). \
Return ONLY a valid JSON array of objects. Do not include Markdown formatting like ```json.\n\n\
Rules:\n{rules_text}\n\n\
Text:\n{text}",
);

/// Which of the three call sites a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Summary,
    Sections,
    RuleChecks,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PromptKind::Summary => "summary",
            PromptKind::Sections => "section-extraction",
            PromptKind::RuleChecks => "rule-check",
        })
    }
}

/// An instruction template with named `{placeholder}` slots.
///
/// A slot is `{` + ASCII identifier + `}`. Braces that do not enclose an
/// identifier are copied through literally. Substituted values are never
/// rescanned, so document text containing braces is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate(&'static str);

impl PromptTemplate {
    pub const fn new(source: &'static str) -> Self {
        Self(source)
    }

    pub fn source(&self) -> &'static str {
        self.0
    }

    /// Names of all slots, in order of appearance (duplicates kept).
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.0;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match slot_name(after) {
                Some(name) => {
                    names.push(name);
                    rest = &after[name.len() + 1..];
                }
                None => rest = after,
            }
        }
        names
    }

    /// Interpolate `vars` into the template.
    ///
    /// Fails if a slot has no value; unused values are ignored.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, ReviewError> {
        let mut out = String::with_capacity(
            self.0.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>(),
        );
        let mut rest = self.0;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match slot_name(after) {
                Some(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| {
                            ReviewError::Internal(format!(
                                "prompt placeholder '{{{name}}}' has no value"
                            ))
                        })?;
                    out.push_str(value);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// If `s` starts with `identifier}`, return the identifier.
fn slot_name(s: &str) -> Option<&str> {
    let close = s.find('}')?;
    let name = &s[..close];
    let is_ident = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    is_ident.then_some(name)
}

/// A template plus its values, ready to be sent exactly once.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    kind: PromptKind,
    template: PromptTemplate,
    vars: Vec<(&'static str, String)>,
}

impl PromptRequest {
    pub fn new(kind: PromptKind, template: PromptTemplate, vars: Vec<(&'static str, String)>) -> Self {
        Self {
            kind,
            template,
            vars,
        }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    /// Produce the fully interpolated instruction.
    pub fn render(&self) -> Result<String, ReviewError> {
        let vars: Vec<(&str, &str)> = self.vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.template.render(&vars)
    }
}

/// Bullet-point summary of the whole document.
pub fn summary_request(text: &str) -> PromptRequest {
    PromptRequest::new(
        PromptKind::Summary,
        SUMMARY_TEMPLATE,
        vec![("document", text.to_string())],
    )
}

/// JSON object of `section name → content` for the given sections.
pub fn sections_request<S: AsRef<str>>(text: &str, sections: &[S]) -> PromptRequest {
    let sections_list = sections
        .iter()
        .map(|s| format!("- {}", s.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");
    PromptRequest::new(
        PromptKind::Sections,
        SECTIONS_TEMPLATE,
        vec![("sections_list", sections_list), ("text", text.to_string())],
    )
}

/// JSON array with one rule-check record per entry in [`RULES`].
pub fn rule_check_request(text: &str) -> PromptRequest {
    let rules_text = RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n");
    PromptRequest::new(
        PromptKind::RuleChecks,
        RULES_TEMPLATE,
        vec![("rules_text", rules_text), ("text", text.to_string())],
    )
}
