//! Report types returned by an analysis.
//!
//! [`CombinedReport`] is exactly the JSON body of a successful upload. The
//! `sections` and `rule_checks` fields carry no schema guarantee, so the
//! typed views here ([`SectionValue`], [`RuleCheck`]) are tolerant: missing
//! keys become `None` and render as `"N/A"`.

use crate::pipeline::normalize::NormalizedResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for a missing rule-check field.
pub const MISSING_FIELD: &str = "N/A";

/// Result of analysing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedReport {
    /// Bullet-point summary, exactly as the model wrote it.
    pub summary: String,
    /// Normalised section extraction (expected: object of name → content).
    pub sections: NormalizedResult,
    /// Normalised rule checks (expected: array of [`RuleCheck`] objects).
    pub rule_checks: NormalizedResult,
}

/// One section's extracted content.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionValue {
    /// The model returned a list; items are shown as bullets.
    List(Vec<String>),
    /// Anything else, shown as plain text.
    Text(String),
}

impl SectionValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => SectionValue::List(items.iter().map(value_to_text).collect()),
            other => SectionValue::Text(value_to_text(other)),
        }
    }
}

/// One rule-check record. Nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    #[serde(default)]
    pub rule: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub evidence: Option<Value>,
    /// Expected 0–100, but any JSON value is kept.
    #[serde(default)]
    pub confidence: Option<Value>,
}

impl RuleCheck {
    /// Read a record from an arbitrary JSON value; non-objects yield an empty record.
    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str| value.get(key).filter(|v| !v.is_null()).cloned();
        RuleCheck {
            rule: field("rule"),
            status: field("status"),
            evidence: field("evidence"),
            confidence: field("confidence"),
        }
    }

    pub fn display_rule(&self) -> String {
        display_field(self.rule.as_ref())
    }

    pub fn display_status(&self) -> String {
        display_field(self.status.as_ref())
    }

    pub fn display_evidence(&self) -> String {
        display_field(self.evidence.as_ref())
    }

    pub fn display_confidence(&self) -> String {
        display_field(self.confidence.as_ref())
    }

    /// True when `status` is the string "pass", case-insensitively.
    pub fn passed(&self) -> bool {
        matches!(&self.status, Some(Value::String(s)) if s.eq_ignore_ascii_case("pass"))
    }
}

impl CombinedReport {
    /// Section entries in model order, or `None` if `sections` is not an object.
    pub fn section_entries(&self) -> Option<Vec<(String, SectionValue)>> {
        match self.sections.value()? {
            Value::Object(map) => Some(
                map.iter()
                    .map(|(k, v)| (k.clone(), SectionValue::from_json(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Rule-check records, or `None` if `rule_checks` is not an array.
    pub fn rule_check_records(&self) -> Option<Vec<RuleCheck>> {
        match self.rule_checks.value()? {
            Value::Array(items) => Some(items.iter().map(RuleCheck::from_json).collect()),
            _ => None,
        }
    }
}

fn display_field(value: Option<&Value>) -> String {
    value.map(value_to_text).unwrap_or_else(|| MISSING_FIELD.to_string())
}

/// Strings without quotes, everything else as compact JSON.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
