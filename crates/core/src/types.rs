use serde::{Deserialize, Serialize};

/// A custom or managed-package field definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    #[serde(default, alias = "fullName")]
    pub api_name: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRuleRecord {
    #[serde(default, alias = "fullName")]
    pub api_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "formula")]
    pub error_condition_formula: String,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "code")]
    pub content: String,
    #[serde(default)]
    pub active: bool,
}

impl FieldRecord {
    pub fn new(api_name: &str) -> Self {
        Self {
            api_name: Some(api_name.to_string()),
            ..Self::default()
        }
    }
}

impl ValidationRuleRecord {
    pub fn new(api_name: &str, formula: &str) -> Self {
        Self {
            api_name: Some(api_name.to_string()),
            active: true,
            error_condition_formula: formula.to_string(),
            ..Self::default()
        }
    }
}

impl TriggerRecord {
    pub fn new(name: &str, content: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            content: content.to_string(),
            active: true,
        }
    }
}

/// Severity of a bypass pattern. Variants are declared lowest first so the
/// derived ordering ranks `High > Medium > Low`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Severity bucket of a naming violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NamingSeverity {
    Low,
    Medium,
    Critical,
}

/// Priority attached to a remediation recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub priority: Priority,
    pub text: String,
}

impl Recommendation {
    pub fn new(priority: Priority, text: &str) -> Self {
        Self {
            priority,
            text: text.to_string(),
        }
    }
}

/// Per-severity finding counts fed to the scoring engine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// `round(100 * part / whole)`, zero when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (100.0 * part as f64 / whole as f64).round();
    pct.clamp(0.0, 100.0) as u8
}
