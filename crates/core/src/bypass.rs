//! Bypass-pattern detection for validation rules and Apex triggers.
//!
//! Both record kinds run through the same engine; [`BypassSubject`] says which
//! text is scanned and which sub-catalog of the registry applies. Inactive
//! records are scanned too, and a record may match several patterns.

use serde::{Deserialize, Serialize};

use crate::{
    error::{AnalysisError, RecordKind},
    rules::{BypassRule, RuleRegistry},
    scoring::{self, ScoringWeights},
    types::{
        percentage, Priority, Recommendation, Severity, SeverityCounts, TriggerRecord,
        ValidationRuleRecord,
    },
};

pub trait BypassSubject {
    const KIND: RecordKind;

    fn identifier(&self) -> Option<&str>;
    fn scanned_text(&self) -> &str;
    fn is_active(&self) -> bool;
    fn description(&self) -> &str;
    fn catalog(registry: &RuleRegistry) -> &[BypassRule];
}

impl BypassSubject for ValidationRuleRecord {
    const KIND: RecordKind = RecordKind::ValidationRule;

    fn identifier(&self) -> Option<&str> {
        self.api_name.as_deref()
    }

    fn scanned_text(&self) -> &str {
        &self.error_condition_formula
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn catalog(registry: &RuleRegistry) -> &[BypassRule] {
        registry.validation_rule_patterns()
    }
}

impl BypassSubject for TriggerRecord {
    const KIND: RecordKind = RecordKind::Trigger;

    fn identifier(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn scanned_text(&self) -> &str {
        &self.content
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn description(&self) -> &str {
        ""
    }

    fn catalog(registry: &RuleRegistry) -> &[BypassRule] {
        registry.trigger_patterns()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchedPattern {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub recommended_approach: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassFinding {
    pub subject: String,
    pub active: bool,
    pub description: String,
    pub patterns: Vec<MatchedPattern>,
    pub highest_severity: Severity,
}

/// Records matching one catalog pattern. Patterns without matches are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternGroup {
    pub pattern: String,
    pub severity: Severity,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SeverityBuckets {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl SeverityBuckets {
    fn push(&mut self, severity: Severity, subject: String) {
        match severity {
            Severity::High => self.high.push(subject),
            Severity::Medium => self.medium.push(subject),
            Severity::Low => self.low.push(subject),
        }
    }

    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts {
            high: self.high.len(),
            medium: self.medium.len(),
            low: self.low.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassAnalysis {
    pub kind: RecordKind,
    pub findings: Vec<BypassFinding>,
    pub by_pattern: Vec<PatternGroup>,
    pub by_severity: SeverityBuckets,
    pub total_count: usize,
    pub with_bypass_count: usize,
    pub skipped_count: usize,
    pub bypass_percentage: u8,
    pub security_score: u8,
    pub warnings: Vec<String>,
}

/// Payload of a successful validation-rule or trigger analysis call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassOutcome {
    pub results: BypassAnalysis,
    pub refactoring_priorities: Vec<BypassFinding>,
    pub recommendations: Vec<Recommendation>,
}

pub fn analyze<S: BypassSubject>(
    registry: &RuleRegistry,
    records: &[S],
    weights: &ScoringWeights,
) -> Result<BypassAnalysis, AnalysisError> {
    let kind = S::KIND;
    let catalog = S::catalog(registry);
    let mut by_pattern: Vec<PatternGroup> = catalog
        .iter()
        .map(|rule| PatternGroup {
            pattern: rule.name.to_string(),
            severity: rule.severity,
            subjects: Vec::new(),
        })
        .collect();
    let mut by_severity = SeverityBuckets::default();
    let mut findings = Vec::new();
    let mut warnings = Vec::new();
    let mut total = 0;

    for (idx, record) in records.iter().enumerate() {
        let Some(id) = record.identifier().map(str::trim).filter(|n| !n.is_empty()) else {
            tracing::warn!(index = idx, kind = %kind, "skipping record without an identifier");
            warnings.push(format!(
                "Skipped record at index {idx} of {kind}: missing identifier"
            ));
            continue;
        };
        total += 1;

        let text = record.scanned_text();
        let mut patterns = Vec::new();
        for (rule, group) in catalog.iter().zip(by_pattern.iter_mut()) {
            if rule.matches(text) {
                group.subjects.push(id.to_string());
                patterns.push(MatchedPattern {
                    name: rule.name.to_string(),
                    severity: rule.severity,
                    description: rule.description.to_string(),
                    recommended_approach: rule.recommended_approach.to_string(),
                });
            }
        }

        let Some(highest_severity) = patterns.iter().map(|p| p.severity).max() else {
            continue;
        };
        by_severity.push(highest_severity, id.to_string());
        findings.push(BypassFinding {
            subject: id.to_string(),
            active: record.is_active(),
            description: record.description().to_string(),
            patterns,
            highest_severity,
        });
    }

    if total == 0 {
        return Err(AnalysisError::NoValidRecords(kind));
    }

    let with_bypass = findings.len();
    let security_score = scoring::score(total, with_bypass, by_severity.counts(), weights);
    tracing::debug!(
        kind = %kind,
        total,
        with_bypass,
        security_score,
        "bypass analysis complete"
    );

    Ok(BypassAnalysis {
        kind,
        bypass_percentage: percentage(with_bypass, total),
        security_score,
        with_bypass_count: with_bypass,
        total_count: total,
        skipped_count: records.len() - total,
        findings,
        by_pattern,
        by_severity,
        warnings,
    })
}

/// Findings ordered for remediation: highest severity first, then by identifier.
pub fn refactoring_priorities(results: &BypassAnalysis) -> Vec<BypassFinding> {
    let mut ordered = results.findings.clone();
    ordered.sort_by(|a, b| {
        b.highest_severity
            .cmp(&a.highest_severity)
            .then_with(|| a.subject.cmp(&b.subject))
    });
    ordered
}

pub fn recommendations(results: &BypassAnalysis) -> Vec<Recommendation> {
    let has_high = !results.by_severity.high.is_empty();
    let mut recs = vec![
        Recommendation::new(
            Priority::Medium,
            "Implement a consistent approach to bypass logic across all components",
        ),
        Recommendation::new(
            Priority::Medium,
            "Use custom permissions instead of profiles or user IDs for bypass logic",
        ),
        Recommendation::new(
            Priority::Low,
            "Document all bypass mechanisms in a central location for security review",
        ),
    ];

    match results.kind {
        RecordKind::ValidationRule => {
            if has_high {
                recs.push(Recommendation::new(
                    Priority::High,
                    "Immediately refactor validation rules with hardcoded User IDs",
                ));
            }
            if results.bypass_percentage > 50 {
                recs.push(Recommendation::new(
                    Priority::Medium,
                    "Review overall validation strategy to reduce reliance on bypass patterns",
                ));
            }
        }
        RecordKind::Trigger => {
            if has_high {
                recs.push(Recommendation::new(
                    Priority::High,
                    "Immediately refactor triggers with hardcoded User IDs or Profile checks",
                ));
            }
            recs.push(Recommendation::new(
                Priority::Medium,
                "Implement a centralized trigger handler framework with consistent bypass logic",
            ));
        }
        RecordKind::Field => {}
    }

    recs.sort_by(|a, b| b.priority.cmp(&a.priority));
    recs
}
