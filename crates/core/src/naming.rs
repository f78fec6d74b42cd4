//! Naming convention analysis over field definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AnalysisError, RecordKind},
    rules::{NamingRule, RuleRegistry},
    scoring::{self, ScoringWeights},
    types::{percentage, FieldRecord, NamingSeverity, Priority, Recommendation, SeverityCounts},
};

const TOP_ISSUE_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedRule {
    pub rule: String,
    pub description: String,
    pub pattern: String,
    pub expected: bool,
    pub severity: NamingSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub api_name: String,
    pub label: String,
    pub field_type: String,
    pub failed_rules: Vec<FailedRule>,
    pub severity: NamingSeverity,
    pub recommended_fix: String,
    pub suggested_name: Option<String>,
}

/// API names of violating fields, one bucket per severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamingBuckets {
    pub critical: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl NamingBuckets {
    fn push(&mut self, severity: NamingSeverity, api_name: String) {
        match severity {
            NamingSeverity::Critical => self.critical.push(api_name),
            NamingSeverity::Medium => self.medium.push(api_name),
            NamingSeverity::Low => self.low.push(api_name),
        }
    }

    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts {
            high: self.critical.len(),
            medium: self.medium.len(),
            low: self.low.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamingAnalysis {
    pub violations: Vec<FieldViolation>,
    pub compliant_field_count: usize,
    pub total_field_count: usize,
    pub skipped_field_count: usize,
    pub compliance_percentage: u8,
    pub naming_score: u8,
    pub by_severity: NamingBuckets,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopIssue {
    pub rule: String,
    pub description: String,
    pub severity: NamingSeverity,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamingSummary {
    pub headline: String,
    pub total_fields: usize,
    pub compliant_fields: usize,
    pub skipped_fields: usize,
    pub compliance_percentage: u8,
    pub violation_count: usize,
    pub critical_violations: usize,
    pub medium_violations: usize,
    pub low_violations: usize,
    pub top_issues: Vec<TopIssue>,
    pub recommendations: Vec<Recommendation>,
}

/// Payload of a successful naming analysis call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamingOutcome {
    pub results: NamingAnalysis,
    pub summary: NamingSummary,
}

pub fn analyze_fields(
    registry: &RuleRegistry,
    fields: &[FieldRecord],
    weights: &ScoringWeights,
) -> Result<NamingAnalysis, AnalysisError> {
    let mut violations = Vec::new();
    let mut by_severity = NamingBuckets::default();
    let mut warnings = Vec::new();
    let mut compliant = 0;
    let mut total = 0;

    for (idx, field) in fields.iter().enumerate() {
        let Some(api_name) = field.api_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
        else {
            tracing::warn!(index = idx, "skipping field without an API name");
            warnings.push(format!("Skipped field at index {idx}: missing apiName"));
            continue;
        };
        total += 1;

        let failed: Vec<&NamingRule> = registry
            .naming_rules()
            .iter()
            .filter(|r| r.is_violated_by(api_name))
            .collect();

        let Some(severity) = failed.iter().map(|r| r.severity).max() else {
            compliant += 1;
            continue;
        };

        let fix_rule = failed
            .iter()
            .find(|r| r.fix.is_some_and(|f| f.is_prefix()))
            .or_else(|| failed.iter().find(|r| r.fix.is_some()))
            .copied();
        let (recommended_fix, suggested_name) = match fix_rule {
            Some(rule) => (rule.fix_text(api_name), rule.suggest(api_name)),
            None => (failed[0].advice.to_string(), None),
        };

        by_severity.push(severity, api_name.to_string());
        violations.push(FieldViolation {
            api_name: api_name.to_string(),
            label: field.label.clone(),
            field_type: field.field_type.clone(),
            failed_rules: failed
                .iter()
                .map(|r| FailedRule {
                    rule: r.id.to_string(),
                    description: r.description.to_string(),
                    pattern: r.pattern().to_string(),
                    expected: r.expected,
                    severity: r.severity,
                })
                .collect(),
            severity,
            recommended_fix,
            suggested_name,
        });
    }

    if total == 0 {
        return Err(AnalysisError::NoValidRecords(RecordKind::Field));
    }

    let naming_score = scoring::score(total, violations.len(), by_severity.counts(), weights);
    tracing::debug!(
        total,
        compliant,
        skipped = warnings.len(),
        naming_score,
        "naming analysis complete"
    );

    Ok(NamingAnalysis {
        compliance_percentage: percentage(compliant, total),
        naming_score,
        compliant_field_count: compliant,
        total_field_count: total,
        skipped_field_count: fields.len() - total,
        violations,
        by_severity,
        warnings,
    })
}

pub fn summarize(registry: &RuleRegistry, results: &NamingAnalysis) -> NamingSummary {
    let b = &results.by_severity;
    let mut headline = format!(
        "{} of {} fields ({}%) comply with naming conventions; {} non-compliant ({} critical, {} medium, {} low).",
        results.compliant_field_count,
        results.total_field_count,
        results.compliance_percentage,
        results.violations.len(),
        b.critical.len(),
        b.medium.len(),
        b.low.len(),
    );
    if results.skipped_field_count > 0 {
        headline.push_str(&format!(
            " Skipped {} record(s) without an API name.",
            results.skipped_field_count
        ));
    }

    NamingSummary {
        headline,
        total_fields: results.total_field_count,
        compliant_fields: results.compliant_field_count,
        skipped_fields: results.skipped_field_count,
        compliance_percentage: results.compliance_percentage,
        violation_count: results.violations.len(),
        critical_violations: b.critical.len(),
        medium_violations: b.medium.len(),
        low_violations: b.low.len(),
        top_issues: top_issues(registry, &results.violations),
        recommendations: recommendations(results),
    }
}

/// Most frequent failed rules, ordered by severity, then frequency, then
/// registry position.
pub fn top_issues(registry: &RuleRegistry, violations: &[FieldViolation]) -> Vec<TopIssue> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for failed in violations.iter().flat_map(|v| &v.failed_rules) {
        *counts.entry(failed.rule.as_str()).or_default() += 1;
    }

    let mut issues: Vec<(usize, TopIssue)> = registry
        .naming_rules()
        .iter()
        .enumerate()
        .filter_map(|(pos, rule)| {
            counts.get(rule.id).map(|&count| {
                (
                    pos,
                    TopIssue {
                        rule: rule.id.to_string(),
                        description: rule.description.to_string(),
                        severity: rule.severity,
                        count,
                    },
                )
            })
        })
        .collect();

    issues.sort_by(|(pa, a), (pb, b)| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| pa.cmp(pb))
    });
    issues
        .into_iter()
        .take(TOP_ISSUE_LIMIT)
        .map(|(_, issue)| issue)
        .collect()
}

fn recommendations(results: &NamingAnalysis) -> Vec<Recommendation> {
    let b = &results.by_severity;
    let mut recs = Vec::new();

    if !b.critical.is_empty() {
        recs.push(Recommendation::new(
            Priority::High,
            "Immediately address critical naming violations to prevent potential conflicts and maintenance issues",
        ));
    }
    if results.compliance_percentage < 70 {
        recs.push(Recommendation::new(
            Priority::Medium,
            "Create and document clear naming conventions and socialize with team",
        ));
        recs.push(Recommendation::new(
            Priority::Medium,
            "Consider implementing automated validation for field naming during development",
        ));
    }
    if b.critical.is_empty() && !b.medium.is_empty() {
        recs.push(Recommendation::new(
            Priority::Medium,
            "Address medium-severity naming issues in next planned refactoring cycle",
        ));
    }
    recs.push(Recommendation::new(
        Priority::Low,
        "Regularly review and audit field naming as part of maintenance practices",
    ));
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(names: &[&str]) -> NamingAnalysis {
        let fields: Vec<FieldRecord> = names.iter().map(|n| FieldRecord::new(n)).collect();
        analyze_fields(RuleRegistry::builtin(), &fields, &ScoringWeights::NAMING).unwrap()
    }

    #[test]
    fn lowercase_custom_field_gets_namespace_fix() {
        let res = analyze(&[
            "LLC_BI__Amount__c",
            "nc_Loan_Purpose__c",
            "LLC_BI__Loan__c",
            "customField__c",
        ]);
        assert_eq!(res.compliance_percentage, 75);
        assert_eq!(res.naming_score, 75);
        assert_eq!(res.violations.len(), 1);

        let v = &res.violations[0];
        assert_eq!(v.api_name, "customField__c");
        assert_eq!(v.suggested_name.as_deref(), Some("nc_customField__c"));
        assert!(v.recommended_fix.contains("nc_customField__c"));
        assert_eq!(v.severity, NamingSeverity::Medium);
        assert_eq!(res.by_severity.medium, vec!["customField__c".to_string()]);
    }

    #[test]
    fn bare_loan_prefix_is_critical_and_renamed_into_namespace() {
        let res = analyze(&["loan_Amount__c"]);
        let v = &res.violations[0];
        assert_eq!(v.severity, NamingSeverity::Critical);
        assert_eq!(v.suggested_name.as_deref(), Some("nc_Loan_Amount__c"));
    }

    #[test]
    fn suffix_fix_used_when_no_prefix_rule_fails() {
        let res = analyze(&["nc_Loan_Rate__X"]);
        let v = &res.violations[0];
        assert_eq!(v.suggested_name.as_deref(), Some("nc_Loan_Rate__c"));
        assert_eq!(v.severity, NamingSeverity::Critical);
    }

    #[test]
    fn loan_field_without_fixable_rule_gets_advice() {
        let res = analyze(&["nc_Loan_Rate"]);
        let v = &res.violations[0];
        assert_eq!(v.suggested_name, None);
        assert!(v.recommended_fix.contains("nc_*__c"));
    }

    #[test]
    fn records_without_api_name_are_skipped() {
        let fields = vec![FieldRecord::default(), FieldRecord::new("nc_Rate__c")];
        let res = analyze_fields(RuleRegistry::builtin(), &fields, &ScoringWeights::NAMING).unwrap();
        assert_eq!(res.total_field_count, 1);
        assert_eq!(res.skipped_field_count, 1);
        assert_eq!(res.warnings.len(), 1);
        assert_eq!(res.compliance_percentage, 100);

        let summary = summarize(RuleRegistry::builtin(), &res);
        assert!(summary.headline.contains("Skipped 1"));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = analyze_fields(RuleRegistry::builtin(), &[], &ScoringWeights::NAMING).unwrap_err();
        assert_eq!(err.to_string(), "No valid fields provided for analysis");

        let only_blank = vec![FieldRecord::new("  ")];
        assert!(analyze_fields(RuleRegistry::builtin(), &only_blank, &ScoringWeights::NAMING).is_err());
    }

    #[test]
    fn top_issues_rank_severity_before_frequency() {
        let res = analyze(&["customField__c", "otherField__c", "archive__c", "LoanAmount__c"]);
        let summary = summarize(RuleRegistry::builtin(), &res);
        let order: Vec<&str> = summary.top_issues.iter().map(|i| i.rule.as_str()).collect();
        assert_eq!(
            order,
            vec!["loan-field-pattern", "namespace-prefix", "leading-lowercase"]
        );
        assert_eq!(summary.top_issues[1].count, 4);
        assert_eq!(summary.recommendations[0].priority, Priority::High);
    }
}
