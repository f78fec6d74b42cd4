use serde::{Deserialize, Serialize};

use crate::{
    bypass::{BypassAnalysis, BypassOutcome},
    naming::{NamingAnalysis, NamingOutcome},
    scoring::{self, Rating},
    types::{Priority, Recommendation},
};

pub const REPORT_VERSION: &str = "0.1.0";

const GOVERNANCE_RECOMMENDATIONS: [&str; 3] = [
    "Implement a governance process to regularly review and audit configuration changes.",
    "Document all configuration standards and patterns in a central location.",
    "Provide training to developers on secure and maintainable configuration practices.",
];

/// Relative weight of each component in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub naming_conventions: f64,
    pub validation_rules: f64,
    pub triggers: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            naming_conventions: 1.5,
            validation_rules: 1.0,
            triggers: 1.0,
        }
    }
}

/// Report sections in their fixed presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    NamingConventions,
    ValidationRules,
    Triggers,
    General,
}

impl Component {
    pub fn title(&self) -> &'static str {
        match self {
            Component::NamingConventions => "naming conventions",
            Component::ValidationRules => "validation rules",
            Component::Triggers => "triggers",
            Component::General => "general",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportInputs {
    pub naming_results: Option<NamingOutcome>,
    pub validation_results: Option<BypassOutcome>,
    pub trigger_results: Option<BypassOutcome>,
}

impl ReportInputs {
    pub fn is_empty(&self) -> bool {
        self.naming_results.is_none()
            && self.validation_results.is_none()
            && self.trigger_results.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub report_version: String,
    pub executive_summary: ExecutiveSummary,
    pub detailed_findings: DetailedFindings,
    pub recommendations: Vec<ReportRecommendation>,
    pub overall_score: OverallScore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskCounts {
    pub critical: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutiveSummary {
    pub overall_assessment: String,
    pub worst_rating: Option<Rating>,
    pub key_findings: Vec<String>,
    pub risks_identified: RiskCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailedFindings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming_conventions: Option<NamingAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<BypassAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<BypassAnalysis>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRecommendation {
    pub priority: Priority,
    pub component: Component,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming_conventions: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<u8>,
}

impl ComponentScores {
    pub fn iter(&self) -> impl Iterator<Item = (Component, u8)> + '_ {
        [
            (Component::NamingConventions, self.naming_conventions),
            (Component::ValidationRules, self.validation_rules),
            (Component::Triggers, self.triggers),
        ]
        .into_iter()
        .filter_map(|(c, s)| s.map(|s| (c, s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverallScore {
    pub score: Option<u8>,
    pub rating: Option<Rating>,
    pub component_scores: ComponentScores,
}

/// Payload of a successful report generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportOutcome {
    pub report: Report,
}

pub fn generate_report(inputs: &ReportInputs, weights: &ComponentWeights) -> Report {
    let naming = inputs.naming_results.as_ref();
    let validation = inputs.validation_results.as_ref();
    let triggers = inputs.trigger_results.as_ref();

    let component_scores = ComponentScores {
        naming_conventions: naming.map(|n| n.results.naming_score),
        validation_rules: validation.map(|v| v.results.security_score),
        triggers: triggers.map(|t| t.results.security_score),
    };

    let score = weighted_score(&component_scores, weights);
    tracing::debug!(?score, "report generated");

    Report {
        report_version: REPORT_VERSION.to_string(),
        executive_summary: executive_summary(inputs, &component_scores),
        detailed_findings: DetailedFindings {
            naming_conventions: naming.map(|n| n.results.clone()),
            validation_rules: validation.map(|v| v.results.clone()),
            triggers: triggers.map(|t| t.results.clone()),
        },
        recommendations: merge_recommendations(inputs),
        overall_score: OverallScore {
            score,
            rating: score.map(scoring::rating),
            component_scores,
        },
    }
}

/// Weighted mean over the supplied components only.
fn weighted_score(scores: &ComponentScores, weights: &ComponentWeights) -> Option<u8> {
    let (sum, total_weight) = scores
        .iter()
        .map(|(c, s)| {
            let w = match c {
                Component::NamingConventions => weights.naming_conventions,
                Component::ValidationRules => weights.validation_rules,
                Component::Triggers => weights.triggers,
                Component::General => 0.0,
            }
            .max(0.0);
            (f64::from(s) * w, w)
        })
        .fold((0.0, 0.0), |(sum, tw), (ws, w)| (sum + ws, tw + w));

    if total_weight <= 0.0 {
        return None;
    }
    Some((sum / total_weight).round().clamp(0.0, 100.0) as u8)
}

fn executive_summary(inputs: &ReportInputs, scores: &ComponentScores) -> ExecutiveSummary {
    let mut risks = RiskCounts::default();
    let mut key_findings = Vec::new();

    if let Some(n) = &inputs.naming_results {
        let b = &n.results.by_severity;
        risks.critical += b.critical.len();
        risks.medium += b.medium.len();
        risks.low += b.low.len();
        key_findings.push(finding_sentence(
            format!(
                "{}% of fields comply with naming conventions",
                n.results.compliance_percentage
            ),
            n.results.skipped_field_count,
        ));
    }
    for (outcome, label) in [
        (&inputs.validation_results, "validation rules"),
        (&inputs.trigger_results, "Apex triggers"),
    ] {
        if let Some(o) = outcome {
            let b = &o.results.by_severity;
            risks.critical += b.high.len();
            risks.medium += b.medium.len();
            risks.low += b.low.len();
            key_findings.push(finding_sentence(
                format!(
                    "{}% of {label} contain bypass patterns",
                    o.results.bypass_percentage
                ),
                o.results.skipped_count,
            ));
        }
    }

    let worst_rating = scores.iter().map(|(_, s)| scoring::rating(s)).min();
    let overall_assessment = match worst_rating {
        None => "No analysis results were supplied; nothing to assess.",
        Some(Rating::Critical | Rating::Poor) => {
            "Critical attention required. The configuration contains significant risk factors that should be addressed immediately."
        }
        Some(Rating::Fair) => {
            "Moderate risk identified. The configuration has several issues that should be addressed in the near term."
        }
        Some(Rating::Good | Rating::Excellent) => {
            "Low risk identified. The configuration is generally sound with minor improvements recommended."
        }
    };

    ExecutiveSummary {
        overall_assessment: overall_assessment.to_string(),
        worst_rating,
        key_findings,
        risks_identified: risks,
    }
}

fn finding_sentence(mut sentence: String, skipped: usize) -> String {
    if skipped > 0 {
        sentence.push_str(&format!(" ({skipped} record(s) skipped for missing identity)"));
    }
    sentence.push('.');
    sentence
}

/// Merges per-component recommendations, dropping duplicate texts. A duplicate
/// keeps the first component it was seen in and the highest priority.
fn merge_recommendations(inputs: &ReportInputs) -> Vec<ReportRecommendation> {
    if inputs.is_empty() {
        return Vec::new();
    }

    let governance: Vec<Recommendation> = GOVERNANCE_RECOMMENDATIONS
        .iter()
        .map(|t| Recommendation::new(Priority::Low, t))
        .collect();
    let sources: [(Component, Option<&[Recommendation]>); 4] = [
        (
            Component::NamingConventions,
            inputs
                .naming_results
                .as_ref()
                .map(|n| n.summary.recommendations.as_slice()),
        ),
        (
            Component::ValidationRules,
            inputs
                .validation_results
                .as_ref()
                .map(|v| v.recommendations.as_slice()),
        ),
        (
            Component::Triggers,
            inputs
                .trigger_results
                .as_ref()
                .map(|t| t.recommendations.as_slice()),
        ),
        (Component::General, Some(governance.as_slice())),
    ];

    let mut merged: Vec<ReportRecommendation> = Vec::new();
    for (component, recs) in sources {
        for rec in recs.unwrap_or_default() {
            match merged.iter_mut().find(|m| m.text == rec.text) {
                Some(existing) => existing.priority = existing.priority.max(rec.priority),
                None => merged.push(ReportRecommendation {
                    priority: rec.priority,
                    component,
                    text: rec.text.clone(),
                }),
            }
        }
    }

    merged.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.component.cmp(&b.component))
    });
    merged
}

impl Report {
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# sfguard report\n\n");
        s.push_str(&format!("- report_version: `{}`\n", self.report_version));
        match (self.overall_score.score, self.overall_score.rating) {
            (Some(score), Some(rating)) => {
                s.push_str(&format!("- overall_score: `{score}` ({rating})\n"));
            }
            _ => s.push_str("- overall_score: `n/a`\n"),
        }
        s.push('\n');

        s.push_str("## Executive summary\n\n");
        s.push_str(&format!("{}\n\n", self.executive_summary.overall_assessment));
        for f in &self.executive_summary.key_findings {
            s.push_str(&format!("- {}\n", f));
        }
        let r = &self.executive_summary.risks_identified;
        s.push_str(&format!(
            "- risks: `{}` critical, `{}` medium, `{}` low\n",
            r.critical, r.medium, r.low
        ));
        s.push('\n');

        let cs = &self.overall_score.component_scores;
        if cs.iter().next().is_some() {
            s.push_str("## Component scores\n\n");
            for (component, score) in cs.iter() {
                s.push_str(&format!(
                    "- {}: `{}` ({})\n",
                    component.title(),
                    score,
                    scoring::rating(score)
                ));
            }
            s.push('\n');
        }

        if let Some(n) = &self.detailed_findings.naming_conventions {
            s.push_str("## Naming conventions\n\n");
            if n.violations.is_empty() {
                s.push_str("- (none)\n");
            }
            for v in &n.violations {
                s.push_str(&format!("### {}\n", v.api_name));
                s.push_str(&format!("- severity: `{:?}`\n", v.severity));
                s.push_str(&format!("- recommended_fix: {}\n", v.recommended_fix));
                s.push_str("- failed_rules:\n");
                for failed in &v.failed_rules {
                    s.push_str(&format!("  - {}\n", failed.description));
                }
                s.push('\n');
            }
        }

        for (title, analysis) in [
            ("Validation rules", &self.detailed_findings.validation_rules),
            ("Apex triggers", &self.detailed_findings.triggers),
        ] {
            let Some(a) = analysis else { continue };
            s.push_str(&format!("## {title}\n\n"));
            s.push_str(&format!("- security_score: `{}`\n", a.security_score));
            s.push_str(&format!("- bypass_percentage: `{}`\n\n", a.bypass_percentage));
            for f in &a.findings {
                s.push_str(&format!("### {}\n", f.subject));
                s.push_str(&format!("- highest_severity: `{:?}`\n", f.highest_severity));
                s.push_str("- patterns:\n");
                for p in &f.patterns {
                    s.push_str(&format!("  - {} ({:?})\n", p.name, p.severity));
                }
                s.push('\n');
            }
        }

        s.push_str("## Recommendations\n\n");
        if self.recommendations.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for rec in &self.recommendations {
                s.push_str(&format!(
                    "- [{:?}] {} ({})\n",
                    rec.priority,
                    rec.text,
                    rec.component.title()
                ));
            }
        }

        s
    }
}
