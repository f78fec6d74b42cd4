//! Rule-driven health analysis for Salesforce/nCino configuration metadata.
//!
//! The analyzers are pure functions over an immutable [`RuleRegistry`]; the
//! entry points below wrap them in the [`Response`] envelope used by callers.

pub mod bypass;
pub mod config;
pub mod error;
pub mod naming;
pub mod parser;
pub mod report;
pub mod response;
pub mod rules;
pub mod scoring;
pub mod types;

use crate::{
    bypass::{BypassOutcome, BypassSubject},
    config::Config,
    error::RecordKind,
    naming::NamingOutcome,
    report::{ReportInputs, ReportOutcome},
    response::Response,
    rules::RuleRegistry,
    types::{FieldRecord, TriggerRecord, ValidationRuleRecord},
};

pub fn analyze_naming_conventions(fields: &[FieldRecord]) -> Response<NamingOutcome> {
    analyze_naming_conventions_with(RuleRegistry::builtin(), &Config::default(), fields)
}

pub fn analyze_naming_conventions_with(
    registry: &RuleRegistry,
    config: &Config,
    fields: &[FieldRecord],
) -> Response<NamingOutcome> {
    match naming::analyze_fields(registry, fields, &config.scoring.naming) {
        Ok(results) => {
            let summary = naming::summarize(registry, &results);
            let message = format!(
                "Analyzed {} fields. Compliance: {}%",
                results.total_field_count, results.compliance_percentage
            );
            Response::ok(NamingOutcome { results, summary }, message)
        }
        Err(e) => {
            tracing::error!(error = %e, "naming convention analysis failed");
            Response::failure(&e, "analyze naming conventions")
        }
    }
}

pub fn analyze_validation_rules(rules: &[ValidationRuleRecord]) -> Response<BypassOutcome> {
    analyze_validation_rules_with(RuleRegistry::builtin(), &Config::default(), rules)
}

pub fn analyze_validation_rules_with(
    registry: &RuleRegistry,
    config: &Config,
    rules: &[ValidationRuleRecord],
) -> Response<BypassOutcome> {
    analyze_bypass(registry, config, rules)
}

pub fn analyze_apex_triggers(triggers: &[TriggerRecord]) -> Response<BypassOutcome> {
    analyze_apex_triggers_with(RuleRegistry::builtin(), &Config::default(), triggers)
}

pub fn analyze_apex_triggers_with(
    registry: &RuleRegistry,
    config: &Config,
    triggers: &[TriggerRecord],
) -> Response<BypassOutcome> {
    analyze_bypass(registry, config, triggers)
}

fn analyze_bypass<S: BypassSubject>(
    registry: &RuleRegistry,
    config: &Config,
    records: &[S],
) -> Response<BypassOutcome> {
    let kind = S::KIND;
    let action = match kind {
        RecordKind::Trigger => "analyze triggers",
        _ => "analyze validation rules",
    };

    match bypass::analyze(registry, records, &config.scoring.bypass) {
        Ok(results) => {
            let message = format!(
                "Analyzed {} {}. Security score: {}/100",
                results.total_count, kind, results.security_score
            );
            Response::ok(
                BypassOutcome {
                    refactoring_priorities: bypass::refactoring_priorities(&results),
                    recommendations: bypass::recommendations(&results),
                    results,
                },
                message,
            )
        }
        Err(e) => {
            tracing::error!(error = %e, %kind, "bypass pattern analysis failed");
            Response::failure(&e, action)
        }
    }
}

/// Never fails: absent components only narrow the report.
pub fn generate_report(inputs: &ReportInputs) -> Response<ReportOutcome> {
    generate_report_with(&Config::default(), inputs)
}

pub fn generate_report_with(config: &Config, inputs: &ReportInputs) -> Response<ReportOutcome> {
    let report = report::generate_report(inputs, &config.report.weights);
    let message = if inputs.is_empty() {
        "No analysis results supplied; generated an empty report"
    } else {
        "Successfully generated comprehensive report"
    };
    Response::ok(ReportOutcome { report }, message)
}
