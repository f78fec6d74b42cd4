use std::path::{Path, PathBuf};

use sfguard_core::{
    analyze_apex_triggers, analyze_naming_conventions, analyze_validation_rules,
    generate_report,
    parser::{load_metadata_dir, ParseMode},
    report::ReportInputs,
    scoring::Rating,
    types::{FieldRecord, Severity, TriggerRecord, ValidationRuleRecord},
};

const MAX_BYTES: u64 = 50 * 1024 * 1024;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn reference_inputs() -> ReportInputs {
    let fields: Vec<FieldRecord> = [
        "LLC_BI__Amount__c",
        "nc_Loan_Purpose__c",
        "LLC_BI__Loan__c",
        "customField__c",
    ]
    .iter()
    .map(|n| FieldRecord::new(n))
    .collect();
    let rules = vec![
        ValidationRuleRecord::new("Amount_Positive", "LLC_BI__Amount__c <= 0"),
        ValidationRuleRecord::new("Close_Date_Required", "ISBLANK(LLC_BI__CloseDate__c)"),
        ValidationRuleRecord::new(
            "Pending_Status_Check",
            "AND(ISPICKVAL(LLC_BI__Status__c, 'Pending'), $Profile.Name != 'System Administrator')",
        ),
    ];
    let triggers = vec![TriggerRecord::new(
        "LoanTrigger",
        "if (FeatureManagement.checkPermission('Bypass_Loan_Trigger')) { return; }",
    )];

    ReportInputs {
        naming_results: Some(analyze_naming_conventions(&fields).into_result().unwrap()),
        validation_results: Some(analyze_validation_rules(&rules).into_result().unwrap()),
        trigger_results: Some(analyze_apex_triggers(&triggers).into_result().unwrap()),
    }
}

#[test]
fn naming_reference_scenario() {
    let inputs = reference_inputs();
    let naming = inputs.naming_results.unwrap();
    assert_eq!(naming.results.compliance_percentage, 75);
    assert_eq!(naming.results.violations.len(), 1);
    assert_eq!(
        naming.results.violations[0].suggested_name.as_deref(),
        Some("nc_customField__c")
    );
}

#[test]
fn bypass_reference_scenarios() {
    let inputs = reference_inputs();
    let validation = inputs.validation_results.unwrap().results;
    assert_eq!(validation.bypass_percentage, 33);
    assert_eq!(validation.security_score, 90);
    assert_eq!(validation.findings[0].highest_severity, Severity::Medium);

    let triggers = inputs.trigger_results.unwrap().results;
    assert_eq!(triggers.bypass_percentage, 100);
    assert_eq!(triggers.security_score, 95);
    assert_eq!(triggers.findings[0].highest_severity, Severity::Low);
}

#[test]
fn aggregated_reference_report() {
    let response = generate_report(&reference_inputs());
    assert!(response.success);
    let report = response.into_result().unwrap().report;

    assert_eq!(report.overall_score.score, Some(85));
    assert_eq!(report.overall_score.rating, Some(Rating::Good));
    let cs = &report.overall_score.component_scores;
    assert_eq!(cs.naming_conventions, Some(75));
    assert_eq!(cs.validation_rules, Some(90));
    assert_eq!(cs.triggers, Some(95));

    insta::assert_json_snapshot!(report.executive_summary.key_findings, @r###"
    [
      "75% of fields comply with naming conventions.",
      "33% of validation rules contain bypass patterns.",
      "100% of Apex triggers contain bypass patterns."
    ]
    "###);
}

#[test]
fn report_json_is_reproducible() {
    let a = serde_json::to_string(&generate_report(&reference_inputs())).unwrap();
    let b = serde_json::to_string(&generate_report(&reference_inputs())).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_analyzer_input_reports_failure() {
    let naming = serde_json::to_value(analyze_naming_conventions(&[])).unwrap();
    assert_eq!(naming["success"], false);
    assert_eq!(naming["error"], "No valid fields provided for analysis");
    assert!(naming.get("results").is_none());

    let rules = analyze_validation_rules(&[]);
    assert!(!rules.success);
    assert!(!rules.error.unwrap_or_default().is_empty());

    let triggers = analyze_apex_triggers(&[]);
    assert_eq!(
        triggers.message,
        "Failed to analyze triggers: No valid triggers provided for analysis"
    );
}

#[test]
fn report_without_components_succeeds() {
    let response = generate_report(&ReportInputs::default());
    assert!(response.success);
    let report = response.into_result().unwrap().report;
    assert_eq!(report.overall_score.score, None);
    assert!(report.recommendations.is_empty());
}

#[test]
fn loan_object_fixture_reproduces_reference_report() {
    let bundle =
        load_metadata_dir(&fixture("loan_object"), ParseMode::Strict, MAX_BYTES).unwrap();
    assert_eq!(bundle.fields.len(), 4);
    assert_eq!(bundle.validation_rules.len(), 3);
    assert_eq!(bundle.triggers.len(), 1);
    assert!(bundle.triggers[0].active);
    assert!(bundle.warnings.is_empty());

    let pending = &bundle.validation_rules[2];
    assert_eq!(pending.api_name.as_deref(), Some("Pending_Status_Check"));
    assert!(!pending.active);

    let inputs = ReportInputs {
        naming_results: analyze_naming_conventions(&bundle.fields).payload,
        validation_results: analyze_validation_rules(&bundle.validation_rules).payload,
        trigger_results: analyze_apex_triggers(&bundle.triggers).payload,
    };
    let report = generate_report(&inputs).into_result().unwrap().report;
    assert_eq!(report.overall_score.score, Some(85));
    assert_eq!(
        report
            .detailed_findings
            .validation_rules
            .as_ref()
            .map(|v| v.findings[0].subject.as_str()),
        Some("Pending_Status_Check")
    );
}

#[test]
fn best_effort_skips_unreadable_files_and_anonymous_records() {
    let bundle =
        load_metadata_dir(&fixture("json_only"), ParseMode::BestEffort, MAX_BYTES).unwrap();
    assert!(bundle.validation_rules.is_empty());
    assert_eq!(bundle.warnings.len(), 1);
    assert_eq!(bundle.triggers.len(), 2);

    let outcome = analyze_apex_triggers(&bundle.triggers).into_result().unwrap();
    assert_eq!(outcome.results.total_count, 1);
    assert_eq!(outcome.results.skipped_count, 1);
    assert_eq!(outcome.results.by_severity.high, vec!["ContactTrigger".to_string()]);
}

#[test]
fn strict_mode_fails_on_unreadable_files() {
    let err = load_metadata_dir(&fixture("json_only"), ParseMode::Strict, MAX_BYTES).unwrap_err();
    assert!(format!("{:#}", err).contains("validation_rules.json"));
}

#[test]
fn missing_directory_is_an_error() {
    assert!(load_metadata_dir(&fixture("does-not-exist"), ParseMode::BestEffort, MAX_BYTES).is_err());
}
