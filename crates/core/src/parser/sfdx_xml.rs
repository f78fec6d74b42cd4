//! Flat tag extraction from SFDX source-format metadata files.
//!
//! Only leaf elements are read (text without nested markup), first occurrence
//! wins. This is enough for `CustomField`, `ValidationRule` and
//! `ApexTrigger` metadata, whose interesting values are all top-level leaves.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{FieldRecord, ValidationRuleRecord};

static RE_LEAF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9_]*)>([^<]*)</([A-Za-z][A-Za-z0-9_]*)>").expect("valid regex")
});

pub fn leaf_tags(xml: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for cap in RE_LEAF.captures_iter(xml) {
        let (open, value, close) = (&cap[1], &cap[2], &cap[3]);
        if open != close {
            continue;
        }
        tags.entry(open.to_string())
            .or_insert_with(|| unescape(value.trim()));
    }
    tags
}

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9A-Fa-f]{1,6})|(lt|gt|quot|apos|amp));")
        .expect("valid regex")
});

/// Decodes the predefined XML entities and decimal/hex character
/// references in one pass. References to invalid code points are kept.
pub fn unescape(s: &str) -> String {
    RE_ENTITY
        .replace_all(s, |cap: &regex::Captures<'_>| {
            let decoded = if let Some(dec) = cap.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = cap.get(2) {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
            } else {
                match &cap[3] {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => Some('&'),
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => cap[0].to_string(),
            }
        })
        .into_owned()
}

fn take(tags: &mut HashMap<String, String>, key: &str) -> String {
    tags.remove(key).unwrap_or_default()
}

/// `fallback_name` is used when the file carries no `<fullName>`.
pub fn parse_field(xml: &str, fallback_name: &str) -> FieldRecord {
    let mut tags = leaf_tags(xml);
    FieldRecord {
        api_name: tags
            .remove("fullName")
            .or_else(|| Some(fallback_name.to_string()))
            .filter(|n| !n.is_empty()),
        label: take(&mut tags, "label"),
        field_type: take(&mut tags, "type"),
        description: take(&mut tags, "description"),
    }
}

pub fn parse_validation_rule(xml: &str, fallback_name: &str) -> ValidationRuleRecord {
    let mut tags = leaf_tags(xml);
    ValidationRuleRecord {
        api_name: tags
            .remove("fullName")
            .or_else(|| Some(fallback_name.to_string()))
            .filter(|n| !n.is_empty()),
        active: take(&mut tags, "active").eq_ignore_ascii_case("true"),
        description: take(&mut tags, "description"),
        error_condition_formula: take(&mut tags, "errorConditionFormula"),
        error_message: take(&mut tags, "errorMessage"),
    }
}

/// Reads `<status>` from a `*.trigger-meta.xml` file. Triggers without a
/// status are treated as active.
pub fn trigger_is_active(meta_xml: &str) -> bool {
    leaf_tags(meta_xml)
        .get("status")
        .is_none_or(|s| s.eq_ignore_ascii_case("active"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_validation_rule_with_escaped_formula() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ValidationRule xmlns="http://soap.sforce.com/2006/04/metadata">
    <fullName>Pending_Status_Check</fullName>
    <active>true</active>
    <description>Blocks pending loans</description>
    <errorConditionFormula>AND(ISPICKVAL(LLC_BI__Status__c, &apos;Pending&apos;), $Profile.Name &lt;&gt; &apos;System Administrator&apos;)</errorConditionFormula>
    <errorMessage>Not allowed</errorMessage>
</ValidationRule>"#;
        let rule = parse_validation_rule(xml, "ignored");
        assert_eq!(rule.api_name.as_deref(), Some("Pending_Status_Check"));
        assert!(rule.active);
        assert_eq!(
            rule.error_condition_formula,
            "AND(ISPICKVAL(LLC_BI__Status__c, 'Pending'), $Profile.Name <> 'System Administrator')"
        );
    }

    #[test]
    fn numeric_character_references_are_decoded() {
        let xml = "<ValidationRule><fullName>Admin_Skip</fullName>\
            <errorConditionFormula>$Profile.Name &#60;&#x3E; &#39;Admin&#39;</errorConditionFormula>\
            </ValidationRule>";
        let rule = parse_validation_rule(xml, "ignored");
        assert_eq!(rule.error_condition_formula, "$Profile.Name <> 'Admin'");

        let registry = crate::rules::RuleRegistry::builtin();
        assert!(registry
            .validation_rule_patterns()
            .iter()
            .any(|p| p.matches(&rule.error_condition_formula)));
    }

    #[test]
    fn unescape_is_single_pass() {
        assert_eq!(unescape("&amp;lt;"), "&lt;");
        assert_eq!(unescape("&#xD800; &#1114112; &nbsp;"), "&#xD800; &#1114112; &nbsp;");
        assert_eq!(unescape("a &quot;b&quot; &#X41;"), "a \"b\" A");
    }

    #[test]
    fn field_falls_back_to_file_name() {
        let xml = "<CustomField><label>Rate</label><type>Percent</type></CustomField>";
        let field = parse_field(xml, "nc_Rate__c");
        assert_eq!(field.api_name.as_deref(), Some("nc_Rate__c"));
        assert_eq!(field.label, "Rate");
        assert_eq!(field.field_type, "Percent");
        assert!(field.description.is_empty());
    }

    #[test]
    fn nested_elements_are_not_leaves() {
        let tags = leaf_tags("<a><b>1</b></a><c>2</c>");
        assert_eq!(tags.get("b").map(String::as_str), Some("1"));
        assert_eq!(tags.get("c").map(String::as_str), Some("2"));
        assert!(!tags.contains_key("a"));
    }

    #[test]
    fn trigger_status() {
        assert!(trigger_is_active("<ApexTrigger><status>Active</status></ApexTrigger>"));
        assert!(!trigger_is_active("<ApexTrigger><status>Inactive</status></ApexTrigger>"));
        assert!(trigger_is_active("<ApexTrigger></ApexTrigger>"));
    }
}
