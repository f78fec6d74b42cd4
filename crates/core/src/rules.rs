//! Immutable catalogs of naming and bypass-pattern rules.
//!
//! Every check the analyzers run is an entry in one of these tables, including
//! the structural naming checks. The builtin registry is compiled once on first
//! use and shared by reference for the rest of the process.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{NamingSeverity, Severity};

/// Rewrite applied to an API name to satisfy a naming rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    AddPrefix(&'static str),
    /// Replace the text matched by the rule pattern at the start of the name.
    ReplacePrefix(&'static str),
    /// Replace the text matched by the rule pattern at the end of the name.
    ReplaceSuffix(&'static str),
    UppercaseFirst,
}

impl Fix {
    pub fn is_prefix(&self) -> bool {
        matches!(self, Fix::AddPrefix(_) | Fix::ReplacePrefix(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NamingRuleDef {
    pub id: &'static str,
    pub description: &'static str,
    pub pattern: &'static str,
    /// `true` when the pattern must be present, `false` when it is forbidden.
    pub expected: bool,
    pub severity: NamingSeverity,
    /// Rule is only evaluated for names matching this pattern.
    pub scope: Option<&'static str>,
    /// Rule is skipped for names matching this pattern.
    pub exempt: Option<&'static str>,
    pub fix: Option<Fix>,
    pub advice: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct BypassRuleDef {
    pub name: &'static str,
    pub pattern: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub recommended_approach: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("rule '{rule}' has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug)]
pub struct NamingRule {
    pub id: &'static str,
    pub description: &'static str,
    pub expected: bool,
    pub severity: NamingSeverity,
    pub fix: Option<Fix>,
    pub advice: &'static str,
    pattern: Regex,
    scope: Option<Regex>,
    exempt: Option<Regex>,
}

impl NamingRule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn applies_to(&self, api_name: &str) -> bool {
        let in_scope = self.scope.as_ref().is_none_or(|s| s.is_match(api_name));
        let exempt = self.exempt.as_ref().is_some_and(|e| e.is_match(api_name));
        in_scope && !exempt
    }

    pub fn is_violated_by(&self, api_name: &str) -> bool {
        self.applies_to(api_name) && self.pattern.is_match(api_name) != self.expected
    }

    /// The API name after applying this rule's fix, if it has one.
    pub fn suggest(&self, api_name: &str) -> Option<String> {
        let fix = self.fix?;
        let renamed = match fix {
            Fix::AddPrefix(prefix) => format!("{prefix}{api_name}"),
            Fix::ReplacePrefix(with) | Fix::ReplaceSuffix(with) => {
                self.pattern.replace(api_name, with).into_owned()
            }
            Fix::UppercaseFirst => {
                let mut chars = api_name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => return None,
                }
            }
        };
        Some(renamed)
    }

    /// Human-readable fix text for `api_name`.
    pub fn fix_text(&self, api_name: &str) -> String {
        let (Some(fix), Some(renamed)) = (self.fix, self.suggest(api_name)) else {
            return self.advice.to_string();
        };
        let matched = self
            .pattern
            .find(api_name)
            .map(|m| m.as_str())
            .unwrap_or_default();
        match fix {
            Fix::AddPrefix(prefix) => format!("Add '{prefix}' prefix: '{renamed}'"),
            Fix::ReplacePrefix(_) => format!("Replace '{matched}' prefix: '{renamed}'"),
            Fix::ReplaceSuffix(_) => format!("Replace '{matched}' suffix: '{renamed}'"),
            Fix::UppercaseFirst => {
                let first: String = api_name.chars().take(1).collect();
                format!("Change first character '{first}' to uppercase: '{renamed}'")
            }
        }
    }
}

#[derive(Debug)]
pub struct BypassRule {
    pub name: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub recommended_approach: &'static str,
    pattern: Regex,
}

impl BypassRule {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

#[derive(Debug)]
pub struct RuleRegistry {
    naming: Vec<NamingRule>,
    validation_rules: Vec<BypassRule>,
    triggers: Vec<BypassRule>,
}

static BUILTIN: Lazy<RuleRegistry> = Lazy::new(|| {
    RuleRegistry::from_definitions(NAMING_RULES, VALIDATION_RULE_PATTERNS, TRIGGER_PATTERNS)
        .expect("builtin rule registry is valid")
});

impl RuleRegistry {
    pub fn builtin() -> &'static RuleRegistry {
        &BUILTIN
    }

    pub fn from_definitions(
        naming: &[NamingRuleDef],
        validation_rules: &[BypassRuleDef],
        triggers: &[BypassRuleDef],
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            naming: naming
                .iter()
                .map(compile_naming)
                .collect::<Result<_, _>>()?,
            validation_rules: validation_rules
                .iter()
                .map(compile_bypass)
                .collect::<Result<_, _>>()?,
            triggers: triggers
                .iter()
                .map(compile_bypass)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn naming_rules(&self) -> &[NamingRule] {
        &self.naming
    }

    pub fn validation_rule_patterns(&self) -> &[BypassRule] {
        &self.validation_rules
    }

    pub fn trigger_patterns(&self) -> &[BypassRule] {
        &self.triggers
    }
}

fn compile(rule: &str, pattern: &str) -> Result<Regex, RegistryError> {
    Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
        rule: rule.to_string(),
        source,
    })
}

fn compile_naming(def: &NamingRuleDef) -> Result<NamingRule, RegistryError> {
    Ok(NamingRule {
        id: def.id,
        description: def.description,
        expected: def.expected,
        severity: def.severity,
        fix: def.fix,
        advice: def.advice,
        pattern: compile(def.id, def.pattern)?,
        scope: def.scope.map(|p| compile(def.id, p)).transpose()?,
        exempt: def.exempt.map(|p| compile(def.id, p)).transpose()?,
    })
}

fn compile_bypass(def: &BypassRuleDef) -> Result<BypassRule, RegistryError> {
    Ok(BypassRule {
        name: def.name,
        severity: def.severity,
        description: def.description,
        recommended_approach: def.recommended_approach,
        pattern: compile(def.name, def.pattern)?,
    })
}

const STANDARD_OR_CUSTOM: &str =
    "Rename to follow standard pattern (LLC_BI__*__c) or custom pattern (nc_*__c)";

pub const NAMING_RULES: &[NamingRuleDef] = &[
    NamingRuleDef {
        id: "bare-loan-prefix",
        description: "Field uses a bare Loan_ prefix without a namespace",
        pattern: r"^[Ll]oan_",
        expected: false,
        severity: NamingSeverity::Critical,
        scope: None,
        exempt: None,
        fix: Some(Fix::ReplacePrefix("nc_Loan_")),
        advice: STANDARD_OR_CUSTOM,
    },
    NamingRuleDef {
        id: "namespace-prefix",
        description: "Fields must carry the managed package (LLC_BI__) or custom project (nc_) prefix",
        pattern: r"^(?:LLC_BI__|nc_)",
        expected: true,
        severity: NamingSeverity::Medium,
        scope: None,
        exempt: None,
        fix: Some(Fix::AddPrefix("nc_")),
        advice: "Add appropriate prefix ('LLC_BI__' for managed package fields or 'nc_' for custom fields)",
    },
    NamingRuleDef {
        id: "loan-field-pattern",
        description: "Loan-related fields must follow standard or custom patterns",
        pattern: r"^(?:LLC_BI__|nc_).*__c$",
        expected: true,
        severity: NamingSeverity::Critical,
        scope: Some(r"[Ll]oan"),
        exempt: None,
        fix: None,
        advice: STANDARD_OR_CUSTOM,
    },
    NamingRuleDef {
        id: "leading-lowercase",
        description: "Fields should not start with lowercase letters",
        pattern: r"^[a-z]",
        expected: false,
        severity: NamingSeverity::Low,
        scope: None,
        exempt: Some(r"^nc_"),
        fix: Some(Fix::UppercaseFirst),
        advice: "Start the field name with an uppercase letter",
    },
    NamingRuleDef {
        id: "non-canonical-suffix",
        description: "Field ends with the invalid __X suffix",
        pattern: r"__X$",
        expected: false,
        severity: NamingSeverity::Critical,
        scope: None,
        exempt: None,
        fix: Some(Fix::ReplaceSuffix("__c")),
        advice: STANDARD_OR_CUSTOM,
    },
];

const HARDCODED_USER: &str =
    "Use permission sets, custom permissions, or roles instead of specific User IDs.";

pub const VALIDATION_RULE_PATTERNS: &[BypassRuleDef] = &[
    BypassRuleDef {
        name: "Profile-based bypass",
        pattern: r"\$Profile\.Name\s*(?:==?|!=|<>)|(?:==?|!=|<>)\s*\$Profile\.Name|CONTAINS\s*\(\s*\$Profile\.Name",
        severity: Severity::Medium,
        description: "Using Profile.Name to bypass validation rules creates maintenance challenges when profiles change and makes rules difficult to manage at scale.",
        recommended_approach: "Use custom permissions instead, which are more maintainable and explicit.",
    },
    BypassRuleDef {
        name: "Custom permission bypass",
        pattern: r"NOT\s*\(\s*\$Permission\.[^)]+\)",
        severity: Severity::Low,
        description: "Using NOT with permissions is generally acceptable but should be documented and consistently implemented.",
        recommended_approach: "Ensure permission names are consistently structured with prefixes like 'Bypass_' for clarity.",
    },
    BypassRuleDef {
        name: "User ID bypass",
        pattern: r#"\$User\.Id\s*(?:==?|!=|<>)|['"]\s*(?:==?|!=|<>)\s*\$User\.Id|CONTAINS\s*\(\s*\$User\.Id"#,
        severity: Severity::High,
        description: "Hardcoding specific User IDs creates significant maintenance issues and security risks.",
        recommended_approach: HARDCODED_USER,
    },
    BypassRuleDef {
        name: "Record Type bypass",
        pattern: r"RecordType\.(?:Name|DeveloperName)\s*(?:!=|<>)",
        severity: Severity::Medium,
        description: "Explicitly excluding certain record types can create maintenance challenges.",
        recommended_approach: "Use explicit inclusion rather than exclusion when possible.",
    },
    BypassRuleDef {
        name: "Owner ID bypass",
        pattern: r"OwnerId\s*(?:==?|!=|<>)\s*\$User\.Id",
        severity: Severity::Medium,
        description: "Bypassing validation for record owners may create inconsistent data validation.",
        recommended_approach: "Consider permission-based approaches that don't depend on record ownership.",
    },
];

pub const TRIGGER_PATTERNS: &[BypassRuleDef] = &[
    BypassRuleDef {
        name: "Feature management permission check",
        pattern: r#"FeatureManagement\.checkPermission\s*\(\s*['"]\w+['"]"#,
        severity: Severity::Low,
        description: "Using FeatureManagement to check permissions is recommended, but should be implemented consistently.",
        recommended_approach: "Use a consistent pattern like return !FeatureManagement.checkPermission('Bypass_Trigger');",
    },
    BypassRuleDef {
        name: "Custom setting bypass",
        pattern: r"\b\w+__c\s*\.\s*(?:getInstance|getOrgDefaults|getValues)\s*\(|\b\w+__c\.\w+__c\b",
        severity: Severity::Medium,
        description: "Using custom settings to control trigger execution can create maintenance challenges.",
        recommended_approach: "Document the custom setting usage and ensure consistent implementation.",
    },
    BypassRuleDef {
        name: "Hardcoded User ID check",
        pattern: r#"Id(?:\(\s*\))?\s*==\s*['"]005[A-Za-z0-9]{12,15}['"]"#,
        severity: Severity::High,
        description: "Hardcoding User IDs creates significant maintenance issues and security risks.",
        recommended_approach: HARDCODED_USER,
    },
    BypassRuleDef {
        name: "Profile name check",
        pattern: r#"(?i)profile\.name\s*==\s*['"]|userinfo\.getprofileid\(\)\s*==\s*['"]"#,
        severity: Severity::Medium,
        description: "Using profile names or IDs to bypass logic creates maintenance challenges.",
        recommended_approach: "Use custom permissions instead of relying on profiles.",
    },
];
