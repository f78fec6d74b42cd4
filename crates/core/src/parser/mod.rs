mod sfdx_xml;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::types::{FieldRecord, TriggerRecord, ValidationRuleRecord};

use sfdx_xml::{parse_field, parse_validation_rule, trigger_is_active};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    BestEffort,
}

/// Records collected from a local metadata directory.
#[derive(Debug, Clone, Default)]
pub struct MetadataBundle {
    pub fields: Vec<FieldRecord>,
    pub validation_rules: Vec<ValidationRuleRecord>,
    pub triggers: Vec<TriggerRecord>,
    pub sources: Vec<String>,
    pub warnings: Vec<String>,
}

impl MetadataBundle {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.validation_rules.is_empty() && self.triggers.is_empty()
    }
}

enum SourceKind {
    FieldsJson,
    ValidationRulesJson,
    TriggersJson,
    FieldXml(String),
    ValidationRuleXml(String),
    TriggerSource(String),
}

fn classify(file_name: &str) -> Option<SourceKind> {
    let kind = match file_name {
        "fields.json" => SourceKind::FieldsJson,
        "validation_rules.json" | "validationRules.json" => SourceKind::ValidationRulesJson,
        "triggers.json" => SourceKind::TriggersJson,
        _ => {
            if let Some(stem) = file_name.strip_suffix(".field-meta.xml") {
                SourceKind::FieldXml(stem.to_string())
            } else if let Some(stem) = file_name.strip_suffix(".validationRule-meta.xml") {
                SourceKind::ValidationRuleXml(stem.to_string())
            } else if let Some(stem) = file_name.strip_suffix(".trigger") {
                SourceKind::TriggerSource(stem.to_string())
            } else {
                return None;
            }
        }
    };
    Some(kind)
}

/// Walks `input` in file-name order and collects every recognised metadata file.
///
/// Recognised files are `fields.json`, `validation_rules.json` and
/// `triggers.json` arrays, SFDX `*.field-meta.xml` and
/// `*.validationRule-meta.xml` files, and `*.trigger` sources (with an
/// optional sibling `*.trigger-meta.xml` for the status).
pub fn load_metadata_dir(
    input: &Path,
    mode: ParseMode,
    max_total_bytes_scanned: u64,
) -> anyhow::Result<MetadataBundle> {
    let mut bundle = MetadataBundle::default();
    let mut scanned: u64 = 0;

    for entry in WalkDir::new(input).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(kind) = path.file_name().and_then(|n| n.to_str()).and_then(classify) else {
            continue;
        };

        let meta = std::fs::metadata(path)?;
        let len = meta.len();
        if scanned.saturating_add(len) > max_total_bytes_scanned {
            tracing::warn!(limit = max_total_bytes_scanned, "scan limit reached, stopping");
            bundle
                .warnings
                .push(format!("stopped at {}: scan limit reached", path.display()));
            break;
        }
        scanned += len;

        match load_file(path, kind, &mut bundle) {
            Ok(()) => bundle.sources.push(path.display().to_string()),
            Err(e) if mode == ParseMode::BestEffort => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable metadata file");
                bundle.warnings.push(format!("{}: {:#}", path.display(), e));
            }
            Err(e) => return Err(e),
        }
    }

    if mode == ParseMode::Strict && bundle.is_empty() {
        anyhow::bail!(
            "insufficient input: no field, validation rule or trigger metadata found under {}",
            input.display()
        );
    }

    Ok(bundle)
}

fn load_file(path: &Path, kind: SourceKind, bundle: &mut MetadataBundle) -> anyhow::Result<()> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;

    match kind {
        SourceKind::FieldsJson => bundle.fields.extend(parse_json::<FieldRecord>(path, &contents)?),
        SourceKind::ValidationRulesJson => bundle
            .validation_rules
            .extend(parse_json::<ValidationRuleRecord>(path, &contents)?),
        SourceKind::TriggersJson => bundle
            .triggers
            .extend(parse_json::<TriggerRecord>(path, &contents)?),
        SourceKind::FieldXml(stem) => bundle.fields.push(parse_field(&contents, &stem)),
        SourceKind::ValidationRuleXml(stem) => bundle
            .validation_rules
            .push(parse_validation_rule(&contents, &stem)),
        SourceKind::TriggerSource(stem) => {
            let meta_path = path.with_file_name(format!("{stem}.trigger-meta.xml"));
            let active = match std::fs::read_to_string(&meta_path) {
                Ok(meta) => trigger_is_active(&meta),
                Err(_) => true,
            };
            bundle.triggers.push(TriggerRecord {
                name: Some(stem),
                content: contents,
                active,
            });
        }
    }
    Ok(())
}

fn parse_json<T: DeserializeOwned>(path: &Path, contents: &str) -> anyhow::Result<Vec<T>> {
    serde_json::from_str(contents).with_context(|| format!("parse json {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognises_metadata_files() {
        assert!(matches!(classify("fields.json"), Some(SourceKind::FieldsJson)));
        assert!(matches!(
            classify("Amount.validationRule-meta.xml"),
            Some(SourceKind::ValidationRuleXml(s)) if s == "Amount"
        ));
        assert!(matches!(
            classify("LoanTrigger.trigger"),
            Some(SourceKind::TriggerSource(s)) if s == "LoanTrigger"
        ));
        assert!(classify("LoanTrigger.trigger-meta.xml").is_none());
        assert!(classify("README.md").is_none());
    }
}
