use std::fmt;

use serde::{Deserialize, Serialize};

/// The metadata collection an analyzer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Field,
    ValidationRule,
    Trigger,
}

impl RecordKind {
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Field => "fields",
            RecordKind::ValidationRule => "validation rules",
            RecordKind::Trigger => "triggers",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Input errors, reported to callers through the failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("No valid {0} provided for analysis")]
    NoValidRecords(RecordKind),
}
