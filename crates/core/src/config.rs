use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::{report::ComponentWeights, scoring::ScoringWeights};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub report: ReportConfig,
    pub min_score: Option<u8>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub bypass: ScoringWeights,
    pub naming: ScoringWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bypass: ScoringWeights::BYPASS,
            naming: ScoringWeights::NAMING,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub weights: ComponentWeights,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    pub fn discover() -> Option<Self> {
        let path = Path::new("sfguard.toml");
        if path.exists() {
            Config::load(path).ok()
        } else {
            None
        }
    }
}
