//! Health scoring.
//!
//! ```text
//! score = clamp(round(100 - prevalence * affected / total
//!                         - high * H - medium * M - low * L), 0, 100)
//! ```
//!
//! Bypass analyses use the default weights (prevalence 3, H 15, M 9, L 2).
//! Naming analyses use prevalence 100 with no per-finding deduction, which
//! makes the naming score equal to the compliance percentage.

use serde::{Deserialize, Serialize};

use crate::types::SeverityCounts;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Points deducted when every record is affected.
    pub prevalence: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl ScoringWeights {
    pub const BYPASS: ScoringWeights = ScoringWeights {
        prevalence: 3.0,
        high: 15.0,
        medium: 9.0,
        low: 2.0,
    };

    pub const NAMING: ScoringWeights = ScoringWeights {
        prevalence: 100.0,
        high: 0.0,
        medium: 0.0,
        low: 0.0,
    };
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::BYPASS
    }
}

pub fn score(total: usize, affected: usize, counts: SeverityCounts, w: &ScoringWeights) -> u8 {
    let mut s = 100.0;
    if total > 0 {
        let affected = affected.min(total);
        s -= w.prevalence.max(0.0) * affected as f64 / total as f64;
    }
    s -= w.high.max(0.0) * counts.high as f64;
    s -= w.medium.max(0.0) * counts.medium as f64;
    s -= w.low.max(0.0) * counts.low as f64;
    s.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Critical => "Critical",
            Rating::Poor => "Poor",
            Rating::Fair => "Fair",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn rating(score: u8) -> Rating {
    match score {
        90.. => Rating::Excellent,
        75..=89 => Rating::Good,
        60..=74 => Rating::Fair,
        40..=59 => Rating::Poor,
        _ => Rating::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(high: usize, medium: usize, low: usize) -> SeverityCounts {
        SeverityCounts { high, medium, low }
    }

    #[test]
    fn clean_set_scores_100() {
        assert_eq!(score(10, 0, SeverityCounts::default(), &ScoringWeights::BYPASS), 100);
        assert_eq!(score(0, 0, SeverityCounts::default(), &ScoringWeights::BYPASS), 100);
    }

    #[test]
    fn bypass_weights_reproduce_reference_scores() {
        assert_eq!(score(3, 1, counts(0, 1, 0), &ScoringWeights::BYPASS), 90);
        assert_eq!(score(1, 1, counts(0, 0, 1), &ScoringWeights::BYPASS), 95);
    }

    #[test]
    fn naming_weights_track_compliance() {
        assert_eq!(score(4, 1, counts(0, 1, 0), &ScoringWeights::NAMING), 75);
        assert_eq!(score(3, 3, counts(3, 0, 0), &ScoringWeights::NAMING), 0);
    }

    #[test]
    fn score_is_clamped_at_zero() {
        assert_eq!(score(10, 10, counts(10, 0, 0), &ScoringWeights::BYPASS), 0);
    }

    #[test]
    fn rating_thresholds() {
        assert_eq!(rating(100), Rating::Excellent);
        assert_eq!(rating(90), Rating::Excellent);
        assert_eq!(rating(89), Rating::Good);
        assert_eq!(rating(75), Rating::Good);
        assert_eq!(rating(74), Rating::Fair);
        assert_eq!(rating(60), Rating::Fair);
        assert_eq!(rating(59), Rating::Poor);
        assert_eq!(rating(40), Rating::Poor);
        assert_eq!(rating(39), Rating::Critical);
        assert_eq!(rating(0), Rating::Critical);
    }
}
