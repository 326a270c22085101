use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;

use super::domain::CreditScore;

/// Valid bureau score range.
pub const SCORE_RANGE: RangeInclusive<u16> = 300..=850;

/// Range drawn from when a borrower has no score on file.
pub const GENERATED_SCORE_RANGE: RangeInclusive<u16> = 550..=849;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CreditRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CreditRating {
    pub const fn for_score(score: u16) -> Self {
        match score {
            750..=u16::MAX => Self::Excellent,
            700..=749 => Self::Good,
            650..=699 => Self::Fair,
            _ => Self::Poor,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
}

impl RiskLevel {
    pub const fn for_score(score: u16) -> Self {
        if score >= 700 {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

/// Score record plus derived buckets, as served by the credit-score endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScoreView {
    #[serde(flatten)]
    pub record: CreditScore,
    pub rating: CreditRating,
    pub risk: RiskLevel,
    /// Score as a share of the 850 ceiling, 0-100.
    pub percentile: f64,
}

impl From<CreditScore> for CreditScoreView {
    fn from(record: CreditScore) -> Self {
        let score = record.score;
        Self {
            rating: CreditRating::for_score(score),
            risk: RiskLevel::for_score(score),
            percentile: f64::from(score) / f64::from(*SCORE_RANGE.end()) * 100.0,
            record,
        }
    }
}

/// Source of scores for applicants without a bureau record on file.
pub trait CreditScorer: Send + Sync {
    fn generate(&self) -> u16;
}

/// Uniform draw over [`GENERATED_SCORE_RANGE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCreditScorer;

impl CreditScorer for RandomCreditScorer {
    fn generate(&self) -> u16 {
        rand::rng().random_range(GENERATED_SCORE_RANGE)
    }
}

/// Always returns the same score; used by the demo and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedCreditScorer(pub u16);

impl CreditScorer for FixedCreditScorer {
    fn generate(&self) -> u16 {
        self.0
    }
}
