//! Rule-based risk scoring
//!
//! The rule set is a fixed decision table: an ordered list of rule functions
//! evaluated top-to-bottom, each contributing points and a human-readable
//! factor. Weights and tier thresholds are exact constants of the design and
//! must match the values the downstream consumers were calibrated against.

use crate::engine::features::DerivedFeatures;
use crate::engine::validation::ValidationResult;
use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};

const LARGE_AMOUNT: f64 = 100_000.0;
const MEDIUM_AMOUNT: f64 = 50_000.0;
const HIGH_RATIO: f64 = 0.8;
const MEDIUM_RATIO: f64 = 0.5;

const HIGH_TIER_MIN: u32 = 7;
const MEDIUM_TIER_MIN: u32 = 4;

/// Categorical risk tier derived from the summed rule score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Threshold the additive score: `>= 7` high, `>= 4` medium, else low.
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_TIER_MIN {
            RiskTier::High
        } else if score >= MEDIUM_TIER_MIN {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Severity marker attached to an individual risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One fired rule: its severity and what it observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub severity: Severity,
    pub description: String,
}

/// Summed score, tier, and the ordered factors that produced them.
///
/// Derived solely from the record, its features, and its validation result;
/// recomputed on every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub tier: RiskTier,
    pub factors: Vec<RiskFactor>,
}

/// A rule inspects the inputs and reports (points, severity, description)
/// when it has something to say. The transaction-type and amount rules always
/// report, with a zero-point factor on their low branch.
type Rule = fn(&TransactionRecord, &DerivedFeatures, &ValidationResult) -> Option<(u32, Severity, &'static str)>;

/// The decision table, in evaluation (and factor) order.
const RULES: &[Rule] = &[
    transaction_type_rule,
    amount_rule,
    account_emptied_rule,
    balance_ratio_rule,
    balance_consistency_rule,
];

fn transaction_type_rule(
    record: &TransactionRecord,
    _derived: &DerivedFeatures,
    _validation: &ValidationResult,
) -> Option<(u32, Severity, &'static str)> {
    if record.tx_type.is_high_risk() {
        Some((
            3,
            Severity::High,
            "High-risk transaction type (fraud typically occurs in TRANSFER/CASH_OUT)",
        ))
    } else {
        Some((0, Severity::Low, "Low-risk transaction type"))
    }
}

fn amount_rule(
    record: &TransactionRecord,
    _derived: &DerivedFeatures,
    _validation: &ValidationResult,
) -> Option<(u32, Severity, &'static str)> {
    if record.amount > LARGE_AMOUNT {
        Some((3, Severity::High, "Large transaction amount (>$100k)"))
    } else if record.amount > MEDIUM_AMOUNT {
        Some((2, Severity::Medium, "Medium transaction amount ($50k-$100k)"))
    } else {
        Some((0, Severity::Low, "Small transaction amount (<$50k)"))
    }
}

fn account_emptied_rule(
    record: &TransactionRecord,
    derived: &DerivedFeatures,
    _validation: &ValidationResult,
) -> Option<(u32, Severity, &'static str)> {
    if derived.account_emptied && record.tx_type.is_high_risk() {
        Some((
            4,
            Severity::High,
            "Account emptied after transaction (high fraud indicator)",
        ))
    } else {
        None
    }
}

fn balance_ratio_rule(
    _record: &TransactionRecord,
    derived: &DerivedFeatures,
    _validation: &ValidationResult,
) -> Option<(u32, Severity, &'static str)> {
    if derived.amount_to_balance_ratio > HIGH_RATIO {
        Some((3, Severity::High, "High amount-to-balance ratio (>80%)"))
    } else if derived.amount_to_balance_ratio > MEDIUM_RATIO {
        Some((2, Severity::Medium, "Medium amount-to-balance ratio (50-80%)"))
    } else {
        None
    }
}

fn balance_consistency_rule(
    _record: &TransactionRecord,
    _derived: &DerivedFeatures,
    validation: &ValidationResult,
) -> Option<(u32, Severity, &'static str)> {
    if !validation.is_consistent() {
        Some((2, Severity::Medium, "Balance inconsistencies detected"))
    } else {
        None
    }
}

/// Applies the rule table and sums the score.
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one transaction. Rules are independent; every rule is evaluated.
    pub fn score(
        &self,
        record: &TransactionRecord,
        derived: &DerivedFeatures,
        validation: &ValidationResult,
    ) -> RiskAssessment {
        let mut score = 0u32;
        let mut factors = Vec::with_capacity(RULES.len());

        for rule in RULES {
            if let Some((points, severity, description)) = rule(record, derived, validation) {
                score += points;
                factors.push(RiskFactor {
                    severity,
                    description: description.to_string(),
                });
            }
        }

        RiskAssessment {
            score,
            tier: RiskTier::from_score(score),
            factors,
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::features::FeatureDeriver;
    use crate::engine::validation::BalanceValidator;
    use crate::types::transaction::TransactionType;

    fn assess(
        tx_type: TransactionType,
        amount: f64,
        old_orig: f64,
        new_orig: f64,
        old_dest: f64,
        new_dest: f64,
    ) -> RiskAssessment {
        let record = TransactionRecord::new(
            "tx_test", tx_type, amount, old_orig, new_orig, old_dest, new_dest,
        );
        let validation = BalanceValidator::new().validate(&record);
        let derived = FeatureDeriver::new().derive(&record);
        RiskScorer::new().score(&record, &derived, &validation)
    }

    #[test]
    fn test_low_risk_payment_scores_zero() {
        let assessment = assess(TransactionType::Payment, 500.0, 10_000.0, 9_500.0, 2_000.0, 2_500.0);

        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.tier, RiskTier::Low);
        // Type and amount rules always emit a factor
        assert_eq!(assessment.factors.len(), 2);
        assert_eq!(assessment.factors[0].severity, Severity::Low);
        assert_eq!(assessment.factors[1].description, "Small transaction amount (<$50k)");
    }

    #[test]
    fn test_emptying_cash_out_scores_high() {
        let assessment = assess(
            TransactionType::CashOut,
            150_000.0,
            150_000.0,
            0.0,
            0.0,
            150_000.0,
        );

        // 3 (type) + 3 (amount) + 4 (emptied) + 3 (ratio)
        assert_eq!(assessment.score, 13);
        assert_eq!(assessment.tier, RiskTier::High);
        assert_eq!(assessment.factors.len(), 4);
        assert!(assessment.factors[2].description.contains("Account emptied"));
    }

    #[test]
    fn test_inconsistency_penalty() {
        // Sender balance untouched: expected 4000, recorded 5000
        let assessment = assess(TransactionType::Transfer, 1000.0, 5000.0, 5000.0, 0.0, 1000.0);

        // 3 (type) + 2 (inconsistency)
        assert_eq!(assessment.score, 5);
        assert_eq!(assessment.tier, RiskTier::Medium);
        assert_eq!(
            assessment.factors.last().unwrap().description,
            "Balance inconsistencies detected"
        );
    }

    #[test]
    fn test_medium_amount_and_ratio_branches() {
        // 60k out of 100k: medium amount (+2) + medium ratio (+2)
        let assessment = assess(
            TransactionType::Payment,
            60_000.0,
            100_000.0,
            40_000.0,
            0.0,
            60_000.0,
        );

        assert_eq!(assessment.score, 4);
        assert_eq!(assessment.tier, RiskTier::Medium);
    }

    #[test]
    fn test_tier_boundaries_are_exact() {
        assert_eq!(RiskTier::from_score(0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(3), RiskTier::Low);
        assert_eq!(RiskTier::from_score(4), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(6), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(7), RiskTier::High);
        assert_eq!(RiskTier::from_score(13), RiskTier::High);
    }

    #[test]
    fn test_score_monotonic_in_rule_triggers() {
        // Start from a benign consistent payment and enable one condition at
        // a time; the score must never decrease.
        let base = assess(TransactionType::Payment, 500.0, 10_000.0, 9_500.0, 0.0, 500.0);

        let typed = assess(TransactionType::Transfer, 500.0, 10_000.0, 9_500.0, 0.0, 500.0);
        assert!(typed.score >= base.score);

        let sized = assess(TransactionType::Transfer, 60_000.0, 200_000.0, 140_000.0, 0.0, 60_000.0);
        assert!(sized.score >= typed.score);

        let inconsistent = assess(TransactionType::Transfer, 60_000.0, 200_000.0, 200_000.0, 0.0, 60_000.0);
        assert!(inconsistent.score >= sized.score);
    }

    #[test]
    fn test_emptying_payment_carries_no_emptying_points() {
        // Account emptied but type is not TRANSFER/CASH_OUT: the +4 rule
        // requires both.
        let assessment = assess(TransactionType::Payment, 1000.0, 1000.0, 0.0, 0.0, 1000.0);

        assert!(assessment
            .factors
            .iter()
            .all(|f| !f.description.contains("Account emptied")));
        // ratio 1000/1001 still fires the high-ratio rule
        assert_eq!(assessment.score, 3);
    }
}
