//! Evaluation orchestration: validate, correct, derive, score, classify.

use crate::engine::classifier::{ClassificationAdapter, ClassificationOutcome, FraudClassifier};
use crate::engine::features::{DerivedFeatures, FeatureDeriver};
use crate::engine::risk::{RiskAssessment, RiskScorer};
use crate::engine::validation::{BalanceValidator, ValidationResult};
use crate::error::EngineError;
use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Everything one evaluation produces.
///
/// `corrected` is present only when at least one balance failed validation;
/// `derived`, `risk`, and `classification` are then computed from the
/// corrected record, while `validation` still describes the record as
/// received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub validation: ValidationResult,
    pub corrected: Option<TransactionRecord>,
    pub derived: DerivedFeatures,
    pub risk: RiskAssessment,
    pub classification: ClassificationOutcome,
}

/// Sequences the screening steps for one transaction at a time.
///
/// Stateless across calls; the classifier is an explicit dependency of every
/// `evaluate` call, so one evaluator can serve concurrent callers.
pub struct TransactionEvaluator {
    validator: BalanceValidator,
    deriver: FeatureDeriver,
    scorer: RiskScorer,
    adapter: ClassificationAdapter,
}

impl TransactionEvaluator {
    pub fn new() -> Self {
        Self {
            validator: BalanceValidator::new(),
            deriver: FeatureDeriver::new(),
            scorer: RiskScorer::new(),
            adapter: ClassificationAdapter::new(),
        }
    }

    /// Evaluate a raw record.
    ///
    /// Returns `InvalidInput` before any processing if a field is out of
    /// range. A classifier failure is kept local: the bundle still carries
    /// the validation, correction, feature, and risk results, with the
    /// classification portion marked failed.
    pub fn evaluate(
        &self,
        record: &TransactionRecord,
        classifier: &dyn FraudClassifier,
    ) -> Result<Evaluation, EngineError> {
        record.check()?;

        let validation = self.validator.validate(record);

        // Recovery policy: the amount is trusted over manually entered
        // balances, so each invalid side is replaced by its expected value.
        let corrected = if validation.is_consistent() {
            None
        } else {
            let new_orig = if validation.orig_valid {
                record.new_balance_orig
            } else {
                validation.expected_new_balance_orig
            };
            let new_dest = if validation.dest_valid {
                record.new_balance_dest
            } else {
                validation.expected_new_balance_dest
            };
            debug!(
                transaction_id = %record.transaction_id,
                orig_valid = validation.orig_valid,
                dest_valid = validation.dest_valid,
                "Applying balance correction"
            );
            Some(record.with_balances(new_orig, new_dest))
        };

        let effective = corrected.as_ref().unwrap_or(record);
        let derived = self.deriver.derive(effective);

        // The score keeps the pre-correction validation result: the penalty
        // reflects the inconsistency as entered, even though scoring and
        // classification run on the cleaned record.
        let risk = self.scorer.score(effective, &derived, &validation);

        let classification = match self.adapter.classify(effective, &derived, classifier) {
            Ok(result) => ClassificationOutcome::Classified(result),
            Err(e) => {
                warn!(
                    transaction_id = %record.transaction_id,
                    error = %e,
                    "Classification failed, returning rule-based results only"
                );
                ClassificationOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(Evaluation {
            validation,
            corrected,
            derived,
            risk,
            classification,
        })
    }
}

impl Default for TransactionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::{FeatureVector, FraudLabel};
    use crate::engine::risk::RiskTier;
    use crate::types::transaction::TransactionType;

    /// Deterministic classifier: flags high-ratio transfers as fraud.
    struct RatioStub;

    impl FraudClassifier for RatioStub {
        fn predict(&self, features: &FeatureVector) -> Result<u8, EngineError> {
            Ok((features.amount_to_balance_ratio > 0.8 && features.tx_type.is_high_risk()) as u8)
        }

        fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], EngineError> {
            let p_fraud = if self.predict(features)? == 1 { 0.97 } else { 0.02 };
            Ok([1.0 - p_fraud, p_fraud])
        }
    }

    struct BrokenStub;

    impl FraudClassifier for BrokenStub {
        fn predict(&self, _features: &FeatureVector) -> Result<u8, EngineError> {
            Err(EngineError::ClassifierUnavailable("model not loaded".to_string()))
        }

        fn predict_probability(&self, _features: &FeatureVector) -> Result<[f64; 2], EngineError> {
            Err(EngineError::ClassifierUnavailable("model not loaded".to_string()))
        }
    }

    #[test]
    fn test_consistent_payment_needs_no_correction() {
        // Scenario: plain consistent payment
        let record = TransactionRecord::new(
            "tx_a",
            TransactionType::Payment,
            500.0,
            10_000.0,
            9_500.0,
            2_000.0,
            2_500.0,
        );

        let evaluation = TransactionEvaluator::new().evaluate(&record, &RatioStub).unwrap();

        assert!(evaluation.validation.is_consistent());
        assert!(evaluation.corrected.is_none());
        assert!(!evaluation.derived.account_emptied);
        assert_eq!(evaluation.risk.score, 0);
        assert_eq!(evaluation.risk.tier, RiskTier::Low);
        let result = evaluation.classification.as_result().unwrap();
        assert_eq!(result.label, FraudLabel::Legitimate);
    }

    #[test]
    fn test_emptying_cash_out_is_high_risk_fraud() {
        let record = TransactionRecord::new(
            "tx_b",
            TransactionType::CashOut,
            150_000.0,
            150_000.0,
            0.0,
            0.0,
            150_000.0,
        );

        let evaluation = TransactionEvaluator::new().evaluate(&record, &RatioStub).unwrap();

        assert!(evaluation.validation.is_consistent());
        assert!(evaluation.derived.account_emptied);
        assert!((evaluation.derived.amount_to_balance_ratio - 1.0).abs() < 1e-4);
        assert_eq!(evaluation.risk.score, 13);
        assert_eq!(evaluation.risk.tier, RiskTier::High);
        let result = evaluation.classification.as_result().unwrap();
        assert_eq!(result.label, FraudLabel::Fraud);
        assert!((result.fraud_probability + result.legitimate_probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_side_is_corrected_but_still_penalized() {
        // Sender balance entered unchanged; expected 4000 after a 1000 transfer
        let record = TransactionRecord::new(
            "tx_c",
            TransactionType::Transfer,
            1000.0,
            5000.0,
            5000.0,
            0.0,
            1000.0,
        );

        let evaluation = TransactionEvaluator::new().evaluate(&record, &RatioStub).unwrap();

        assert!(!evaluation.validation.orig_valid);
        assert!(evaluation.validation.dest_valid);

        let corrected = evaluation.corrected.as_ref().unwrap();
        assert_eq!(corrected.new_balance_orig, 4000.0);
        // The valid side is left as entered
        assert_eq!(corrected.new_balance_dest, 1000.0);

        // Features come from the corrected record
        assert_eq!(evaluation.derived.balance_diff_orig, 1000.0);

        // 3 (type) + 2 (inconsistency as originally entered)
        assert_eq!(evaluation.risk.score, 5);
        assert!(evaluation
            .risk
            .factors
            .iter()
            .any(|f| f.description == "Balance inconsistencies detected"));
    }

    #[test]
    fn test_both_sides_corrected_independently() {
        let record = TransactionRecord::new(
            "tx_d",
            TransactionType::CashOut,
            2000.0,
            2000.0,
            2000.0,
            500.0,
            500.0,
        );

        let evaluation = TransactionEvaluator::new().evaluate(&record, &RatioStub).unwrap();

        let corrected = evaluation.corrected.as_ref().unwrap();
        assert_eq!(corrected.new_balance_orig, 0.0);
        assert_eq!(corrected.new_balance_dest, 2500.0);
        // Emptying is visible only after the correction
        assert!(evaluation.derived.account_emptied);
    }

    #[test]
    fn test_invalid_input_aborts_before_processing() {
        let mut record = TransactionRecord::new(
            "tx_e",
            TransactionType::Payment,
            100.0,
            1000.0,
            900.0,
            0.0,
            100.0,
        );
        record.amount = -5.0;

        let err = TransactionEvaluator::new().evaluate(&record, &RatioStub).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_classifier_failure_keeps_rule_based_results() {
        let record = TransactionRecord::new(
            "tx_f",
            TransactionType::CashOut,
            150_000.0,
            150_000.0,
            0.0,
            0.0,
            150_000.0,
        );

        let evaluation = TransactionEvaluator::new().evaluate(&record, &BrokenStub).unwrap();

        assert_eq!(evaluation.risk.score, 13);
        assert!(evaluation.classification.is_failed());
        match &evaluation.classification {
            ClassificationOutcome::Failed { error } => {
                assert!(error.contains("model not loaded"))
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let record = TransactionRecord::new(
            "tx_g",
            TransactionType::Transfer,
            1000.0,
            5000.0,
            5000.0,
            0.0,
            1000.0,
        );

        let evaluator = TransactionEvaluator::new();
        let first = evaluator.evaluate(&record, &RatioStub).unwrap();
        let second = evaluator.evaluate(&record, &RatioStub).unwrap();

        assert_eq!(first.validation.orig_valid, second.validation.orig_valid);
        assert_eq!(first.derived, second.derived);
        assert_eq!(first.risk.score, second.risk.score);
        assert_eq!(first.risk.factors, second.risk.factors);
        assert_eq!(
            first.classification.as_result().unwrap().label,
            second.classification.as_result().unwrap().label
        );
    }
}
