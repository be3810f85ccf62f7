//! Screening report data structures

use crate::engine::classifier::ClassificationOutcome;
use crate::engine::evaluator::Evaluation;
use crate::engine::features::DerivedFeatures;
use crate::engine::risk::{RiskAssessment, RiskTier};
use crate::engine::validation::ValidationResult;
use crate::types::transaction::{TransactionRecord, TransactionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full screening outcome for one transaction, as published downstream.
///
/// Carries every step of the evaluation: validation flags with expected
/// values, the corrected record when one was produced, derived features,
/// the ordered risk factors with score and tier, and the classification
/// outcome (or its failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// Unique report identifier
    pub report_id: String,

    /// Associated transaction ID
    pub transaction_id: String,

    /// Transaction category as received
    pub tx_type: TransactionType,

    /// Transaction amount as received
    pub amount: f64,

    /// Balance consistency check results
    pub validation: ValidationResult,

    /// Record with expected balances substituted, when validation failed
    pub corrected_record: Option<TransactionRecord>,

    /// Derived features used for scoring and classification
    pub derived: DerivedFeatures,

    /// Rule-based risk assessment
    pub risk: RiskAssessment,

    /// Classifier verdict, or the failure that prevented one
    pub classification: ClassificationOutcome,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl ScreeningReport {
    /// Build a report from a record and its completed evaluation.
    pub fn new(record: &TransactionRecord, evaluation: Evaluation) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            transaction_id: record.transaction_id.clone(),
            tx_type: record.tx_type,
            amount: record.amount,
            validation: evaluation.validation,
            corrected_record: evaluation.corrected,
            derived: evaluation.derived,
            risk: evaluation.risk,
            classification: evaluation.classification,
            timestamp: Utc::now(),
        }
    }

    /// True when the classifier flagged the transaction as fraud.
    pub fn is_fraud(&self) -> bool {
        self.classification
            .as_result()
            .map(|r| r.is_fraud())
            .unwrap_or(false)
    }

    /// Fraud probability, when classification succeeded.
    pub fn fraud_probability(&self) -> Option<f64> {
        self.classification.as_result().map(|r| r.fraud_probability)
    }

    /// True for reports worth flagging loudly: high rule tier or a fraud verdict.
    pub fn needs_attention(&self) -> bool {
        self.risk.tier == RiskTier::High || self.is_fraud()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::{ClassificationResult, FraudLabel};
    use crate::engine::risk::{RiskFactor, Severity};

    fn sample_report(outcome: ClassificationOutcome) -> ScreeningReport {
        let record = TransactionRecord::new(
            "tx_123",
            TransactionType::CashOut,
            150_000.0,
            150_000.0,
            0.0,
            0.0,
            150_000.0,
        );
        let evaluation = Evaluation {
            validation: ValidationResult {
                expected_new_balance_orig: 0.0,
                expected_new_balance_dest: 150_000.0,
                orig_valid: true,
                dest_valid: true,
            },
            corrected: None,
            derived: DerivedFeatures {
                balance_diff_orig: 150_000.0,
                balance_diff_dest: 150_000.0,
                amount_to_balance_ratio: 0.99999,
                account_emptied: true,
            },
            risk: RiskAssessment {
                score: 13,
                tier: RiskTier::High,
                factors: vec![RiskFactor {
                    severity: Severity::High,
                    description: "Large transaction amount (>$100k)".to_string(),
                }],
            },
            classification: outcome,
        };
        ScreeningReport::new(&record, evaluation)
    }

    #[test]
    fn test_report_serialization() {
        let report = sample_report(ClassificationOutcome::Classified(ClassificationResult {
            label: FraudLabel::Fraud,
            fraud_probability: 0.94,
            legitimate_probability: 0.06,
        }));

        let json = serde_json::to_string(&report).unwrap();
        let deserialized: ScreeningReport = serde_json::from_str(&json).unwrap();

        assert_eq!(report.transaction_id, deserialized.transaction_id);
        assert_eq!(deserialized.risk.score, 13);
        assert!(deserialized.is_fraud());
        assert_eq!(deserialized.fraud_probability(), Some(0.94));
        assert!(deserialized.needs_attention());
    }

    #[test]
    fn test_failed_classification_report() {
        let report = sample_report(ClassificationOutcome::Failed {
            error: "classifier unavailable: model not loaded".to_string(),
        });

        assert!(!report.is_fraud());
        assert_eq!(report.fraud_probability(), None);
        // High rule tier still warrants attention on its own
        assert!(report.needs_attention());
    }
}
