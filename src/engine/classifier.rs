//! Classifier boundary: feature vector contract, trait, and adapter.
//!
//! The engine never talks to a concrete model. It builds the exact feature
//! set the classifier was trained on, hands it to an injected
//! [`FraudClassifier`], and normalizes the raw output into a typed result.

use crate::engine::features::DerivedFeatures;
use crate::error::EngineError;
use crate::types::transaction::{TransactionRecord, TransactionType};
use serde::{Deserialize, Serialize};

/// The ten features the classifier consumes, in training order.
///
/// Field order and presence are part of the model contract: a mismatch is a
/// deployment error, surfaced by the classifier rather than papered over
/// here. The transaction type stays categorical; each classifier
/// implementation owns its encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub tx_type: TransactionType,
    pub amount: f64,
    pub old_balance_orig: f64,
    pub new_balance_orig: f64,
    pub old_balance_dest: f64,
    pub new_balance_dest: f64,
    pub balance_diff_orig: f64,
    pub balance_diff_dest: f64,
    pub amount_to_balance_ratio: f64,
    pub account_emptied: bool,
}

impl FeatureVector {
    /// Feature names as they appear in the training pipeline, in order.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "type",
        "amount",
        "oldbalanceOrg",
        "newbalanceOrig",
        "oldbalanceDest",
        "newbalanceDest",
        "balanceDiffOrig",
        "balanceDiffDest",
        "amount_to_balance_ratio",
        "is_account_emptied",
    ];

    /// Assemble the vector from a record and its derived features.
    pub fn from_record(record: &TransactionRecord, derived: &DerivedFeatures) -> Self {
        Self {
            tx_type: record.tx_type,
            amount: record.amount,
            old_balance_orig: record.old_balance_orig,
            new_balance_orig: record.new_balance_orig,
            old_balance_dest: record.old_balance_dest,
            new_balance_dest: record.new_balance_dest,
            balance_diff_orig: derived.balance_diff_orig,
            balance_diff_dest: derived.balance_diff_dest,
            amount_to_balance_ratio: derived.amount_to_balance_ratio,
            account_emptied: derived.account_emptied,
        }
    }
}

/// Class index the trained model uses for fraud.
pub const FRAUD_CLASS: u8 = 1;

/// The two-operation capability of the externally trained binary classifier.
///
/// Implementations must be shareable across worker tasks; the engine holds no
/// model state of its own and receives the classifier explicitly on every
/// call.
pub trait FraudClassifier: Send + Sync {
    /// Predicted class index: 1 for fraud, 0 for legitimate.
    fn predict(&self, features: &FeatureVector) -> Result<u8, EngineError>;

    /// Class probabilities as `[p_legitimate, p_fraud]`, summing to 1.
    fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], EngineError>;
}

/// Classification label, mapped from the raw class index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FraudLabel {
    Fraud,
    Legitimate,
}

/// Normalized classifier output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: FraudLabel,
    pub fraud_probability: f64,
    pub legitimate_probability: f64,
}

impl ClassificationResult {
    pub fn is_fraud(&self) -> bool {
        self.label == FraudLabel::Fraud
    }
}

/// Classification portion of a screening report.
///
/// A classifier failure does not discard the rule-based results, so the
/// report carries either the result or the failure message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ClassificationOutcome {
    Classified(ClassificationResult),
    Failed { error: String },
}

impl ClassificationOutcome {
    pub fn as_result(&self) -> Option<&ClassificationResult> {
        match self {
            ClassificationOutcome::Classified(result) => Some(result),
            ClassificationOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ClassificationOutcome::Failed { .. })
    }
}

/// Packages features for the classifier and normalizes its output.
pub struct ClassificationAdapter;

impl ClassificationAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Run both classifier operations and map the raw output.
    pub fn classify(
        &self,
        record: &TransactionRecord,
        derived: &DerivedFeatures,
        classifier: &dyn FraudClassifier,
    ) -> Result<ClassificationResult, EngineError> {
        let features = FeatureVector::from_record(record, derived);

        let class = classifier.predict(&features)?;
        let [legitimate_probability, fraud_probability] =
            classifier.predict_probability(&features)?;

        let label = if class == FRAUD_CLASS {
            FraudLabel::Fraud
        } else {
            FraudLabel::Legitimate
        };

        Ok(ClassificationResult {
            label,
            fraud_probability,
            legitimate_probability,
        })
    }
}

impl Default for ClassificationAdapter {
    fn default() -> Self {
        Self::new()
    }
}
