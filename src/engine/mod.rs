//! Core screening engine: validation, feature derivation, rule-based risk
//! scoring, and the classifier boundary.

pub mod classifier;
pub mod evaluator;
pub mod features;
pub mod risk;
pub mod validation;

pub use classifier::{
    ClassificationAdapter, ClassificationOutcome, ClassificationResult, FeatureVector,
    FraudClassifier, FraudLabel,
};
pub use evaluator::{Evaluation, TransactionEvaluator};
pub use features::{DerivedFeatures, FeatureDeriver};
pub use risk::{RiskAssessment, RiskFactor, RiskScorer, RiskTier, Severity};
pub use validation::{BalanceValidator, ValidationResult, BALANCE_TOLERANCE};
