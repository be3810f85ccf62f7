//! Error types for the screening engine

use thiserror::Error;

/// Errors surfaced by the screening engine.
///
/// Classifier errors are recovered locally by the evaluator (the rule-based
/// portion of a report is still returned); invalid input aborts the
/// evaluation before any processing.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A raw field violates its range constraint.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external classifier is not loaded or could not be reached.
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// The external classifier raised during predict/predict_probability.
    #[error("classifier failure: {0}")]
    ClassifierFailure(String),
}
