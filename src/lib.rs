//! Fraud Screening Library
//!
//! Evaluates single financial transactions: balance consistency validation,
//! derived feature computation, deterministic rule-based risk scoring, and
//! fraud classification through an externally trained model.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::TransactionConsumer;
pub use engine::evaluator::TransactionEvaluator;
pub use engine::FraudClassifier;
pub use error::EngineError;
pub use metrics::ScreeningMetrics;
pub use models::onnx::OnnxClassifier;
pub use producer::ReportProducer;
pub use types::{report::ScreeningReport, transaction::TransactionRecord};
