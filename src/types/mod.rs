//! Type definitions for the screening service

pub mod report;
pub mod transaction;

pub use report::ScreeningReport;
pub use transaction::{TransactionRecord, TransactionType};
