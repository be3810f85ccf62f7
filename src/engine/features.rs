//! Derived feature computation for screening and model inference.
//!
//! These are the engineered features the classifier was trained with; the
//! formulas must stay in lockstep with the training pipeline.

use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Features derived from a single transaction record.
///
/// Always recomputed from the current record (in particular, after a balance
/// correction), never cached across records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// What the sender's balance dropped by
    pub balance_diff_orig: f64,
    /// What the receiver's balance grew by
    pub balance_diff_dest: f64,
    /// Amount over (sender's prior balance + 1); the +1 smooths away the
    /// division by zero for empty accounts and is fixed policy
    pub amount_to_balance_ratio: f64,
    /// Sender went from a positive balance to exactly zero
    pub account_emptied: bool,
}

/// Computes [`DerivedFeatures`] from a transaction record.
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Derive the feature set for one record.
    pub fn derive(&self, record: &TransactionRecord) -> DerivedFeatures {
        DerivedFeatures {
            balance_diff_orig: record.old_balance_orig - record.new_balance_orig,
            balance_diff_dest: record.new_balance_dest - record.old_balance_dest,
            amount_to_balance_ratio: record.amount / (record.old_balance_orig + 1.0),
            account_emptied: record.old_balance_orig > 0.0 && record.new_balance_orig == 0.0,
        }
    }
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}
