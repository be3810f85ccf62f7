//! Balance arithmetic consistency checks

use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Absolute tolerance (in currency units) when comparing a recorded balance
/// against its expected value.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Outcome of checking a record against the accounting identity
/// "sender loses the amount, receiver gains the amount".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Sender balance implied by the amount
    pub expected_new_balance_orig: f64,
    /// Receiver balance implied by the amount
    pub expected_new_balance_dest: f64,
    /// Recorded sender balance agrees with the expected one
    pub orig_valid: bool,
    /// Recorded receiver balance agrees with the expected one
    pub dest_valid: bool,
}

impl ValidationResult {
    /// True when both sides agree with the expected balances.
    pub fn is_consistent(&self) -> bool {
        self.orig_valid && self.dest_valid
    }
}

/// Checks sender/receiver balance arithmetic against the transaction amount.
///
/// Pure computation on range-checked inputs, so there is no error path.
pub struct BalanceValidator;

impl BalanceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a record's post-transaction balances.
    pub fn validate(&self, record: &TransactionRecord) -> ValidationResult {
        let expected_new_balance_orig = record.old_balance_orig - record.amount;
        let expected_new_balance_dest = record.old_balance_dest + record.amount;

        ValidationResult {
            expected_new_balance_orig,
            expected_new_balance_dest,
            orig_valid: (record.new_balance_orig - expected_new_balance_orig).abs()
                < BALANCE_TOLERANCE,
            dest_valid: (record.new_balance_dest - expected_new_balance_dest).abs()
                < BALANCE_TOLERANCE,
        }
    }
}

impl Default for BalanceValidator {
    fn default() -> Self {
        Self::new()
    }
}
