//! Transaction data structures for fraud screening

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a financial transaction.
///
/// The set is closed: any other value in the input is rejected during
/// deserialization, before the record reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Payment,
    Transfer,
    CashOut,
    Deposit,
}

impl TransactionType {
    /// TRANSFER and CASH_OUT are the channels fraud typically moves through.
    pub fn is_high_risk(self) -> bool {
        matches!(self, TransactionType::Transfer | TransactionType::CashOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Payment => "PAYMENT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Deposit => "DEPOSIT",
        }
    }
}

/// A single transaction to be screened.
///
/// Field aliases match the column names of the training data, so records
/// exported from it deserialize unchanged. All monetary fields must be
/// non-negative; `check` enforces this before evaluation. A record is never
/// mutated after that — balance corrections produce a new record via
/// [`TransactionRecord::with_balances`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Correlation identifier assigned by the upstream system
    #[serde(default)]
    pub transaction_id: String,

    /// Transaction category
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Transaction amount
    pub amount: f64,

    /// Sender balance before the transaction
    #[serde(alias = "oldbalanceOrg")]
    pub old_balance_orig: f64,

    /// Sender balance after the transaction
    #[serde(alias = "newbalanceOrig")]
    pub new_balance_orig: f64,

    /// Receiver balance before the transaction
    #[serde(alias = "oldbalanceDest")]
    pub old_balance_dest: f64,

    /// Receiver balance after the transaction
    #[serde(alias = "newbalanceDest")]
    pub new_balance_dest: f64,

    /// Arrival timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a new record with the six screening fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_id: impl Into<String>,
        tx_type: TransactionType,
        amount: f64,
        old_balance_orig: f64,
        new_balance_orig: f64,
        old_balance_dest: f64,
        new_balance_dest: f64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            tx_type,
            amount,
            old_balance_orig,
            new_balance_orig,
            old_balance_dest,
            new_balance_dest,
            timestamp: Utc::now(),
        }
    }

    /// Verify the range constraints on all monetary fields.
    pub fn check(&self) -> Result<(), EngineError> {
        let fields = [
            ("amount", self.amount),
            ("old_balance_orig", self.old_balance_orig),
            ("new_balance_orig", self.new_balance_orig),
            ("old_balance_dest", self.old_balance_dest),
            ("new_balance_dest", self.new_balance_dest),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EngineError::InvalidInput(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// New record with the post-transaction balances replaced.
    ///
    /// Used by the evaluator to substitute expected balances on the sides
    /// that failed validation.
    pub fn with_balances(&self, new_balance_orig: f64, new_balance_dest: f64) -> Self {
        Self {
            new_balance_orig,
            new_balance_dest,
            ..self.clone()
        }
    }
}
