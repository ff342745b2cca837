//! Expense record invariant validation.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::ExpenseRecord;

/// Validation errors for expense records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Owner tag is empty.
    #[error("Owner tag must not be empty")]
    EmptyOwner,

    /// Merchant name is empty.
    #[error("Merchant name must not be empty")]
    EmptyMerchant,

    /// Category label is empty.
    #[error("Category must not be empty")]
    EmptyCategory,

    /// Amount is negative.
    #[error("Amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    /// Stored tax is negative.
    #[error("Tax must not be negative: {0}")]
    NegativeTax(Decimal),

    /// Stored tax exceeds the tax-inclusive total.
    #[error("Tax {tax} exceeds total amount {amount}")]
    TaxExceedsAmount {
        /// Stored tax.
        tax: Decimal,
        /// Tax-inclusive total.
        amount: Decimal,
    },
}

impl ExpenseRecord {
    /// Checks the record invariants: `amount >= 0`, `0 <= tax <= amount`,
    /// non-empty owner, merchant and category.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.owner.trim().is_empty() {
            return Err(RecordError::EmptyOwner);
        }
        if self.merchant.trim().is_empty() {
            return Err(RecordError::EmptyMerchant);
        }
        if self.category.label().trim().is_empty() {
            return Err(RecordError::EmptyCategory);
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(RecordError::NegativeAmount(self.amount));
        }
        if let Some(tax) = self.tax {
            if tax.is_sign_negative() && !tax.is_zero() {
                return Err(RecordError::NegativeTax(tax));
            }
            if tax > self.amount {
                return Err(RecordError::TaxExceedsAmount {
                    tax,
                    amount: self.amount,
                });
            }
        }
        Ok(())
    }
}
