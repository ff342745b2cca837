//! Derived-tax heuristic.
//!
//! Receipts do not always carry a usable tax line. When the stored tax is
//! absent, the total is assumed to already include tax charged at a fixed
//! nominal 5% rate, and the tax portion is backed out of the total. This is
//! a display heuristic for the pre-tax/tax split, not a jurisdictional tax
//! computation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Returns the tax portion of a tax-inclusive amount.
///
/// A stored tax is returned unchanged. Otherwise the tax is derived as
/// `amount - amount / 1.05`, rounded to 2 decimal places. Negative amounts
/// pass through the same formula verbatim; record validation rejects them
/// upstream.
#[must_use]
pub fn derive_tax(amount: Decimal, stored_tax: Option<Decimal>) -> Decimal {
    if let Some(tax) = stored_tax {
        return tax;
    }
    let inclusive_rate = Decimal::new(105, 2); // 1.05
    (amount - amount / inclusive_rate)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the pre-tax portion of a tax-inclusive amount.
///
/// Always `amount - derive_tax(..)`; the pre-tax value is derived for
/// display and never stored.
#[must_use]
pub fn derive_pre_tax(amount: Decimal, stored_tax: Option<Decimal>) -> Decimal {
    amount - derive_tax(amount, stored_tax)
}
