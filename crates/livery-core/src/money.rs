//! Currency amounts, bounded by the stored `NUMERIC(12, 2)` columns.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};

/// Fractional digits of every stored amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Integer digits a stored amount may have.
pub const MAX_INTEGER_DIGITS: u32 = 10;

/// Whether `amount` can be stored without rounding or overflowing its column.
#[must_use]
pub fn fits_column(amount: Decimal) -> bool {
    amount.normalize().scale() <= CURRENCY_SCALE
        && amount.trunc().abs() < Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS))
}

/// ## Summary
/// Validates a non-negative amount and returns it with exactly [`CURRENCY_SCALE`]
/// fractional digits.
///
/// ## Errors
/// Returns `CoreError::ValidationError` naming `field` if the amount is
/// negative, has sub-cent digits or more than [`MAX_INTEGER_DIGITS`] integer digits.
pub fn currency_amount(field: &str, amount: Decimal) -> CoreResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::ValidationError(format!(
            "{field} must not be negative"
        )));
    }
    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(CoreError::ValidationError(format!(
            "{field} must not have more than {CURRENCY_SCALE} decimal places"
        )));
    }
    if !fits_column(amount) {
        return Err(CoreError::ValidationError(format!(
            "{field} must have at most {MAX_INTEGER_DIGITS} integer digits"
        )));
    }

    let mut amount = amount.normalize();
    amount.rescale(CURRENCY_SCALE);
    Ok(amount)
}
