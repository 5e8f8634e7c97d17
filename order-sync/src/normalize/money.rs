//! Money normalization using rust_decimal for precision
//!
//! Marketplace payloads carry integer minor units (`{subunits, currency}`),
//! POS payloads carry decimal currency. Both end up as `Decimal`.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Minor units → currency units, exact (`12345` → `123.45`)
#[inline]
pub fn from_subunits(subunits: i64) -> Decimal {
    Decimal::new(subunits, DECIMAL_PLACES)
}

/// Convert f64 to Decimal (POS exports are already decimal currency)
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Round to 2 decimal places, half away from zero
#[inline]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
///
/// A difference too large to represent is never equal.
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .is_some_and(|diff| diff.abs() < MONEY_TOLERANCE)
}

/// Sum of `values`; `None` on overflow
pub fn checked_total<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}
