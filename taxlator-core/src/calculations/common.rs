//! Arithmetic shared by the calculators.
//!
//! Rounding happens once, on reported figures. Intermediate amounts stay
//! exact.

use rust_decimal::Decimal;

use crate::calculations::CalculationError;
use crate::models::Frequency;

/// Rounds a monetary amount to kobo (two places), half away from zero.
///
/// Values at exactly 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use taxlator_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// The larger of two amounts.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Converts an income figure to its annual equivalent.
///
/// Monthly amounts are multiplied by 12; annual amounts pass through.
///
/// ```
/// use rust_decimal_macros::dec;
/// use taxlator_core::Frequency;
/// use taxlator_core::calculations::common::normalize_annual;
///
/// assert_eq!(normalize_annual(dec!(250000), Frequency::Monthly), Ok(dec!(3000000)));
/// assert_eq!(normalize_annual(dec!(250000), Frequency::Annual), Ok(dec!(250000)));
/// ```
///
/// # Errors
///
/// [`CalculationError::AmountOutOfRange`] when twelve months of income do
/// not fit in a [`Decimal`].
pub fn normalize_annual(
    amount: Decimal,
    frequency: Frequency,
) -> Result<Decimal, CalculationError> {
    match frequency {
        Frequency::Monthly => amount
            .checked_mul(Decimal::from(12))
            .ok_or(CalculationError::AmountOutOfRange("annual income")),
        Frequency::Annual => Ok(amount),
    }
}

/// Adds amounts, failing instead of overflowing.
pub fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, CalculationError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or(CalculationError::AmountOutOfRange(what))
}

/// Tax as a fraction of the base, rounded to four places. Zero when the
/// base is not positive.
pub fn effective_rate(
    tax: Decimal,
    base: Decimal,
) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (tax / base).round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        let result = round_half_up(dec!(7499.994));

        assert_eq!(result, dec!(7499.99));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        let result = round_half_up(dec!(7499.995));

        assert_eq!(result, dec!(7500.00));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        let result = round_half_up(dec!(-0.125));

        assert_eq!(result, dec!(-0.13));
    }

    #[test]
    fn round_half_up_handles_zero() {
        let result = round_half_up(dec!(0));

        assert_eq!(result, dec!(0.00));
    }

    // =========================================================================
    // max tests
    // =========================================================================

    #[test]
    fn max_clamps_negative_to_zero() {
        let result = max(dec!(-150000), Decimal::ZERO);

        assert_eq!(result, dec!(0));
    }

    #[test]
    fn max_returns_larger_value() {
        let result = max(dec!(200.00), dec!(100.00));

        assert_eq!(result, dec!(200.00));
    }

    // =========================================================================
    // normalize_annual tests
    // =========================================================================

    #[test]
    fn normalize_annual_multiplies_monthly_by_twelve() {
        let result = normalize_annual(dec!(416666.67), Frequency::Monthly);

        assert_eq!(result, Ok(dec!(5000000.04)));
    }

    #[test]
    fn normalize_annual_leaves_annual_unchanged() {
        let result = normalize_annual(dec!(5000000), Frequency::Annual);

        assert_eq!(result, Ok(dec!(5000000)));
    }

    #[test]
    fn normalize_annual_defaults_to_annual() {
        let result = normalize_annual(dec!(1200), Frequency::default());

        assert_eq!(result, Ok(dec!(1200)));
    }

    #[test]
    fn normalize_annual_rejects_overflowing_monthly_income() {
        let result = normalize_annual(Decimal::MAX, Frequency::Monthly);

        assert_eq!(result, Err(CalculationError::AmountOutOfRange("annual income")));
    }

    #[test]
    fn normalize_annual_passes_huge_annual_income_through() {
        assert_eq!(normalize_annual(Decimal::MAX, Frequency::Annual), Ok(Decimal::MAX));
    }

    #[test]
    fn checked_sum_adds_and_detects_overflow() {
        assert_eq!(checked_sum([dec!(1.5), dec!(2.25)], "total"), Ok(dec!(3.75)));
        assert_eq!(checked_sum([], "total"), Ok(dec!(0)));
        assert_eq!(
            checked_sum([Decimal::MAX, dec!(1)], "total"),
            Err(CalculationError::AmountOutOfRange("total"))
        );
    }

    // =========================================================================
    // effective_rate tests
    // =========================================================================

    #[test]
    fn effective_rate_rounds_to_four_places() {
        let result = effective_rate(dec!(690000), dec!(7000000));

        assert_eq!(result, dec!(0.0986));
    }

    #[test]
    fn effective_rate_is_zero_for_zero_base() {
        let result = effective_rate(dec!(100), dec!(0));

        assert_eq!(result, dec!(0));
    }
}
