//! Pay frequency conversion.
//!
//! Amounts are converted between a pay period and a year using exact
//! decimal arithmetic, so a conversion and its inverse always agree.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::warn;

use crate::models::PayFrequency;

/// Converts a per-period amount to an annual amount.
///
/// Weekly amounts are multiplied by 52, monthly amounts by 12, and annual
/// amounts are returned unchanged. An amount whose annual value cannot be
/// represented exactly, because it overflows or would lose digits to
/// rescaling, is treated as zero.
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::to_annual;
/// use take_home_engine::models::PayFrequency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_annual(Decimal::from(1_200), PayFrequency::Weekly), Decimal::from(62_400));
/// assert_eq!(to_annual(Decimal::from(5_000), PayFrequency::Monthly), Decimal::from(60_000));
/// ```
pub fn to_annual(amount: Decimal, frequency: PayFrequency) -> Decimal {
    match amount.checked_mul(frequency.periods_per_year()) {
        Some(annual) if annual.scale() == amount.scale() => annual,
        _ => {
            warn!(amount = %amount, frequency = frequency.as_str(), "Amount not representable when annualised, treated as zero");
            Decimal::ZERO
        }
    }
}

/// Converts an annual amount to a per-period amount.
///
/// This is the exact inverse of [`to_annual`] for every amount that
/// [`to_annual`] does not map to zero. Salaries reach it rounded to cents
/// by [`CalculationInput::sanitized_salary`](crate::models::CalculationInput::sanitized_salary).
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::{from_annual, to_annual};
/// use take_home_engine::models::PayFrequency;
/// use rust_decimal::Decimal;
///
/// let weekly = Decimal::new(123_456, 2);
/// let annual = to_annual(weekly, PayFrequency::Weekly);
/// assert_eq!(from_annual(annual, PayFrequency::Weekly), weekly);
/// ```
pub fn from_annual(amount: Decimal, frequency: PayFrequency) -> Decimal {
    amount / frequency.periods_per_year()
}

/// Converts a floating-point amount into a [`Decimal`].
///
/// NaN, infinities and values outside the decimal range are treated as zero.
pub fn amount_from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        warn!(value, "Non-finite amount treated as zero");
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or_else(|| {
        warn!(value, "Amount out of range treated as zero");
        Decimal::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// FC-001: weekly annualises by 52
    #[test]
    fn test_weekly_to_annual() {
        assert_eq!(to_annual(dec("1200"), PayFrequency::Weekly), dec("62400"));
    }

    /// FC-002: monthly annualises by 12
    #[test]
    fn test_monthly_to_annual() {
        assert_eq!(to_annual(dec("5000"), PayFrequency::Monthly), dec("60000"));
    }

    /// FC-003: annual is unchanged
    #[test]
    fn test_annual_is_identity() {
        assert_eq!(to_annual(dec("60000"), PayFrequency::Annual), dec("60000"));
        assert_eq!(from_annual(dec("60000"), PayFrequency::Annual), dec("60000"));
    }

    #[test]
    fn test_from_annual_weekly() {
        assert_eq!(from_annual(dec("62400"), PayFrequency::Weekly), dec("1200"));
    }

    #[test]
    fn test_round_trip_is_exact_for_cents() {
        for frequency in [
            PayFrequency::Weekly,
            PayFrequency::Monthly,
            PayFrequency::Annual,
        ] {
            let amount = dec("1234.57");
            assert_eq!(from_annual(to_annual(amount, frequency), frequency), amount);
        }
    }

    #[test]
    fn test_zero_stays_zero() {
        assert_eq!(to_annual(Decimal::ZERO, PayFrequency::Weekly), Decimal::ZERO);
    }

    #[test]
    fn test_overflow_is_treated_as_zero() {
        assert_eq!(to_annual(Decimal::MAX, PayFrequency::Weekly), Decimal::ZERO);
    }

    #[test]
    fn test_precision_loss_is_treated_as_zero() {
        let amount = dec("7.922816251426433759354395033");

        assert_eq!(to_annual(amount, PayFrequency::Weekly), Decimal::ZERO);
        assert_eq!(to_annual(amount, PayFrequency::Monthly), Decimal::ZERO);
        assert_eq!(to_annual(amount, PayFrequency::Annual), amount);
    }

    #[test]
    fn test_round_trip_is_exact_for_many_digits() {
        let amount = dec("7.9228162514264337593543950");
        for frequency in [PayFrequency::Weekly, PayFrequency::Monthly] {
            let annual = to_annual(amount, frequency);
            assert_ne!(annual, Decimal::ZERO);
            assert_eq!(from_annual(annual, frequency), amount);
        }
    }

    #[test]
    fn test_non_finite_amounts_become_zero() {
        assert_eq!(amount_from_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(amount_from_f64(f64::INFINITY), Decimal::ZERO);
        assert_eq!(amount_from_f64(f64::NEG_INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_finite_amount_converts() {
        assert_eq!(amount_from_f64(60000.5), dec("60000.5"));
    }
}
