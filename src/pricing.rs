//! Pricing
//!
//! All money is carried as integer minor units (cents). Decimal arithmetic only
//! happens when applying the tax percentage, and the result is rounded straight
//! back to minor units.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Percentage calculation could not be represented in minor units.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Fixed VAT rate, in percent points.
pub const TAX_RATE_PERCENT: i64 = 21;

/// Fixed VAT rate applied to every receipt.
pub fn tax_rate() -> Percentage {
    Percentage::from(Decimal::new(TAX_RATE_PERCENT, 2))
}

/// Price of `quantity` units at `unit_price`.
pub fn line_total(unit_price: &Money<'static, Currency>, quantity: u32) -> Money<'static, Currency> {
    Money::from_minor(
        unit_price
            .to_minor_units()
            .saturating_mul(i64::from(quantity)),
        unit_price.currency(),
    )
}

/// Sum an iterator of minor-unit amounts into money of `currency`.
pub fn sum_minor(
    amounts: impl IntoIterator<Item = i64>,
    currency: &'static Currency,
) -> Money<'static, Currency> {
    Money::from_minor(
        amounts.into_iter().fold(0_i64, i64::saturating_add),
        currency,
    )
}

/// Calculate `percent` of a minor unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the result overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    // `Percentage` keeps its `Decimal` private; multiplying by one unwraps it.
    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Tax owed on `subtotal` at the fixed [`tax_rate`].
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the result overflows.
pub fn tax_on(subtotal: &Money<'static, Currency>) -> Result<Money<'static, Currency>, PricingError> {
    let tax_minor = percent_of_minor(&tax_rate(), subtotal.to_minor_units())?;

    Ok(Money::from_minor(tax_minor, subtotal.currency()))
}

/// Format money for the kiosk display, e.g. `€1,29`.
///
/// Uses the currency symbol, a comma as decimal separator and no grouping.
pub fn format_price(price: &Money<'_, Currency>) -> String {
    let minor = price.to_minor_units();
    let sign = if minor < 0 { "-" } else { "" };
    let minor = minor.unsigned_abs();

    format!(
        "{sign}{}{},{:02}",
        price.currency().symbol,
        minor / 100,
        minor % 100
    )
}

/// Display label for a number of items in the cart.
pub fn item_count_label(count: u64) -> String {
    if count == 1 {
        "1 product".to_string()
    } else {
        format!("{count} producten")
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn line_total_multiplies_minor_units() {
        let price = Money::from_minor(129, EUR);

        assert_eq!(line_total(&price, 3), Money::from_minor(387, EUR));
    }

    #[test]
    fn sum_minor_of_nothing_is_zero() {
        assert_eq!(sum_minor([], EUR), Money::from_minor(0, EUR));
    }

    #[test]
    fn tax_on_rounds_to_cents() -> TestResult {
        assert_eq!(tax_on(&Money::from_minor(258, EUR))?, Money::from_minor(54, EUR));

        Ok(())
    }

    #[test]
    fn tax_on_binary_unfriendly_subtotal_is_exact() -> TestResult {
        // 1.10 * 0.21 = 0.231 -> 0.23
        assert_eq!(tax_on(&Money::from_minor(110, EUR))?, Money::from_minor(23, EUR));

        Ok(())
    }

    #[test]
    fn tax_on_midpoint_rounds_away_from_zero() -> TestResult {
        // 0.50 * 0.21 = 0.105 -> 0.11
        assert_eq!(tax_on(&Money::from_minor(50, EUR))?, Money::from_minor(11, EUR));

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let result = percent_of_minor(&Percentage::from(2.0), i64::MAX);

        assert_eq!(result, Err(PricingError::PercentConversion));
    }

    #[test]
    fn format_price_uses_comma_separator() {
        assert_eq!(format_price(&Money::from_minor(129, EUR)), "€1,29");
        assert_eq!(format_price(&Money::from_minor(5, EUR)), "€0,05");
        assert_eq!(format_price(&Money::from_minor(1200, EUR)), "€12,00");
    }

    #[test]
    fn item_count_label_pluralises() {
        assert_eq!(item_count_label(1), "1 product");
        assert_eq!(item_count_label(0), "0 producten");
        assert_eq!(item_count_label(4), "4 producten");
    }
}
