//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.
//! Amounts are rounded to the currency's smallest unit using banker's
//! rounding (round half to even) to minimize cumulative errors.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g., naira, not kobo).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "NGN", "USD").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Nigerian Naira
    Ngn,
    /// Ghanaian Cedi
    Ghs,
    /// Kenyan Shilling
    Kes,
    /// South African Rand
    Zar,
    /// US Dollar
    Usd,
}

impl Currency {
    /// Number of decimal places in the currency's smallest unit.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::Ngn | Self::Ghs | Self::Kes | Self::Zar | Self::Usd => 2,
        }
    }

    /// The smallest representable unit of the currency (e.g., one kobo).
    #[must_use]
    pub fn minor_unit(self) -> Decimal {
        Decimal::new(1, self.decimal_places())
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative()
    }

    /// Rounds the amount to the currency's smallest unit.
    ///
    /// Uses banker's rounding (round half to even).
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            amount: round_to_minor_unit(self.amount, self.currency),
            currency: self.currency,
        }
    }
}

/// Rounds an amount to the currency's smallest unit using banker's rounding.
#[must_use]
pub fn round_to_minor_unit(amount: Decimal, currency: Currency) -> Decimal {
    amount.round_dp_with_strategy(
        currency.decimal_places(),
        RoundingStrategy::MidpointNearestEven,
    )
}

/// Returns true if two amounts differ by at most one smallest unit.
///
/// Payment gateways round charges to the minor unit on their side, so a
/// settled amount may legitimately differ from the recomputed expectation
/// by a single kobo/cent. Anything beyond that is a mismatch.
#[must_use]
pub fn within_tolerance(paid: Decimal, expected: Decimal, currency: Currency) -> bool {
    (paid - expected).abs() <= currency.minor_unit()
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ngn => write!(f, "NGN"),
            Self::Ghs => write!(f, "GHS"),
            Self::Kes => write!(f, "KES"),
            Self::Zar => write!(f, "ZAR"),
            Self::Usd => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NGN" => Ok(Self::Ngn),
            "GHS" => Ok(Self::Ghs),
            "KES" => Ok(Self::Kes),
            "ZAR" => Ok(Self::Zar),
            "USD" => Ok(Self::Usd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_new() {
        let amount = dec!(100.00);
        let money = Money::new(amount, Currency::Ngn);
        assert_eq!(money.amount, amount);
        assert_eq!(money.currency, Currency::Ngn);
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Ghs);
        assert!(money.is_zero());
        assert_eq!(money.amount, Decimal::ZERO);
        assert_eq!(money.currency, Currency::Ghs);
    }

    #[test]
    fn test_money_is_negative() {
        let positive = Money::new(dec!(10), Currency::Ngn);
        assert!(!positive.is_negative());

        let negative = Money::new(dec!(-10), Currency::Ngn);
        assert!(negative.is_negative());

        let zero = Money::new(dec!(0), Currency::Ngn);
        assert!(!zero.is_negative());
    }

    #[test]
    fn test_bankers_rounding() {
        // Round half to even: 2.125 -> 2.12, 2.135 -> 2.14
        assert_eq!(round_to_minor_unit(dec!(2.125), Currency::Ngn), dec!(2.12));
        assert_eq!(round_to_minor_unit(dec!(2.135), Currency::Ngn), dec!(2.14));
        assert_eq!(round_to_minor_unit(dec!(2.5), Currency::Ngn), dec!(2.5));
    }

    #[test]
    fn test_rounded_money() {
        let money = Money::new(dec!(499.995), Currency::Ngn).rounded();
        assert_eq!(money.amount, dec!(500.00));
    }

    #[test]
    fn test_within_tolerance_exact() {
        assert!(within_tolerance(dec!(100.00), dec!(100.00), Currency::Ngn));
    }

    #[test]
    fn test_within_tolerance_one_minor_unit() {
        assert!(within_tolerance(dec!(100.01), dec!(100.00), Currency::Ngn));
        assert!(within_tolerance(dec!(99.99), dec!(100.00), Currency::Ngn));
    }

    #[test]
    fn test_outside_tolerance() {
        assert!(!within_tolerance(dec!(100.02), dec!(100.00), Currency::Ngn));
        assert!(!within_tolerance(dec!(99.98), dec!(100.00), Currency::Ngn));
        assert!(!within_tolerance(dec!(0), dec!(100.00), Currency::Ngn));
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Ngn.to_string(), "NGN");
        assert_eq!(Currency::Ghs.to_string(), "GHS");
        assert_eq!(Currency::Kes.to_string(), "KES");
        assert_eq!(Currency::Zar.to_string(), "ZAR");
        assert_eq!(Currency::Usd.to_string(), "USD");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("NGN").unwrap(), Currency::Ngn);
        assert_eq!(Currency::from_str("ngn").unwrap(), Currency::Ngn);
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);

        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_minor_unit() {
        assert_eq!(Currency::Ngn.minor_unit(), dec!(0.01));
    }
}
