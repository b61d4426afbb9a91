//! Platform fee arithmetic.
//!
//! The platform takes a percentage of every paid ticket. Events choose who
//! carries it: with buyer-pays-fee the charge is grossed up and the
//! organizer keeps the full ticket price; otherwise the fee comes out of
//! the organizer's credit.

use rust_decimal::Decimal;
use tixera_shared::types::money::{round_to_minor_unit, Currency};

/// Platform fee policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Fee as a percentage of the ticket price (e.g. 5 for 5%).
    pub percent: Decimal,
}

impl FeePolicy {
    /// Creates a fee policy from a percentage.
    #[must_use]
    pub const fn new(percent: Decimal) -> Self {
        Self { percent }
    }

    /// The fee on a given ticket price, rounded to the minor unit.
    #[must_use]
    pub fn fee_on(&self, price: Decimal, currency: Currency) -> Decimal {
        round_to_minor_unit(price * self.percent / Decimal::ONE_HUNDRED, currency)
    }

    /// The amount the buyer is expected to have paid.
    #[must_use]
    pub fn expected_charge(&self, price: Decimal, buyer_pays_fee: bool, currency: Currency) -> Decimal {
        let price = round_to_minor_unit(price, currency);
        if buyer_pays_fee {
            price + self.fee_on(price, currency)
        } else {
            price
        }
    }

    /// The organizer's net credit for a settled sale.
    ///
    /// Full ticket price when the buyer carried the fee, price minus fee
    /// otherwise.
    #[must_use]
    pub fn organizer_net(&self, price: Decimal, buyer_pays_fee: bool, currency: Currency) -> Decimal {
        let price = round_to_minor_unit(price, currency);
        if buyer_pays_fee {
            price
        } else {
            price - self.fee_on(price, currency)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const NGN: Currency = Currency::Ngn;

    #[test]
    fn test_five_percent_fee() {
        let policy = FeePolicy::new(dec!(5));
        assert_eq!(policy.fee_on(dec!(10000), NGN), dec!(500));
    }

    #[test]
    fn test_organizer_absorbs_fee() {
        // A 10,000 sale at 5% nets the organizer 9,500.
        let policy = FeePolicy::new(dec!(5));
        assert_eq!(policy.expected_charge(dec!(10000), false, NGN), dec!(10000));
        assert_eq!(policy.organizer_net(dec!(10000), false, NGN), dec!(9500));
    }

    #[test]
    fn test_buyer_pays_fee() {
        let policy = FeePolicy::new(dec!(5));
        assert_eq!(policy.expected_charge(dec!(10000), true, NGN), dec!(10500));
        assert_eq!(policy.organizer_net(dec!(10000), true, NGN), dec!(10000));
    }

    #[test]
    fn test_fee_rounds_half_to_even() {
        // 0.25% of 10 = 0.025 -> rounds to 0.02
        let policy = FeePolicy::new(dec!(0.25));
        assert_eq!(policy.fee_on(dec!(10), NGN), dec!(0.02));
        // 0.75% of 10 = 0.075 -> rounds to 0.08
        let policy = FeePolicy::new(dec!(0.75));
        assert_eq!(policy.fee_on(dec!(10), NGN), dec!(0.08));
    }

    #[test]
    fn test_zero_price_has_zero_fee() {
        let policy = FeePolicy::new(dec!(5));
        assert_eq!(policy.fee_on(dec!(0), NGN), dec!(0));
        assert_eq!(policy.organizer_net(dec!(0), false, NGN), dec!(0));
        assert_eq!(policy.expected_charge(dec!(0), true, NGN), dec!(0));
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Net plus fee always reconstructs the charge, whoever carries it.
        #[test]
        fn prop_charge_splits_into_net_and_fee(
            price in price_strategy(),
            buyer_pays_fee in any::<bool>(),
        ) {
            let policy = FeePolicy::new(dec!(5));
            let charge = policy.expected_charge(price, buyer_pays_fee, NGN);
            let net = policy.organizer_net(price, buyer_pays_fee, NGN);
            prop_assert_eq!(charge - net, policy.fee_on(price, NGN));
        }

        /// The organizer never nets more than the buyer paid.
        #[test]
        fn prop_net_never_exceeds_charge(
            price in price_strategy(),
            buyer_pays_fee in any::<bool>(),
        ) {
            let policy = FeePolicy::new(dec!(5));
            let charge = policy.expected_charge(price, buyer_pays_fee, NGN);
            let net = policy.organizer_net(price, buyer_pays_fee, NGN);
            prop_assert!(net <= charge);
            prop_assert!(net >= Decimal::ZERO);
        }
    }
}
