//! Settlement maturity computation.
//!
//! Settled funds sit in `pending` for 24 hours before they may be
//! released. The sweep recomputes the releasable amount from the ledger
//! rather than blindly moving everything older than 24 hours, because
//! refunds against already-matured sales must retroactively shrink what is
//! releasable without ever producing a negative balance.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Hours settled funds must age before release.
pub const MATURITY_DELAY_HOURS: i64 = 24;

/// The maturity delay as a `Duration`.
#[must_use]
pub fn maturity_delay() -> Duration {
    Duration::hours(MATURITY_DELAY_HOURS)
}

/// The cutoff instant: sales valued at or before it have matured.
#[must_use]
pub fn maturity_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - maturity_delay()
}

/// Whether the organizer's first paid sale has aged past the delay.
///
/// Free tickets never start the clock; only sales with a positive net
/// amount count.
#[must_use]
pub fn clock_started(first_paid_sale: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    first_paid_sale.is_some_and(|first| now - first >= maturity_delay())
}

/// How much of the pending balance may move to available.
///
/// `matured_sales` is the sum of SALE credits valued at or before the
/// cutoff; `compensating_debits` the absolute sum of REFUND and CHARGEBACK
/// debits; `already_released` the funds that previously left pending
/// (available + withdrawn). The result is clamped to `[0, pending]`.
#[must_use]
pub fn amount_to_release(
    matured_sales: Decimal,
    compensating_debits: Decimal,
    already_released: Decimal,
    pending: Decimal,
) -> Decimal {
    let releasable = matured_sales - compensating_debits - already_released;
    releasable.clamp(Decimal::ZERO, pending.max(Decimal::ZERO))
}
