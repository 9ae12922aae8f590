//! Effective tax rates derived from charged amounts.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::OrderItem;

/// Effective rate of a line in percent: `round(taxes / total * 100, 2)`,
/// 0 when the total is not positive.
pub fn item_tax_rate(item: &OrderItem) -> Decimal {
    rate_of(item.tax_total(), item.total)
}

/// Effective shipping rate in percent, same rule as [`item_tax_rate`].
pub fn shipping_tax_rate(shipping_total: Decimal, shipping_tax: Decimal) -> Decimal {
    rate_of(shipping_tax, shipping_total)
}

fn rate_of(tax: Decimal, base: Decimal) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (tax / base * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
