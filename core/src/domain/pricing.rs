// hortifruti-core/src/domain/pricing.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// 2% platform fee charged on the goods subtotal.
pub fn service_fee_rate() -> Decimal {
  Decimal::new(2, 2)
}

/// Rounds to centavos, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Σ unit price × quantity.
pub fn subtotal(lines: impl IntoIterator<Item = (Decimal, i32)>) -> Decimal {
  round_cents(
    lines
      .into_iter()
      .map(|(unit_price, quantity)| unit_price * Decimal::from(quantity))
      .sum(),
  )
}

pub fn service_fee(subtotal: Decimal) -> Decimal {
  round_cents(subtotal * service_fee_rate())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
  pub subtotal: Decimal,
  pub service_fee: Decimal,
  pub shipping_fee: Decimal,
  pub total: Decimal,
}

impl OrderTotals {
  pub fn compute(subtotal: Decimal, shipping_fee: Decimal) -> Self {
    let subtotal = round_cents(subtotal);
    let service_fee = service_fee(subtotal);
    Self {
      subtotal,
      service_fee,
      shipping_fee,
      total: subtotal + service_fee + shipping_fee,
    }
  }
}
