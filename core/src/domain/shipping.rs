// hortifruti-core/src/domain/shipping.rs

//! Flat delivery fees by CEP band around the store in Guaratinguetá.

use rust_decimal::Decimal;
use serde::Serialize;

use super::address::PostalCode;

struct FeeBand {
  from: u32,
  to: u32,
  fee: u32,
}

const FEE_BANDS: [FeeBand; 5] = [
  FeeBand { from: 12_500_001, to: 12_505_001, fee: 3 },
  FeeBand { from: 12_505_002, to: 12_510_001, fee: 5 },
  FeeBand { from: 12_510_002, to: 12_515_001, fee: 10 },
  FeeBand { from: 12_515_002, to: 12_520_001, fee: 15 },
  FeeBand { from: 12_520_002, to: 12_524_999, fee: 20 },
];

/// Charged for any CEP outside every band.
pub const OUT_OF_AREA_FEE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
  pub fee: Decimal,
  pub out_of_delivery_area: bool,
}

fn reais(amount: u32) -> Decimal {
  Decimal::new(i64::from(amount) * 100, 2)
}

pub fn quote(postal_code: &PostalCode) -> ShippingQuote {
  let code = postal_code.numeric();
  match FEE_BANDS.iter().find(|band| (band.from..=band.to).contains(&code)) {
    Some(band) => ShippingQuote {
      fee: reais(band.fee),
      out_of_delivery_area: false,
    },
    None => ShippingQuote {
      fee: reais(OUT_OF_AREA_FEE),
      out_of_delivery_area: true,
    },
  }
}
