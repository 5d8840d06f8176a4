// tests/shipping_tests.rs
mod common;

use common::dec;
use hortifruti_core::domain::shipping::{quote, OUT_OF_AREA_FEE};
use hortifruti_core::domain::PostalCode;
use rust_decimal::Decimal;

fn fee_for(code: u32) -> (Decimal, bool) {
  let q = quote(&PostalCode::parse(&format!("{code:08}")).unwrap());
  (q.fee, q.out_of_delivery_area)
}

#[test]
fn test_band_boundaries() {
  assert_eq!(fee_for(12_500_001), (dec("3"), false));
  assert_eq!(fee_for(12_505_001), (dec("3"), false));
  assert_eq!(fee_for(12_505_002), (dec("5"), false));
  assert_eq!(fee_for(12_510_001), (dec("5"), false));
  assert_eq!(fee_for(12_510_002), (dec("10"), false));
  assert_eq!(fee_for(12_515_001), (dec("10"), false));
  assert_eq!(fee_for(12_515_002), (dec("15"), false));
  assert_eq!(fee_for(12_520_001), (dec("15"), false));
  assert_eq!(fee_for(12_520_002), (dec("20"), false));
  assert_eq!(fee_for(12_524_999), (dec("20"), false));
}

#[test]
fn test_outside_every_band_is_flagged() {
  for code in [12_500_000, 12_525_000, 1_001_000, 99_999_999, 0] {
    assert_eq!(fee_for(code), (Decimal::from(OUT_OF_AREA_FEE), true), "code {code:08}");
  }
}

#[test]
fn test_every_code_in_the_delivery_area_gets_its_band_fee() {
  for code in 12_500_001u32..=12_524_999 {
    let expected = match code {
      12_500_001..=12_505_001 => 3,
      12_505_002..=12_510_001 => 5,
      12_510_002..=12_515_001 => 10,
      12_515_002..=12_520_001 => 15,
      _ => 20,
    };
    assert_eq!(fee_for(code), (Decimal::from(expected), false), "code {code}");
  }
}

#[test]
fn test_formatted_input_is_accepted() {
  let q = quote(&PostalCode::parse("12.510-500").unwrap());
  assert_eq!(q.fee, dec("10"));
  assert!(!q.out_of_delivery_area);
}
