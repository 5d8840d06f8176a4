// tests/order_tests.rs
mod common;

use common::*;
use hortifruti_core::domain::shipping;
use hortifruti_core::domain::{
  DomainError, Order, OrderStatus, PaymentMethod, PaymentUpdate, PaymentUpdateOutcome, PixCharge,
};

fn pending_order() -> Order {
  let items = vec![
    cart_item("Banana", "Sítio Boa Vista", "10.00", 2),
    cart_item("Alface", "Horta do Zé", "5.00", 1),
    cart_item("Tomate", "Horta do Zé", "7.50", 1),
  ];
  let address = address("12505-500");
  let quote = shipping::quote(&address.postal_code);
  Order::assemble(BUYER, &items, address, quote, PaymentMethod::Pix, fixed_now()).unwrap()
}

fn update(provider_status: &str) -> PaymentUpdate {
  PaymentUpdate {
    payment_id: "98765".to_string(),
    provider_status: provider_status.to_string(),
    at: fixed_now() + chrono::Duration::minutes(5),
  }
}

#[test]
fn test_assemble_snapshots_cart_and_totals() {
  let order = pending_order();

  assert!(order.external_reference.starts_with("hf-"));
  assert_eq!(order.external_reference.len(), 35);
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.supplier_names, vec!["Horta do Zé", "Sítio Boa Vista"]);
  assert_eq!(order.line_items.len(), 3);
  assert_eq!(order.line_items[0].name, "Banana");
  assert_eq!(order.subtotal, dec("32.50"));
  assert_eq!(order.service_fee, dec("0.65"));
  assert_eq!(order.shipping_fee, dec("5"));
  assert_eq!(order.total, dec("38.15"));
  assert!(!order.out_of_delivery_area);
  assert_eq!(order.approved_at, None);
}

#[test]
fn test_assemble_rejects_empty_cart() {
  let address = address("12500001");
  let quote = shipping::quote(&address.postal_code);
  let result = Order::assemble(BUYER, &[], address, quote, PaymentMethod::Pix, fixed_now());
  assert_eq!(result.unwrap_err(), DomainError::EmptyCart);
}

#[test]
fn test_external_references_are_unique() {
  assert_ne!(pending_order().external_reference, pending_order().external_reference);
}

#[test]
fn test_status_parse_is_lenient() {
  for raw in ["pending", "Pendente", "aguardando pagamento", "AGUARDANDO_PAGAMENTO", "in_process"] {
    assert_eq!(OrderStatus::parse(raw), Ok(OrderStatus::Pending), "{raw}");
  }
  for raw in ["approved", "Aprovado", "pago"] {
    assert_eq!(OrderStatus::parse(raw), Ok(OrderStatus::Approved), "{raw}");
  }
  for raw in ["cancelled", "canceled", "CANCELADO"] {
    assert_eq!(OrderStatus::parse(raw), Ok(OrderStatus::Cancelled), "{raw}");
  }
  assert!(matches!(OrderStatus::parse("shipped"), Err(DomainError::UnknownStatus(_))));
}

#[test]
fn test_status_serializes_canonically() {
  let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
  assert_eq!(json, "\"cancelled\"");
  let parsed: OrderStatus = serde_json::from_str("\"Aguardando Pagamento\"").unwrap();
  assert_eq!(parsed, OrderStatus::Pending);
  assert!(serde_json::from_str::<OrderStatus>("\"lost\"").is_err());
}

#[test]
fn test_provider_status_mapping() {
  assert_eq!(OrderStatus::from_provider("approved"), OrderStatus::Approved);
  for status in ["rejected", "cancelled", "refunded", "charged_back", "expired"] {
    assert_eq!(OrderStatus::from_provider(status), OrderStatus::Cancelled, "{status}");
  }
  for status in ["pending", "in_process", "authorized", "in_mediation", "whatever"] {
    assert_eq!(OrderStatus::from_provider(status), OrderStatus::Pending, "{status}");
  }
}

#[test]
fn test_approved_update_sets_approved_at() {
  let mut order = pending_order();
  let outcome = order.apply_payment_update(&update("approved"));

  assert_eq!(outcome, PaymentUpdateOutcome::Applied { status: OrderStatus::Approved });
  assert_eq!(order.status, OrderStatus::Approved);
  assert_eq!(order.payment_status.as_deref(), Some("approved"));
  assert_eq!(order.payment_id.as_deref(), Some("98765"));
  assert_eq!(order.approved_at, Some(update("approved").at));
  assert_eq!(order.status_updated_at, order.approved_at);
}

#[test]
fn test_pending_update_only_touches_payment_fields() {
  let mut order = pending_order();
  let outcome = order.apply_payment_update(&update("in_process"));

  assert_eq!(outcome, PaymentUpdateOutcome::Applied { status: OrderStatus::Pending });
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.payment_status.as_deref(), Some("in_process"));
  assert!(order.status_updated_at.is_some());
  assert_eq!(order.approved_at, None);
}

#[test]
fn test_terminal_orders_ignore_payment_updates() {
  let mut order = pending_order();
  order.cancel(fixed_now()).unwrap();
  let snapshot = order.clone();

  let outcome = order.apply_payment_update(&update("approved"));
  assert_eq!(outcome, PaymentUpdateOutcome::AlreadyFinal { status: OrderStatus::Cancelled });
  assert_eq!(order, snapshot);
}

#[test]
fn test_cancel_only_from_pending() {
  let mut order = pending_order();
  order.cancel(fixed_now()).unwrap();
  assert_eq!(order.status, OrderStatus::Cancelled);
  assert_eq!(order.status_updated_at, Some(fixed_now()));

  let mut approved = pending_order();
  approved.apply_payment_update(&update("approved"));
  let snapshot = approved.clone();
  assert_eq!(
    approved.cancel(fixed_now()),
    Err(DomainError::IllegalTransition {
      from: OrderStatus::Approved,
      to: OrderStatus::Cancelled
    })
  );
  assert_eq!(approved, snapshot);
}

#[test]
fn test_record_pix_charge() {
  let charge = PixCharge {
    payment_id: "123456".to_string(),
    provider_status: "pending".to_string(),
    qr_code: "00020126...".to_string(),
    qr_code_base64: "iVBORw0KGgo=".to_string(),
  };
  let mut order = pending_order();
  order.record_pix_charge(&charge, fixed_now()).unwrap();

  assert_eq!(order.pix_qr_code.as_deref(), Some("00020126..."));
  assert_eq!(order.pix_qr_code_base64.as_deref(), Some("iVBORw0KGgo="));
  assert_eq!(order.payment_id.as_deref(), Some("123456"));
  assert_eq!(order.payment_status.as_deref(), Some("pending"));
  assert_eq!(order.status, OrderStatus::Pending);

  let mut cancelled = pending_order();
  cancelled.cancel(fixed_now()).unwrap();
  assert!(cancelled.record_pix_charge(&charge, fixed_now()).is_err());
  assert_eq!(cancelled.pix_qr_code, None);
}

#[test]
fn test_order_round_trips_through_json() {
  let order = pending_order();
  let json = serde_json::to_value(&order).unwrap();
  assert_eq!(json["status"], "pending");
  assert_eq!(json["payment_method"], "pix");
  assert_eq!(json["total"], "38.15");
  assert_eq!(json["shipping_address"]["postal_code"], "12505500");

  let back: Order = serde_json::from_value(json).unwrap();
  assert_eq!(back, order);
}

#[test]
fn test_update_for_replaced_charge_is_ignored() {
  let charge = |payment_id: &str| PixCharge {
    payment_id: payment_id.to_string(),
    provider_status: "pending".to_string(),
    qr_code: "00020126...".to_string(),
    qr_code_base64: "iVBORw0KGgo=".to_string(),
  };
  let mut order = pending_order();
  order.record_pix_charge(&charge("111"), fixed_now()).unwrap();
  order.record_pix_charge(&charge("222"), fixed_now()).unwrap();
  let snapshot = order.clone();

  let stale = PaymentUpdate {
    payment_id: "111".to_string(),
    ..update("expired")
  };
  assert_eq!(order.apply_payment_update(&stale), PaymentUpdateOutcome::Superseded);
  assert_eq!(order, snapshot);

  let live = PaymentUpdate {
    payment_id: "222".to_string(),
    ..update("approved")
  };
  assert_eq!(
    order.apply_payment_update(&live),
    PaymentUpdateOutcome::Applied { status: OrderStatus::Approved }
  );
}
