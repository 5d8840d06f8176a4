// hortifruti-core/src/domain/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::address::Address;
use super::cart::{CartItem, LineItem};
use super::error::DomainError;
use super::pricing::{self, OrderTotals};
use super::shipping::ShippingQuote;

/// Lifecycle of an order: `pending` moves once, to `approved` or `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OrderStatus {
  Pending,
  Approved,
  Cancelled,
}

impl OrderStatus {
  /// Lenient reader. Older records and clients spell statuses in Portuguese,
  /// with spaces or underscores, in any case.
  pub fn parse(raw: &str) -> Result<Self, DomainError> {
    let normalized: String = raw
      .trim()
      .to_lowercase()
      .chars()
      .map(|c| if c == ' ' || c == '-' { '_' } else { c })
      .collect();

    match normalized.as_str() {
      "pending" | "pendente" | "aguardando_pagamento" | "aguardando" | "in_process" => Ok(Self::Pending),
      "approved" | "aprovado" | "pago" | "paid" => Ok(Self::Approved),
      "cancelled" | "canceled" | "cancelado" => Ok(Self::Cancelled),
      _ => Err(DomainError::UnknownStatus(raw.to_string())),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(&self) -> bool {
    !matches!(self, Self::Pending)
  }

  /// Maps a payment provider status onto the order lifecycle.
  pub fn from_provider(provider_status: &str) -> Self {
    match provider_status.trim().to_lowercase().as_str() {
      "approved" => Self::Approved,
      "rejected" | "cancelled" | "refunded" | "charged_back" | "expired" => Self::Cancelled,
      _ => Self::Pending,
    }
  }
}

impl TryFrom<String> for OrderStatus {
  type Error = DomainError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Pix,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pix => "pix",
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_lowercase().as_str() {
      "pix" => Some(Self::Pix),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub external_reference: String,
  pub owner_user_id: String,
  pub supplier_names: Vec<String>,
  pub line_items: Vec<LineItem>,
  pub shipping_address: Address,
  pub subtotal: Decimal,
  pub service_fee: Decimal,
  pub shipping_fee: Decimal,
  pub total: Decimal,
  pub out_of_delivery_area: bool,
  pub payment_method: PaymentMethod,
  pub status: OrderStatus,
  pub payment_status: Option<String>,
  pub created_at: DateTime<Utc>,
  pub approved_at: Option<DateTime<Utc>>,
  pub status_updated_at: Option<DateTime<Utc>>,
  pub pix_qr_code: Option<String>,
  pub pix_qr_code_base64: Option<String>,
  pub payment_id: Option<String>,
}

/// A payment state reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
  pub payment_id: String,
  pub provider_status: String,
  pub at: DateTime<Utc>,
}

impl PaymentUpdate {
  pub fn order_status(&self) -> OrderStatus {
    OrderStatus::from_provider(&self.provider_status)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentUpdateOutcome {
  Applied { status: OrderStatus },
  /// The order had already left `pending`; nothing was touched.
  AlreadyFinal { status: OrderStatus },
  /// The update belongs to a charge that a newer one replaced; nothing was touched.
  Superseded,
}

/// A freshly created PIX charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixCharge {
  pub payment_id: String,
  pub provider_status: String,
  pub qr_code: String,
  pub qr_code_base64: String,
}

pub fn new_external_reference() -> String {
  format!("hf-{}", Uuid::new_v4().simple())
}

impl Order {
  /// Freezes the cart and address into a new pending order.
  pub fn assemble(
    owner_user_id: &str,
    items: &[CartItem],
    shipping_address: Address,
    quote: ShippingQuote,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
  ) -> Result<Self, DomainError> {
    if items.is_empty() {
      return Err(DomainError::EmptyCart);
    }

    let subtotal = pricing::subtotal(items.iter().map(|i| (i.unit_price, i.quantity)));
    let totals = OrderTotals::compute(subtotal, quote.fee);
    let supplier_names: BTreeSet<String> = items.iter().map(|i| i.supplier_name.clone()).collect();

    Ok(Self {
      id: Uuid::new_v4(),
      external_reference: new_external_reference(),
      owner_user_id: owner_user_id.to_string(),
      supplier_names: supplier_names.into_iter().collect(),
      line_items: items.iter().map(LineItem::from).collect(),
      shipping_address,
      subtotal: totals.subtotal,
      service_fee: totals.service_fee,
      shipping_fee: totals.shipping_fee,
      total: totals.total,
      out_of_delivery_area: quote.out_of_delivery_area,
      payment_method,
      status: OrderStatus::Pending,
      payment_status: None,
      created_at: now,
      approved_at: None,
      status_updated_at: None,
      pix_qr_code: None,
      pix_qr_code_base64: None,
      payment_id: None,
    })
  }

  pub fn totals(&self) -> OrderTotals {
    OrderTotals {
      subtotal: self.subtotal,
      service_fee: self.service_fee,
      shipping_fee: self.shipping_fee,
      total: self.total,
    }
  }

  /// Writes a new charge onto a pending order. The lifecycle status is left
  /// to the webhook.
  pub fn record_pix_charge(&mut self, charge: &PixCharge, at: DateTime<Utc>) -> Result<(), DomainError> {
    if self.status.is_terminal() {
      return Err(DomainError::IllegalTransition {
        from: self.status,
        to: OrderStatus::Pending,
      });
    }
    self.pix_qr_code = Some(charge.qr_code.clone());
    self.pix_qr_code_base64 = Some(charge.qr_code_base64.clone());
    self.payment_id = Some(charge.payment_id.clone());
    self.payment_status = Some(charge.provider_status.clone());
    self.status_updated_at = Some(at);
    Ok(())
  }

  pub fn apply_payment_update(&mut self, update: &PaymentUpdate) -> PaymentUpdateOutcome {
    if self.status.is_terminal() {
      return PaymentUpdateOutcome::AlreadyFinal { status: self.status };
    }
    if self.payment_id.as_deref().is_some_and(|current| current != update.payment_id) {
      return PaymentUpdateOutcome::Superseded;
    }

    let status = update.order_status();
    self.status = status;
    self.payment_status = Some(update.provider_status.clone());
    self.status_updated_at = Some(update.at);
    if self.payment_id.is_none() {
      self.payment_id = Some(update.payment_id.clone());
    }
    if status == OrderStatus::Approved {
      self.approved_at = Some(update.at);
    }
    PaymentUpdateOutcome::Applied { status }
  }

  pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
    if self.status != OrderStatus::Pending {
      return Err(DomainError::IllegalTransition {
        from: self.status,
        to: OrderStatus::Cancelled,
      });
    }
    self.status = OrderStatus::Cancelled;
    self.status_updated_at = Some(at);
    Ok(())
  }
}
