// hortifruti-core/src/domain/cart.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::error::DomainError;
use super::pricing;
use super::product::Product;

pub fn validate_quantity(quantity: i32) -> Result<i32, DomainError> {
  if quantity < 1 {
    return Err(DomainError::InvalidQuantity(quantity));
  }
  Ok(quantity)
}

/// One product line in a user's cart. Price, name and supplier are copied
/// from the product when the line is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  pub owner_user_id: String,
  pub product_id: Uuid,
  pub name: String,
  pub image_url: Option<String>,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub supplier_name: String,
  pub added_at: DateTime<Utc>,
}

impl CartItem {
  pub fn from_product(
    owner_user_id: &str,
    product: &Product,
    quantity: i32,
    now: DateTime<Utc>,
  ) -> Result<Self, DomainError> {
    Ok(Self {
      id: Uuid::new_v4(),
      owner_user_id: owner_user_id.to_string(),
      product_id: product.id,
      name: product.name.clone(),
      image_url: product.image_url.clone(),
      unit_price: product.price,
      quantity: validate_quantity(quantity)?,
      supplier_name: product.supplier_name.clone(),
      added_at: now,
    })
  }

  pub fn set_quantity(&mut self, quantity: i32) -> Result<(), DomainError> {
    self.quantity = validate_quantity(quantity)?;
    Ok(())
  }

  pub fn line_total(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }
}

/// Frozen copy of a cart line inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub product_id: Uuid,
  pub name: String,
  pub image_url: Option<String>,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub supplier_name: String,
}

impl From<&CartItem> for LineItem {
  fn from(item: &CartItem) -> Self {
    Self {
      product_id: item.product_id,
      name: item.name.clone(),
      image_url: item.image_url.clone(),
      unit_price: item.unit_price,
      quantity: item.quantity,
      supplier_name: item.supplier_name.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierGroup {
  pub supplier_name: String,
  pub items: Vec<CartItem>,
  pub subtotal: Decimal,
}

/// Cart as shown to the buyer: lines grouped per supplier, alphabetically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
  pub groups: Vec<SupplierGroup>,
  pub item_count: usize,
  pub subtotal: Decimal,
  /// Shipping is only known once an address is picked at checkout.
  pub service_fee: Decimal,
}

impl CartSummary {
  pub fn from_items(items: Vec<CartItem>) -> Self {
    let item_count = items.len();
    let subtotal = pricing::subtotal(items.iter().map(|i| (i.unit_price, i.quantity)));

    let mut by_supplier: BTreeMap<String, Vec<CartItem>> = BTreeMap::new();
    for item in items {
      by_supplier.entry(item.supplier_name.clone()).or_default().push(item);
    }
    let groups = by_supplier
      .into_iter()
      .map(|(supplier_name, items)| SupplierGroup {
        subtotal: pricing::subtotal(items.iter().map(|i| (i.unit_price, i.quantity))),
        supplier_name,
        items,
      })
      .collect();

    Self {
      groups,
      item_count,
      subtotal,
      service_fee: pricing::service_fee(subtotal),
    }
  }
}
