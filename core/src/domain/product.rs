// hortifruti-core/src/domain/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub supplier_id: Uuid,
  pub supplier_name: String,
  pub name: String,
  pub category: String,
  pub price: Decimal,
  pub stock: i32,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Product {
  pub fn ensure_available(&self, quantity: i32) -> Result<(), DomainError> {
    if quantity > self.stock {
      return Err(DomainError::InsufficientStock {
        product: self.name.clone(),
        available: self.stock,
        requested: quantity,
      });
    }
    Ok(())
  }

  /// Takes `quantity` units out of stock. Fails, leaving stock untouched,
  /// when fewer units are on hand.
  pub fn take_stock(&mut self, quantity: i32) -> Result<(), DomainError> {
    self.ensure_available(quantity)?;
    self.stock -= quantity;
    Ok(())
  }

  pub fn restock(&mut self, quantity: i32) {
    self.stock = self.stock.saturating_add(quantity);
  }
}
