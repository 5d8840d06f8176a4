// hortifruti-core/src/domain/error.rs
use thiserror::Error;

use super::order::OrderStatus;

/// Broken business rules. The server maps these onto client-facing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
  #[error("postal code must have exactly 8 digits, got '{0}'")]
  InvalidPostalCode(String),

  #[error("tax id (CPF) must be exactly 11 digits")]
  InvalidTaxId,

  #[error("quantity must be at least 1, got {0}")]
  InvalidQuantity(i32),

  #[error("only {available} unit(s) of {product} in stock, {requested} requested")]
  InsufficientStock { product: String, available: i32, requested: i32 },

  #[error("cart is empty")]
  EmptyCart,

  #[error("unknown order status '{0}'")]
  UnknownStatus(String),

  #[error("order is {from}, it cannot become {to}")]
  IllegalTransition { from: OrderStatus, to: OrderStatus },

  #[error("state must be a two-letter code, got '{0}'")]
  InvalidState(String),

  #[error("{field} is required")]
  MissingField { field: &'static str },
}
