// hortifruti-server/src/store/mod.rs

//! Persistence seam. Every method is scoped the way the flows need it; the
//! multi-row transitions (placing, charging, reconciling and cancelling an
//! order) are single atomic calls.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hortifruti_core::domain::{Address, CartItem, Order, PaymentUpdate, PaymentUpdateOutcome, PixCharge, Product};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoredStock {
  pub product_id: Uuid,
  pub quantity: i32,
}

/// What a cancellation changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelReceipt {
  pub order: Order,
  pub restored: Vec<RestoredStock>,
  pub unresolved_products: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPaymentUpdate {
  pub order: Order,
  pub outcome: PaymentUpdateOutcome,
  /// Stock put back because the update cancelled the order.
  pub restored: Vec<RestoredStock>,
  pub unresolved_products: Vec<Uuid>,
}

#[async_trait]
pub trait Store: Send + Sync {
  // --- Catalog ---
  async fn list_products(&self) -> Result<Vec<Product>>;
  async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn insert_product(&self, product: &Product) -> Result<()>;

  // --- Cart ---
  async fn list_cart(&self, owner_user_id: &str) -> Result<Vec<CartItem>>;
  async fn find_cart_item_by_product(&self, owner_user_id: &str, product_id: Uuid) -> Result<Option<CartItem>>;
  async fn get_cart_item(&self, owner_user_id: &str, item_id: Uuid) -> Result<Option<CartItem>>;
  /// Inserts the line, or adds its quantity to the owner's existing line for
  /// the same product. Returns the stored line.
  async fn add_cart_quantity(&self, item: &CartItem) -> Result<CartItem>;
  async fn update_cart_quantity(&self, owner_user_id: &str, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  async fn delete_cart_item(&self, owner_user_id: &str, item_id: Uuid) -> Result<bool>;
  async fn clear_cart(&self, owner_user_id: &str) -> Result<u64>;

  // --- Addresses ---
  async fn list_addresses(&self, owner_user_id: &str) -> Result<Vec<Address>>;
  async fn get_address(&self, id: Uuid) -> Result<Option<Address>>;
  async fn insert_address(&self, address: &Address) -> Result<()>;
  async fn delete_address(&self, owner_user_id: &str, id: Uuid) -> Result<bool>;

  // --- Orders ---
  /// Persists a new order and takes its quantities out of stock. Fails with
  /// nothing written when a product has fewer units than its line. Returns
  /// the line products that do not exist.
  async fn place_order(&self, order: &Order) -> Result<Vec<Uuid>>;
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
  async fn find_order_by_reference(&self, external_reference: &str) -> Result<Option<Order>>;
  async fn list_orders(&self, owner_user_id: &str) -> Result<Vec<Order>>;
  async fn record_pix_charge(&self, order_id: Uuid, charge: &PixCharge, at: DateTime<Utc>) -> Result<Order>;
  /// `None` when no order carries `external_reference`. An update that
  /// cancels the order puts its quantities back in stock.
  async fn apply_payment_update(
    &self,
    external_reference: &str,
    update: &PaymentUpdate,
  ) -> Result<Option<AppliedPaymentUpdate>>;
  /// Flips a pending order to cancelled and puts its quantities back in stock.
  async fn cancel_order(&self, order_id: Uuid, at: DateTime<Utc>) -> Result<CancelReceipt>;

  // --- Webhook idempotency ---
  async fn is_notification_processed(&self, payment_id: &str, provider_status: &str) -> Result<bool>;
  async fn mark_notification_processed(&self, payment_id: &str, provider_status: &str, at: DateTime<Utc>) -> Result<()>;
}
