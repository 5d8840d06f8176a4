// hortifruti-server/src/store/memory.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hortifruti_core::domain::{
  Address, CartItem, Order, OrderStatus, PaymentUpdate, PaymentUpdateOutcome, PixCharge, Product,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;
use uuid::Uuid;

use super::{AppliedPaymentUpdate, CancelReceipt, RestoredStock, Store};
use crate::errors::{AppError, Result};

#[derive(Default)]
struct MemoryData {
  products: HashMap<Uuid, Product>,
  cart_items: Vec<CartItem>,
  addresses: Vec<Address>,
  orders: HashMap<Uuid, Order>,
  processed_notifications: HashSet<(String, String)>,
}

/// Store kept in process memory. Every mutation takes the single write lock,
/// so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
  data: RwLock<MemoryData>,
  fail_order_inserts: AtomicBool,
  fail_cart_clears: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes `place_order` fail, to exercise checkout error paths.
  pub fn set_fail_order_inserts(&self, fail: bool) {
    self.fail_order_inserts.store(fail, Ordering::SeqCst);
  }

  /// Makes `clear_cart` fail, to exercise checkout error paths.
  pub fn set_fail_cart_clears(&self, fail: bool) {
    self.fail_cart_clears.store(fail, Ordering::SeqCst);
  }

  pub fn product_stock(&self, id: Uuid) -> Option<i32> {
    self.data.read().products.get(&id).map(|p| p.stock)
  }
}

fn order_not_found(id: Uuid) -> AppError {
  AppError::NotFound(format!("Order {} not found.", id))
}

fn restock_lines(products: &mut HashMap<Uuid, Product>, order: &Order) -> (Vec<RestoredStock>, Vec<Uuid>) {
  let mut restored = Vec::new();
  let mut unresolved_products = Vec::new();
  for line in &order.line_items {
    match products.get_mut(&line.product_id) {
      Some(product) => {
        product.restock(line.quantity);
        restored.push(RestoredStock {
          product_id: line.product_id,
          quantity: line.quantity,
        });
      }
      None => {
        warn!(order_id = %order.id, product_id = %line.product_id, "Cannot restock unknown product.");
        unresolved_products.push(line.product_id);
      }
    }
  }
  (restored, unresolved_products)
}

#[async_trait]
impl Store for MemoryStore {
  async fn list_products(&self) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self.data.read().products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.data.read().products.get(&id).cloned())
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    self.data.write().products.insert(product.id, product.clone());
    Ok(())
  }

  async fn list_cart(&self, owner_user_id: &str) -> Result<Vec<CartItem>> {
    let data = self.data.read();
    let mut items: Vec<CartItem> = data
      .cart_items
      .iter()
      .filter(|i| i.owner_user_id == owner_user_id)
      .cloned()
      .collect();
    items.sort_by_key(|i| i.added_at);
    Ok(items)
  }

  async fn find_cart_item_by_product(&self, owner_user_id: &str, product_id: Uuid) -> Result<Option<CartItem>> {
    Ok(
      self
        .data
        .read()
        .cart_items
        .iter()
        .find(|i| i.owner_user_id == owner_user_id && i.product_id == product_id)
        .cloned(),
    )
  }

  async fn get_cart_item(&self, owner_user_id: &str, item_id: Uuid) -> Result<Option<CartItem>> {
    Ok(
      self
        .data
        .read()
        .cart_items
        .iter()
        .find(|i| i.id == item_id && i.owner_user_id == owner_user_id)
        .cloned(),
    )
  }

  async fn add_cart_quantity(&self, item: &CartItem) -> Result<CartItem> {
    let mut data = self.data.write();
    match data
      .cart_items
      .iter_mut()
      .find(|i| i.owner_user_id == item.owner_user_id && i.product_id == item.product_id)
    {
      Some(existing) => {
        existing.set_quantity(existing.quantity.saturating_add(item.quantity))?;
        Ok(existing.clone())
      }
      None => {
        data.cart_items.push(item.clone());
        Ok(item.clone())
      }
    }
  }

  async fn update_cart_quantity(&self, owner_user_id: &str, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut data = self.data.write();
    let Some(item) = data
      .cart_items
      .iter_mut()
      .find(|i| i.id == item_id && i.owner_user_id == owner_user_id)
    else {
      return Ok(None);
    };
    item.set_quantity(quantity)?;
    Ok(Some(item.clone()))
  }

  async fn delete_cart_item(&self, owner_user_id: &str, item_id: Uuid) -> Result<bool> {
    let mut data = self.data.write();
    let before = data.cart_items.len();
    data
      .cart_items
      .retain(|i| !(i.id == item_id && i.owner_user_id == owner_user_id));
    Ok(data.cart_items.len() != before)
  }

  async fn clear_cart(&self, owner_user_id: &str) -> Result<u64> {
    if self.fail_cart_clears.load(Ordering::SeqCst) {
      return Err(AppError::Internal("cart clear failed (simulated)".to_string()));
    }
    let mut data = self.data.write();
    let before = data.cart_items.len();
    data.cart_items.retain(|i| i.owner_user_id != owner_user_id);
    Ok((before - data.cart_items.len()) as u64)
  }

  async fn list_addresses(&self, owner_user_id: &str) -> Result<Vec<Address>> {
    Ok(
      self
        .data
        .read()
        .addresses
        .iter()
        .filter(|a| a.owner_user_id == owner_user_id)
        .cloned()
        .collect(),
    )
  }

  async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
    Ok(self.data.read().addresses.iter().find(|a| a.id == id).cloned())
  }

  async fn insert_address(&self, address: &Address) -> Result<()> {
    self.data.write().addresses.push(address.clone());
    Ok(())
  }

  async fn delete_address(&self, owner_user_id: &str, id: Uuid) -> Result<bool> {
    let mut data = self.data.write();
    let before = data.addresses.len();
    data.addresses.retain(|a| !(a.id == id && a.owner_user_id == owner_user_id));
    Ok(data.addresses.len() != before)
  }

  async fn place_order(&self, order: &Order) -> Result<Vec<Uuid>> {
    if self.fail_order_inserts.load(Ordering::SeqCst) {
      return Err(AppError::Internal("order insert failed (simulated)".to_string()));
    }
    let mut data = self.data.write();
    // Check every line against a scratch copy first so a short line writes nothing.
    let mut taken: HashMap<Uuid, Product> = HashMap::new();
    let mut unknown = Vec::new();
    for line in &order.line_items {
      let Some(product) = data.products.get(&line.product_id) else {
        unknown.push(line.product_id);
        continue;
      };
      taken
        .entry(line.product_id)
        .or_insert_with(|| product.clone())
        .take_stock(line.quantity)?;
    }
    data.products.extend(taken);
    data.orders.insert(order.id, order.clone());
    Ok(unknown)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.data.read().orders.get(&id).cloned())
  }

  async fn find_order_by_reference(&self, external_reference: &str) -> Result<Option<Order>> {
    Ok(
      self
        .data
        .read()
        .orders
        .values()
        .find(|o| o.external_reference == external_reference)
        .cloned(),
    )
  }

  async fn list_orders(&self, owner_user_id: &str) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .data
      .read()
      .orders
      .values()
      .filter(|o| o.owner_user_id == owner_user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn record_pix_charge(&self, order_id: Uuid, charge: &PixCharge, at: DateTime<Utc>) -> Result<Order> {
    let mut data = self.data.write();
    let order = data.orders.get_mut(&order_id).ok_or_else(|| order_not_found(order_id))?;
    order.record_pix_charge(charge, at)?;
    Ok(order.clone())
  }

  async fn apply_payment_update(
    &self,
    external_reference: &str,
    update: &PaymentUpdate,
  ) -> Result<Option<AppliedPaymentUpdate>> {
    let mut data = self.data.write();
    let MemoryData { orders, products, .. } = &mut *data;
    let Some(order) = orders.values_mut().find(|o| o.external_reference == external_reference) else {
      return Ok(None);
    };
    let outcome = order.apply_payment_update(update);
    let (restored, unresolved_products) = match outcome {
      PaymentUpdateOutcome::Applied {
        status: OrderStatus::Cancelled,
      } => restock_lines(products, order),
      _ => (Vec::new(), Vec::new()),
    };
    Ok(Some(AppliedPaymentUpdate {
      order: order.clone(),
      outcome,
      restored,
      unresolved_products,
    }))
  }

  async fn cancel_order(&self, order_id: Uuid, at: DateTime<Utc>) -> Result<CancelReceipt> {
    let mut data = self.data.write();
    let order = data.orders.get_mut(&order_id).ok_or_else(|| order_not_found(order_id))?;
    order.cancel(at)?;
    let order = order.clone();
    let (restored, unresolved_products) = restock_lines(&mut data.products, &order);
    Ok(CancelReceipt {
      order,
      restored,
      unresolved_products,
    })
  }

  async fn is_notification_processed(&self, payment_id: &str, provider_status: &str) -> Result<bool> {
    Ok(
      self
        .data
        .read()
        .processed_notifications
        .contains(&(payment_id.to_string(), provider_status.to_string())),
    )
  }

  async fn mark_notification_processed(&self, payment_id: &str, provider_status: &str, _at: DateTime<Utc>) -> Result<()> {
    self
      .data
      .write()
      .processed_notifications
      .insert((payment_id.to_string(), provider_status.to_string()));
    Ok(())
  }
}
