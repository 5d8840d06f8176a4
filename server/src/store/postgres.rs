// hortifruti-server/src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hortifruti_core::domain::{
  Address, CartItem, DomainError, LineItem, Order, OrderStatus, PaymentMethod, PaymentUpdate, PaymentUpdateOutcome,
  PixCharge, PostalCode, Product,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{AppliedPaymentUpdate, CancelReceipt, RestoredStock, Store};
use crate::errors::{AppError, Result};

const ORDER_COLUMNS: &str = "id, external_reference, owner_user_id, supplier_names, line_items, shipping_address, \
  subtotal, service_fee, shipping_fee, total, out_of_delivery_area, payment_method, status, payment_status, \
  created_at, approved_at, status_updated_at, pix_qr_code, pix_qr_code_base64, payment_id";

const PRODUCT_COLUMNS: &str = "id, supplier_id, supplier_name, name, category, price, stock, image_url, created_at";

const CART_COLUMNS: &str =
  "id, owner_user_id, product_id, name, image_url, unit_price, quantity, supplier_name, added_at";

const ADDRESS_COLUMNS: &str =
  "id, owner_user_id, postal_code, street, number, neighborhood, city, state, created_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Database(sqlx::Error::Migrate(Box::new(e))))?;
    info!("Database migrations applied.");
    Ok(())
  }
}

// --- Rows ---

#[derive(Debug, FromRow)]
struct ProductRow {
  id: Uuid,
  supplier_id: Uuid,
  supplier_name: String,
  name: String,
  category: String,
  price: Decimal,
  stock: i32,
  image_url: Option<String>,
  created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      supplier_id: row.supplier_id,
      supplier_name: row.supplier_name,
      name: row.name,
      category: row.category,
      price: row.price,
      stock: row.stock,
      image_url: row.image_url,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct CartItemRow {
  id: Uuid,
  owner_user_id: String,
  product_id: Uuid,
  name: String,
  image_url: Option<String>,
  unit_price: Decimal,
  quantity: i32,
  supplier_name: String,
  added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
  fn from(row: CartItemRow) -> Self {
    CartItem {
      id: row.id,
      owner_user_id: row.owner_user_id,
      product_id: row.product_id,
      name: row.name,
      image_url: row.image_url,
      unit_price: row.unit_price,
      quantity: row.quantity,
      supplier_name: row.supplier_name,
      added_at: row.added_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct AddressRow {
  id: Uuid,
  owner_user_id: String,
  postal_code: String,
  street: String,
  number: String,
  neighborhood: String,
  city: String,
  state: String,
  created_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
  type Error = AppError;

  fn try_from(row: AddressRow) -> Result<Self> {
    let postal_code = PostalCode::parse(&row.postal_code)
      .map_err(|e| AppError::Internal(format!("address {} has a bad postal code: {}", row.id, e)))?;
    Ok(Address {
      id: row.id,
      owner_user_id: row.owner_user_id,
      postal_code,
      street: row.street,
      number: row.number,
      neighborhood: row.neighborhood,
      city: row.city,
      state: row.state,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  external_reference: String,
  owner_user_id: String,
  supplier_names: Json<Vec<String>>,
  line_items: Json<Vec<LineItem>>,
  shipping_address: Json<Address>,
  subtotal: Decimal,
  service_fee: Decimal,
  shipping_fee: Decimal,
  total: Decimal,
  out_of_delivery_area: bool,
  payment_method: String,
  status: String,
  payment_status: Option<String>,
  created_at: DateTime<Utc>,
  approved_at: Option<DateTime<Utc>>,
  status_updated_at: Option<DateTime<Utc>>,
  pix_qr_code: Option<String>,
  pix_qr_code_base64: Option<String>,
  payment_id: Option<String>,
}

impl TryFrom<OrderRow> for Order {
  type Error = AppError;

  fn try_from(row: OrderRow) -> Result<Self> {
    let status = OrderStatus::parse(&row.status)
      .map_err(|e| AppError::Internal(format!("order {} has a bad status: {}", row.id, e)))?;
    let payment_method = PaymentMethod::parse(&row.payment_method).ok_or_else(|| {
      AppError::Internal(format!("order {} has an unknown payment method '{}'", row.id, row.payment_method))
    })?;
    Ok(Order {
      id: row.id,
      external_reference: row.external_reference,
      owner_user_id: row.owner_user_id,
      supplier_names: row.supplier_names.0,
      line_items: row.line_items.0,
      shipping_address: row.shipping_address.0,
      subtotal: row.subtotal,
      service_fee: row.service_fee,
      shipping_fee: row.shipping_fee,
      total: row.total,
      out_of_delivery_area: row.out_of_delivery_area,
      payment_method,
      status,
      payment_status: row.payment_status,
      created_at: row.created_at,
      approved_at: row.approved_at,
      status_updated_at: row.status_updated_at,
      pix_qr_code: row.pix_qr_code,
      pix_qr_code_base64: row.pix_qr_code_base64,
      payment_id: row.payment_id,
    })
  }
}

fn order_not_found(id: Uuid) -> AppError {
  AppError::NotFound(format!("Order {} not found.", id))
}

async fn lock_order(conn: &mut PgConnection, filter: &str, value: &str) -> Result<Option<Order>> {
  let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} FOR UPDATE");
  let row: Option<OrderRow> = sqlx::query_as(&sql).bind(value).fetch_optional(conn).await?;
  row.map(Order::try_from).transpose()
}

/// Writes back the columns that may change after an order is placed.
async fn write_order_state(conn: &mut PgConnection, order: &Order) -> Result<()> {
  sqlx::query(
    "UPDATE orders SET status = $2, payment_status = $3, approved_at = $4, status_updated_at = $5, \
     pix_qr_code = $6, pix_qr_code_base64 = $7, payment_id = $8 WHERE id = $1",
  )
  .bind(order.id)
  .bind(order.status.as_str())
  .bind(&order.payment_status)
  .bind(order.approved_at)
  .bind(order.status_updated_at)
  .bind(&order.pix_qr_code)
  .bind(&order.pix_qr_code_base64)
  .bind(&order.payment_id)
  .execute(conn)
  .await?;
  Ok(())
}

async fn restock_lines(conn: &mut PgConnection, order: &Order) -> Result<(Vec<RestoredStock>, Vec<Uuid>)> {
  let mut restored = Vec::new();
  let mut unresolved_products = Vec::new();
  for line in &order.line_items {
    let result = sqlx::query(
      "UPDATE products SET stock = LEAST(stock::bigint + $1, 2147483647)::integer WHERE id = $2",
    )
    .bind(line.quantity)
    .bind(line.product_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
      warn!(order_id = %order.id, product_id = %line.product_id, "Cannot restock unknown product.");
      unresolved_products.push(line.product_id);
    } else {
      restored.push(RestoredStock {
        product_id: line.product_id,
        quantity: line.quantity,
      });
    }
  }
  Ok((restored, unresolved_products))
}

#[async_trait]
impl Store for PgStore {
  async fn list_products(&self) -> Result<Vec<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC");
    let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let row: Option<ProductRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
    Ok(row.map(Product::from))
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    sqlx::query(
      "INSERT INTO products (id, supplier_id, supplier_name, name, category, price, stock, image_url, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT (id) DO NOTHING",
    )
    .bind(product.id)
    .bind(product.supplier_id)
    .bind(&product.supplier_name)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.stock)
    .bind(&product.image_url)
    .bind(product.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn list_cart(&self, owner_user_id: &str) -> Result<Vec<CartItem>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE owner_user_id = $1 ORDER BY added_at ASC");
    let rows: Vec<CartItemRow> = sqlx::query_as(&sql).bind(owner_user_id).fetch_all(&self.pool).await?;
    Ok(rows.into_iter().map(CartItem::from).collect())
  }

  async fn find_cart_item_by_product(&self, owner_user_id: &str, product_id: Uuid) -> Result<Option<CartItem>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE owner_user_id = $1 AND product_id = $2");
    let row: Option<CartItemRow> = sqlx::query_as(&sql)
      .bind(owner_user_id)
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(CartItem::from))
  }

  async fn get_cart_item(&self, owner_user_id: &str, item_id: Uuid) -> Result<Option<CartItem>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE id = $1 AND owner_user_id = $2");
    let row: Option<CartItemRow> = sqlx::query_as(&sql)
      .bind(item_id)
      .bind(owner_user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(CartItem::from))
  }

  async fn add_cart_quantity(&self, item: &CartItem) -> Result<CartItem> {
    let sql = format!(
      "INSERT INTO cart_items (id, owner_user_id, product_id, name, image_url, unit_price, quantity, supplier_name, added_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
       ON CONFLICT (owner_user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
       RETURNING {CART_COLUMNS}"
    );
    let row: CartItemRow = sqlx::query_as(&sql)
      .bind(item.id)
      .bind(&item.owner_user_id)
      .bind(item.product_id)
      .bind(&item.name)
      .bind(&item.image_url)
      .bind(item.unit_price)
      .bind(item.quantity)
      .bind(&item.supplier_name)
      .bind(item.added_at)
      .fetch_one(&self.pool)
      .await?;
    Ok(CartItem::from(row))
  }

  async fn update_cart_quantity(&self, owner_user_id: &str, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    hortifruti_core::domain::cart::validate_quantity(quantity)?;
    let sql = format!(
      "UPDATE cart_items SET quantity = $3 WHERE id = $1 AND owner_user_id = $2 RETURNING {CART_COLUMNS}"
    );
    let row: Option<CartItemRow> = sqlx::query_as(&sql)
      .bind(item_id)
      .bind(owner_user_id)
      .bind(quantity)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(CartItem::from))
  }

  async fn delete_cart_item(&self, owner_user_id: &str, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND owner_user_id = $2")
      .bind(item_id)
      .bind(owner_user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear_cart(&self, owner_user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE owner_user_id = $1")
      .bind(owner_user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn list_addresses(&self, owner_user_id: &str) -> Result<Vec<Address>> {
    let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE owner_user_id = $1 ORDER BY created_at ASC");
    let rows: Vec<AddressRow> = sqlx::query_as(&sql).bind(owner_user_id).fetch_all(&self.pool).await?;
    rows.into_iter().map(Address::try_from).collect()
  }

  async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
    let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1");
    let row: Option<AddressRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
    row.map(Address::try_from).transpose()
  }

  async fn insert_address(&self, address: &Address) -> Result<()> {
    sqlx::query(
      "INSERT INTO addresses (id, owner_user_id, postal_code, street, number, neighborhood, city, state, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(address.id)
    .bind(&address.owner_user_id)
    .bind(address.postal_code.as_str())
    .bind(&address.street)
    .bind(&address.number)
    .bind(&address.neighborhood)
    .bind(&address.city)
    .bind(&address.state)
    .bind(address.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn delete_address(&self, owner_user_id: &str, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND owner_user_id = $2")
      .bind(id)
      .bind(owner_user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::place_order", skip_all, fields(order_id = %order.id))]
  async fn place_order(&self, order: &Order) -> Result<Vec<Uuid>> {
    let mut tx = self.pool.begin().await?;
    sqlx::query(
      "INSERT INTO orders (id, external_reference, owner_user_id, supplier_names, line_items, shipping_address, \
       subtotal, service_fee, shipping_fee, total, out_of_delivery_area, payment_method, status, payment_status, \
       created_at, approved_at, status_updated_at, pix_qr_code, pix_qr_code_base64, payment_id) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
    )
    .bind(order.id)
    .bind(&order.external_reference)
    .bind(&order.owner_user_id)
    .bind(Json(&order.supplier_names))
    .bind(Json(&order.line_items))
    .bind(Json(&order.shipping_address))
    .bind(order.subtotal)
    .bind(order.service_fee)
    .bind(order.shipping_fee)
    .bind(order.total)
    .bind(order.out_of_delivery_area)
    .bind(order.payment_method.as_str())
    .bind(order.status.as_str())
    .bind(&order.payment_status)
    .bind(order.created_at)
    .bind(order.approved_at)
    .bind(order.status_updated_at)
    .bind(&order.pix_qr_code)
    .bind(&order.pix_qr_code_base64)
    .bind(&order.payment_id)
    .execute(&mut *tx)
    .await?;

    let mut unknown = Vec::new();
    for line in &order.line_items {
      let result = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
        .bind(line.quantity)
        .bind(line.product_id)
        .execute(&mut *tx)
        .await?;
      if result.rows_affected() > 0 {
        continue;
      }
      // Dropping `tx` on the error path rolls the order insert back.
      let on_hand: Option<(String, i32)> = sqlx::query_as("SELECT name, stock FROM products WHERE id = $1")
        .bind(line.product_id)
        .fetch_optional(&mut *tx)
        .await?;
      match on_hand {
        None => unknown.push(line.product_id),
        Some((name, stock)) => {
          return Err(
            DomainError::InsufficientStock {
              product: name,
              available: stock,
              requested: line.quantity,
            }
            .into(),
          )
        }
      }
    }
    tx.commit().await?;
    Ok(unknown)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row: Option<OrderRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
    row.map(Order::try_from).transpose()
  }

  async fn find_order_by_reference(&self, external_reference: &str) -> Result<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE external_reference = $1");
    let row: Option<OrderRow> = sqlx::query_as(&sql)
      .bind(external_reference)
      .fetch_optional(&self.pool)
      .await?;
    row.map(Order::try_from).transpose()
  }

  async fn list_orders(&self, owner_user_id: &str) -> Result<Vec<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE owner_user_id = $1 ORDER BY created_at DESC");
    let rows: Vec<OrderRow> = sqlx::query_as(&sql).bind(owner_user_id).fetch_all(&self.pool).await?;
    rows.into_iter().map(Order::try_from).collect()
  }

  #[instrument(name = "PgStore::record_pix_charge", skip(self, charge, at))]
  async fn record_pix_charge(&self, order_id: Uuid, charge: &PixCharge, at: DateTime<Utc>) -> Result<Order> {
    let mut tx = self.pool.begin().await?;
    let mut order = lock_order(&mut tx, "id = $1::uuid", &order_id.to_string())
      .await?
      .ok_or_else(|| order_not_found(order_id))?;
    order.record_pix_charge(charge, at)?;
    write_order_state(&mut tx, &order).await?;
    tx.commit().await?;
    Ok(order)
  }

  #[instrument(name = "PgStore::apply_payment_update", skip(self, update), fields(payment_id = %update.payment_id))]
  async fn apply_payment_update(
    &self,
    external_reference: &str,
    update: &PaymentUpdate,
  ) -> Result<Option<AppliedPaymentUpdate>> {
    let mut tx = self.pool.begin().await?;
    let Some(mut order) = lock_order(&mut tx, "external_reference = $1", external_reference).await? else {
      return Ok(None);
    };
    let outcome = order.apply_payment_update(update);
    let mut restored = Vec::new();
    let mut unresolved_products = Vec::new();
    if let PaymentUpdateOutcome::Applied { status } = outcome {
      write_order_state(&mut tx, &order).await?;
      if status == OrderStatus::Cancelled {
        (restored, unresolved_products) = restock_lines(&mut tx, &order).await?;
      }
    }
    tx.commit().await?;
    Ok(Some(AppliedPaymentUpdate {
      order,
      outcome,
      restored,
      unresolved_products,
    }))
  }

  #[instrument(name = "PgStore::cancel_order", skip(self, at))]
  async fn cancel_order(&self, order_id: Uuid, at: DateTime<Utc>) -> Result<CancelReceipt> {
    let mut tx = self.pool.begin().await?;
    let mut order = lock_order(&mut tx, "id = $1::uuid", &order_id.to_string())
      .await?
      .ok_or_else(|| order_not_found(order_id))?;
    order.cancel(at)?;
    write_order_state(&mut tx, &order).await?;
    let (restored, unresolved_products) = restock_lines(&mut tx, &order).await?;
    tx.commit().await?;
    Ok(CancelReceipt {
      order,
      restored,
      unresolved_products,
    })
  }

  async fn is_notification_processed(&self, payment_id: &str, provider_status: &str) -> Result<bool> {
    let found: Option<(String,)> =
      sqlx::query_as("SELECT payment_id FROM processed_notifications WHERE payment_id = $1 AND provider_status = $2")
        .bind(payment_id)
        .bind(provider_status)
        .fetch_optional(&self.pool)
        .await?;
    Ok(found.is_some())
  }

  async fn mark_notification_processed(&self, payment_id: &str, provider_status: &str, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
      "INSERT INTO processed_notifications (payment_id, provider_status, processed_at) VALUES ($1, $2, $3) \
       ON CONFLICT (payment_id, provider_status) DO NOTHING",
    )
    .bind(payment_id)
    .bind(provider_status)
    .bind(at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}
