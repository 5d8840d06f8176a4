// tests/common/mod.rs
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use hortifruti_core::domain::{shipping, Address, CartItem, Order, PaymentMethod, PostalCode, Product};
use hortifruti_server::config::AppConfig;
use hortifruti_server::services::auth_service::Claims;
use hortifruti_server::services::payment_mock::MockPaymentGateway;
use hortifruti_server::state::AppState;
use hortifruti_server::store::{MemoryStore, Store};
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const BUYER: &str = "buyer-1";
pub const OTHER_BUYER: &str = "buyer-2";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Everything a test needs: the shared state plus typed handles on the fakes behind it.
pub struct TestApp {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<MockPaymentGateway>,
}

pub fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "JWT_SECRET" => Some(JWT_SECRET.to_string()),
    "PAYMENT_PROVIDER" => Some("mock".to_string()),
    "PIX_NOTIFICATION_URL" => Some("https://hortifruti.test/notificacaoPix".to_string()),
    _ => None,
  })
  .expect("test config")
}

pub fn test_app_with(gateway: MockPaymentGateway) -> TestApp {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(gateway);
  let state = AppState::new(test_config(), store.clone(), gateway.clone());
  TestApp { state, store, gateway }
}

pub fn test_app() -> TestApp {
  test_app_with(MockPaymentGateway::new())
}

/// Builds the actix service for a `TestApp`'s state with the production routes.
#[macro_export]
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(hortifruti_server::web::configure_app_routes),
    )
    .await
  };
}

pub fn token_for(user_id: &str) -> String {
  let claims = Claims {
    sub: user_id.to_string(),
    name: Some("Maria da Silva".to_string()),
    email: Some(format!("{}@example.com", user_id)),
    exp: (Utc::now().timestamp() + 3600) as usize,
  };
  encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).expect("token")
}

pub fn bearer(user_id: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token_for(user_id)))
}

pub fn fixed_now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn dec(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

pub async fn seed_product(store: &MemoryStore, name: &str, supplier: &str, price_cents: i64, stock: i32) -> Product {
  let product = Product {
    id: Uuid::new_v4(),
    supplier_id: Uuid::new_v4(),
    supplier_name: supplier.to_string(),
    name: name.to_string(),
    category: "frutas".to_string(),
    price: dec(price_cents),
    stock,
    image_url: None,
    created_at: fixed_now(),
  };
  store.insert_product(&product).await.expect("insert product");
  product
}

pub async fn seed_address(store: &MemoryStore, owner: &str, postal_code: &str) -> Address {
  let address = Address {
    id: Uuid::new_v4(),
    owner_user_id: owner.to_string(),
    postal_code: PostalCode::parse(postal_code).expect("postal code"),
    street: "Rua das Flores".to_string(),
    number: "100".to_string(),
    neighborhood: "Centro".to_string(),
    city: "Guaratinguetá".to_string(),
    state: "SP".to_string(),
    created_at: fixed_now(),
  };
  store.insert_address(&address).await.expect("insert address");
  address
}

pub async fn seed_cart_line(store: &MemoryStore, owner: &str, product: &Product, quantity: i32) -> CartItem {
  let item = CartItem::from_product(owner, product, quantity, fixed_now()).expect("cart item");
  store.add_cart_quantity(&item).await.expect("save cart item")
}

/// Stores a pending order straight through the store, as checkout would.
pub async fn place_order(store: &MemoryStore, owner: &str, lines: &[(&Product, i32)], postal_code: &str) -> Order {
  let items: Vec<CartItem> = lines
    .iter()
    .map(|(product, quantity)| CartItem::from_product(owner, product, *quantity, fixed_now()).expect("cart item"))
    .collect();
  let address = seed_address(store, owner, postal_code).await;
  let quote = shipping::quote(&address.postal_code);
  let order = Order::assemble(owner, &items, address, quote, PaymentMethod::Pix, fixed_now()).expect("order");
  store.place_order(&order).await.expect("place order");
  order
}

/// The two-supplier basket used across the payment tests: 10.00 x2 + 5.00 x1, shipped for 5.
pub async fn standard_order(store: &MemoryStore, owner: &str) -> (Order, Product, Product) {
  let banana = seed_product(store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  let alface = seed_product(store, "Alface", "Horta do Zé", 500, 10).await;
  let order = place_order(store, owner, &[(&banana, 2), (&alface, 1)], "12505-500").await;
  (order, banana, alface)
}

pub fn pix_body(order: &Order) -> serde_json::Value {
  serde_json::json!({
    "carrinho": [
      {"nome": "Banana", "preco": 10.0, "quantidade": 2, "fornecedor": "Sítio Boa Vista"},
      {"nome": "Alface", "preco": 5.0, "quantidade": 1, "fornecedor": "Horta do Zé"}
    ],
    "frete": 5,
    "taxaServico": 0.5,
    "total": 30.5,
    "nomeCliente": "Maria da Silva",
    "cpfCliente": "12345678901",
    "external_reference": order.external_reference,
  })
}
