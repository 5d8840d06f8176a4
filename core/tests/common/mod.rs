// tests/common/mod.rs
#![allow(dead_code)]

use hortifruti_core::{ContextData, FlowError, StepControl, StepHandler};
use once_cell::sync::Lazy;
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
  pub skip_audit: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow engine error: {0}")]
  Engine(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Engine(err.to_string())
  }
}

pub fn create_simple_handler(step_name: &'static str, message_to_append: &'static str) -> StepHandler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter);
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Stop);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn create_failing_handler(step_name: &'static str, error_message: &'static str) -> StepHandler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Domain fixtures ---
use chrono::{DateTime, TimeZone, Utc};
use hortifruti_core::domain::{Address, CartItem, NewAddress, Product};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

pub const BUYER: &str = "user-123";

pub fn fixed_now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap()
}

pub fn dec(value: &str) -> Decimal {
  Decimal::from_str(value).unwrap()
}

pub fn product(name: &str, supplier_name: &str, price: &str, stock: i32) -> Product {
  Product {
    id: Uuid::new_v4(),
    supplier_id: Uuid::new_v4(),
    supplier_name: supplier_name.to_string(),
    name: name.to_string(),
    category: "frutas".to_string(),
    price: dec(price),
    stock,
    image_url: None,
    created_at: fixed_now(),
  }
}

pub fn cart_item(name: &str, supplier_name: &str, price: &str, quantity: i32) -> CartItem {
  CartItem::from_product(BUYER, &product(name, supplier_name, price, 100), quantity, fixed_now()).unwrap()
}

pub fn address(postal_code: &str) -> Address {
  NewAddress {
    postal_code: postal_code.to_string(),
    street: "Rua Dr. Morais".to_string(),
    number: "120".to_string(),
    neighborhood: "Centro".to_string(),
    city: "Guaratinguetá".to_string(),
    state: "sp".to_string(),
  }
  .into_address(BUYER, fixed_now())
  .unwrap()
}
