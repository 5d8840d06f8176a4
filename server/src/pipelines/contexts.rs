// hortifruti-server/src/pipelines/contexts.rs

//! Data carried through each flow. Handlers receive these wrapped in
//! `hortifruti_core::ContextData`.

use crate::models::pix::{PixChargePayload, ValidPixCharge};
use crate::services::payment_gateway::ProviderPayment;
use crate::state::AppState;
use crate::store::CancelReceipt;
use crate::web::extractors::AuthenticatedUser;
use hortifruti_core::domain::{Address, CartItem, Order, PaymentMethod, PaymentUpdateOutcome, PixCharge, Product, ShippingQuote};
use uuid::Uuid;

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user: AuthenticatedUser,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  pub existing_item: Option<CartItem>,
  pub saved_item: Option<CartItem>,
}

impl AddToCartCtxData {
  pub fn new(app_state: AppState, user: AuthenticatedUser, product_id: Uuid, quantity: i32) -> Self {
    Self {
      app_state,
      user,
      product_id,
      quantity,
      product: None,
      existing_item: None,
      saved_item: None,
    }
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user: AuthenticatedUser,
  pub address_id: Uuid,
  pub payment_method: PaymentMethod,
  pub cart_items: Vec<CartItem>,
  pub address: Option<Address>,
  pub quote: Option<ShippingQuote>,
  pub order: Option<Order>,
  /// Set once the order is durably stored; the cart is only cleared after that.
  pub order_placed: bool,
  pub cart_cleared: bool,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, user: AuthenticatedUser, address_id: Uuid, payment_method: PaymentMethod) -> Self {
    Self {
      app_state,
      user,
      address_id,
      payment_method,
      cart_items: Vec::new(),
      address: None,
      quote: None,
      order: None,
      order_placed: false,
      cart_cleared: false,
    }
  }
}

#[derive(Clone)]
pub struct PixChargeCtxData {
  pub app_state: AppState,
  pub user: AuthenticatedUser,
  pub payload: PixChargePayload,
  pub charge_request: Option<ValidPixCharge>,
  pub order: Option<Order>,
  pub charge: Option<PixCharge>,
}

impl PixChargeCtxData {
  pub fn new(app_state: AppState, user: AuthenticatedUser, payload: PixChargePayload) -> Self {
    Self {
      app_state,
      user,
      payload,
      charge_request: None,
      order: None,
      charge: None,
    }
  }
}

#[derive(Clone)]
pub struct PaymentNotificationCtxData {
  pub app_state: AppState,
  pub payment_id: String,
  pub payment: Option<ProviderPayment>,
  pub already_processed: bool,
  pub order: Option<Order>,
  pub outcome: Option<PaymentUpdateOutcome>,
}

impl PaymentNotificationCtxData {
  pub fn new(app_state: AppState, payment_id: String) -> Self {
    Self {
      app_state,
      payment_id,
      payment: None,
      already_processed: false,
      order: None,
      outcome: None,
    }
  }
}

#[derive(Clone)]
pub struct CancelOrderCtxData {
  pub app_state: AppState,
  pub user: AuthenticatedUser,
  pub order_id: Uuid,
  pub order: Option<Order>,
  pub receipt: Option<CancelReceipt>,
}

impl CancelOrderCtxData {
  pub fn new(app_state: AppState, user: AuthenticatedUser, order_id: Uuid) -> Self {
    Self {
      app_state,
      user,
      order_id,
      order: None,
      receipt: None,
    }
  }
}
