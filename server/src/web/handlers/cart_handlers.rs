// hortifruti-server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use hortifruti_core::domain::cart::validate_quantity;
use hortifruti_core::domain::CartSummary;
use hortifruti_core::{ContextData, FlowOutcome};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct AddToCartRequest {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityRequest {
  pub quantity: i32,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let items = app_state.store.list_cart(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(CartSummary::from_items(items)))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, auth_user, req_payload),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
  let AddToCartRequest { product_id, quantity } = req_payload.into_inner();
  let ctx = ContextData::new(AddToCartCtxData::new(
    app_state.get_ref().clone(),
    auth_user,
    product_id,
    quantity,
  ));

  match app_state.flows.run(ctx.clone()).await? {
    FlowOutcome::Completed => {
      let item = ctx
        .read()
        .saved_item
        .clone()
        .ok_or_else(|| AppError::Internal("Cart flow completed without a saved line.".to_string()))?;
      info!(item_id = %item.id, "Product added to cart.");
      Ok(HttpResponse::Ok().json(item))
    }
    FlowOutcome::Stopped => {
      warn!("Add to cart flow stopped before saving.");
      Err(AppError::Internal("Add to cart did not complete.".to_string()))
    }
  }
}

#[instrument(name = "handler::update_cart_item", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.user_id))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
  let item_id = path.into_inner();
  let quantity = validate_quantity(req_payload.quantity)?;
  let not_found = || AppError::NotFound(format!("Cart item {} not found.", item_id));

  let line = app_state
    .store
    .get_cart_item(&auth_user.user_id, item_id)
    .await?
    .ok_or_else(not_found)?;
  let product = app_state
    .store
    .get_product(line.product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found.", line.product_id)))?;
  if let Err(e) = product.ensure_available(quantity) {
    warn!(product_id = %product.id, quantity, stock = product.stock, "Cart quantity exceeds stock.");
    return Err(e.into());
  }

  let item = app_state
    .store
    .update_cart_quantity(&auth_user.user_id, item_id, quantity)
    .await?
    .ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let item_id = path.into_inner();
  if !app_state.store.delete_cart_item(&auth_user.user_id, item_id).await? {
    return Err(AppError::NotFound(format!("Cart item {} not found.", item_id)));
  }
  Ok(HttpResponse::NoContent().finish())
}
