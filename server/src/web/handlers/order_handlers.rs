// hortifruti-server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use hortifruti_core::{ContextData, FlowOutcome};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::contexts::CancelOrderCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.list_orders(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .filter(|o| o.owner_user_id == auth_user.user_id)
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_id)))?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let ctx = ContextData::new(CancelOrderCtxData::new(app_state.get_ref().clone(), auth_user, order_id));

  match app_state.flows.run(ctx.clone()).await? {
    FlowOutcome::Completed => {
      let receipt = ctx
        .read()
        .receipt
        .clone()
        .ok_or_else(|| AppError::Internal("Cancellation completed without a receipt.".to_string()))?;
      info!(%order_id, "Order cancellation returned to caller.");
      Ok(HttpResponse::Ok().json(receipt))
    }
    FlowOutcome::Stopped => Err(AppError::Internal("Cancellation did not complete.".to_string())),
  }
}
