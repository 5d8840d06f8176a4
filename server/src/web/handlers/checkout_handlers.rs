// hortifruti-server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use hortifruti_core::domain::PaymentMethod;
use hortifruti_core::{ContextData, FlowOutcome};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct CheckoutRequest {
  pub address_id: Uuid,
  #[serde(default)]
  pub payment_method: Option<String>,
}

#[instrument(
  name = "handler::start_checkout",
  skip(app_state, auth_user, req_payload),
  fields(user_id = %auth_user.user_id, address_id = %req_payload.address_id)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let CheckoutRequest {
    address_id,
    payment_method,
  } = req_payload.into_inner();
  let payment_method = match payment_method.as_deref() {
    None => PaymentMethod::Pix,
    Some(raw) => PaymentMethod::parse(raw)
      .ok_or_else(|| AppError::Validation(format!("Unsupported payment method '{}'.", raw)))?,
  };

  let user_id = auth_user.user_id.clone();
  let ctx = ContextData::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    auth_user,
    address_id,
    payment_method,
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let guard = ctx.read();
      let order = guard.order.clone().ok_or_else(|| {
        warn!(%user_id, "Checkout completed but no order was recorded.");
        AppError::Internal("Checkout completed, but the order is unavailable.".to_string())
      })?;
      info!(
        %user_id,
        order_id = %order.id,
        external_reference = %order.external_reference,
        cart_cleared = guard.cart_cleared,
        "Checkout completed."
      );
      Ok(HttpResponse::Created().json(order))
    }
    Ok(FlowOutcome::Stopped) => {
      warn!(%user_id, "Checkout flow stopped before completing.");
      Err(AppError::Internal("Checkout did not complete.".to_string()))
    }
    Err(app_err) => {
      warn!(%user_id, error = %app_err, "Checkout failed.");
      Err(app_err)
    }
  }
}
