// hortifruti-server/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use hortifruti_core::{ContextData, FlowOutcome};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::{PixChargePayload, PixChargeResponse};
use crate::pipelines::contexts::PixChargeCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// `POST /criarPixHortifruti`
#[instrument(name = "handler::criar_pix", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.user_id))]
pub async fn create_pix_charge_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<PixChargePayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(PixChargeCtxData::new(
    app_state.get_ref().clone(),
    auth_user,
    req_payload.into_inner(),
  ));

  match app_state.flows.run(ctx.clone()).await? {
    FlowOutcome::Completed => {
      let guard = ctx.read();
      match (&guard.charge, &guard.order) {
        (Some(charge), Some(order)) => {
          info!(external_reference = %order.external_reference, payment_id = %charge.payment_id, "PIX charge returned to caller.");
          Ok(HttpResponse::Ok().json(PixChargeResponse {
            qr_code: charge.qr_code.clone(),
            qr_code_base64: charge.qr_code_base64.clone(),
            payment_id: charge.payment_id.clone(),
            status: charge.provider_status.clone(),
            external_reference: order.external_reference.clone(),
          }))
        }
        _ => Err(AppError::Internal("PIX flow completed without a charge.".to_string())),
      }
    }
    FlowOutcome::Stopped => {
      warn!("PIX charge flow stopped before completing.");
      Err(AppError::Internal("PIX charge did not complete.".to_string()))
    }
  }
}

/// CORS preflight for the PIX endpoint; the headers come from the resource middleware.
pub async fn pix_preflight_handler() -> HttpResponse {
  HttpResponse::NoContent().finish()
}
