// hortifruti-server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::models::notification::{NotificationBody, NotificationQuery, NotificationTarget};
use crate::pipelines::process_payment_notification;
use crate::services::payment_gateway::is_valid_payment_id;
use crate::state::AppState;

/// `POST|GET /notificacaoPix`. Acknowledges right away and reconciles in the background.
#[instrument(name = "handler::notificacao_pix", skip_all)]
pub async fn pix_notification_handler(
  app_state: web::Data<AppState>,
  query: web::Query<NotificationQuery>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let parsed_body = if body.is_empty() {
    None
  } else {
    match serde_json::from_slice::<NotificationBody>(&body) {
      Ok(parsed) => Some(parsed),
      Err(e) => {
        warn!(error = %e, "Notification body is not valid JSON; falling back to query parameters.");
        None
      }
    }
  };
  let target = NotificationTarget::resolve(parsed_body.as_ref(), &query);

  let Some(payment_id) = target.payment_id else {
    warn!("Notification without a payment id.");
    return Err(AppError::Validation("Missing payment id (data.id).".to_string()));
  };
  if !is_valid_payment_id(&payment_id) {
    warn!(%payment_id, "Notification with a non-numeric payment id.");
    return Err(AppError::Validation("Payment id (data.id) must be numeric.".to_string()));
  }
  if !target.is_payment {
    info!(%payment_id, "Ignoring non-payment notification.");
    return Ok(HttpResponse::Ok().json(json!({ "received": true, "ignored": true })));
  }
  if !app_state.gateway.is_configured() {
    error!(%payment_id, "Payment provider is not configured; rejecting notification.");
    return Err(AppError::Config("Payment provider access token is not configured.".to_string()));
  }

  let state = app_state.get_ref().clone();
  let background_id = payment_id.clone();
  tokio::spawn(async move {
    if let Err(e) = process_payment_notification(state, background_id.clone()).await {
      error!(payment_id = %background_id, error = %e, "Payment notification processing failed.");
    }
  });

  info!(%payment_id, "Payment notification accepted.");
  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
