// hortifruti-server/src/web/handlers/address_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use hortifruti_core::domain::{shipping, NewAddress};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_addresses", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_addresses_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let addresses = app_state.store.list_addresses(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(addresses))
}

#[instrument(name = "handler::create_address", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.user_id))]
pub async fn create_address_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<NewAddress>,
) -> Result<HttpResponse, AppError> {
  let address = req_payload.into_inner().into_address(&auth_user.user_id, Utc::now())?;
  app_state.store.insert_address(&address).await?;
  let quote = shipping::quote(&address.postal_code);
  info!(address_id = %address.id, fee = %quote.fee, "Address saved.");
  Ok(HttpResponse::Created().json(json!({ "address": address, "shipping": quote })))
}

#[instrument(name = "handler::delete_address", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_address_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let address_id = path.into_inner();
  if !app_state.store.delete_address(&auth_user.user_id, address_id).await? {
    return Err(AppError::NotFound(format!("Address {} not found.", address_id)));
  }
  Ok(HttpResponse::NoContent().finish())
}
