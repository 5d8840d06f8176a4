// hortifruti-server/src/web/handlers/shipping_handlers.rs

use actix_web::{web, HttpResponse};
use hortifruti_core::domain::{shipping, PostalCode};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;

#[instrument(name = "handler::quote_shipping")]
pub async fn quote_shipping_handler(path: web::Path<String>) -> Result<HttpResponse, AppError> {
  let postal_code = PostalCode::parse(&path.into_inner())?;
  let quote = shipping::quote(&postal_code);
  Ok(HttpResponse::Ok().json(json!({
    "postal_code": postal_code,
    "fee": quote.fee,
    "out_of_delivery_area": quote.out_of_delivery_area,
  })))
}
