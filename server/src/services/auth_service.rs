// hortifruti-server/src/services/auth_service.rs

//! Verification of bearer tokens issued by the external auth provider.

use crate::errors::AppError;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// User id.
  pub sub: String,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  pub exp: usize,
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: Option<&str>) -> Result<&str, AppError> {
  let value = header_value.ok_or_else(|| AppError::Auth("Missing Authorization header.".to_string()))?;
  let token = value
    .strip_prefix("Bearer ")
    .or_else(|| value.strip_prefix("bearer "))
    .map(str::trim)
    .ok_or_else(|| AppError::Auth("Expected 'Bearer <token>' authorization.".to_string()))?;
  if token.is_empty() {
    return Err(AppError::Auth("Empty bearer token.".to_string()));
  }
  Ok(token)
}

#[instrument(name = "auth_service::verify_token", skip_all, err(Display))]
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
  let validation = Validation::new(Algorithm::HS256);
  let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).map_err(|e| {
    let reason = match e.kind() {
      ErrorKind::ExpiredSignature => "Token expired.",
      ErrorKind::InvalidSignature => "Invalid token signature.",
      ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => "Malformed token.",
      _ => "Invalid authentication token.",
    };
    AppError::Auth(reason.to_string())
  })?;

  if data.claims.sub.trim().is_empty() {
    return Err(AppError::Auth("Token has no subject.".to_string()));
  }
  debug!(user_id = %data.claims.sub, "Bearer token verified.");
  Ok(data.claims)
}
