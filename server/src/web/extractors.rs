// hortifruti-server/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;

/// Identity of the caller, verified from the bearer token on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub user_id: String,
  pub name: Option<String>,
  pub email: Option<String>,
}

impl AuthenticatedUser {
  /// E-mail sent to the payment provider as the payer's.
  pub fn payer_email(&self, fallback_domain: &str) -> String {
    match &self.email {
      Some(email) if email.contains('@') => email.clone(),
      _ => format!("{}@{}", self.user_id, fallback_domain),
    }
  }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
  let token = auth_service::bearer_token(header)?;
  let claims = auth_service::verify_token(token, &state.config.jwt_secret)?;
  Ok(AuthenticatedUser {
    user_id: claims.sub,
    name: claims.name,
    email: claims.email,
  })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}
