// hortifruti-server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hortifruti_core::domain::DomainError;
use hortifruti_core::FlowError;
use serde_json::json;
use thiserror::Error;

use crate::services::payment_gateway::GatewayError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  /// Every problem found in a request body, reported together.
  #[error("Validation Error: {}", .0.join("; "))]
  ValidationList(Vec<String>),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Flow Error: {0}")]
  Flow(#[from] FlowError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<DomainError> for AppError {
  fn from(err: DomainError) -> Self {
    match err {
      DomainError::IllegalTransition { .. } => AppError::Conflict(err.to_string()),
      other => AppError::Validation(other.to_string()),
    }
  }
}

impl From<GatewayError> for AppError {
  fn from(err: GatewayError) -> Self {
    match err {
      GatewayError::NotConfigured => AppError::Config(err.to_string()),
      other => AppError::Payment(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::ValidationList(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Payment(_)
      | AppError::Config(_)
      | AppError::Database(_)
      | AppError::Flow(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let status = self.status_code();
    match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) | AppError::Conflict(m) => {
        HttpResponse::build(status).json(json!({"error": m}))
      }
      AppError::ValidationList(errors) => {
        HttpResponse::build(status).json(json!({"error": errors.join("; "), "errors": errors}))
      }
      AppError::Payment(m) => HttpResponse::build(status).json(json!({"error": m})),
      AppError::Config(m) => HttpResponse::build(status).json(json!({"error": "Configuration issue", "detail": m})),
      AppError::Database(_) => HttpResponse::build(status).json(json!({"error": "Database operation failed"})),
      AppError::Flow(source) => {
        HttpResponse::build(status).json(json!({"error": "Flow processing error", "detail": source.to_string()}))
      }
      AppError::Internal(m) => {
        HttpResponse::build(status).json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
