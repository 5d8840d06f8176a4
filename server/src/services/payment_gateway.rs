// hortifruti-server/src/services/payment_gateway.rs

//! Seam between the flows and the PIX payment provider.

use async_trait::async_trait;
use hortifruti_core::domain::{Cpf, PixCharge};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct PixChargeRequest {
  pub amount: Decimal,
  pub description: String,
  pub external_reference: String,
  pub payer_name: String,
  pub payer_email: String,
  pub payer_cpf: Cpf,
  pub notification_url: Option<String>,
}

/// A payment as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPayment {
  pub id: String,
  pub status: String,
  pub external_reference: Option<String>,
  pub qr_code: Option<String>,
  pub qr_code_base64: Option<String>,
}

impl ProviderPayment {
  /// The QR fields of a freshly created charge. Both must be present.
  pub fn into_pix_charge(self) -> Result<PixCharge, GatewayError> {
    match (self.qr_code, self.qr_code_base64) {
      (Some(qr_code), Some(qr_code_base64)) => Ok(PixCharge {
        payment_id: self.id,
        provider_status: self.status,
        qr_code,
        qr_code_base64,
      }),
      _ => Err(GatewayError::InvalidResponse(format!(
        "payment {} came back without a PIX QR code",
        self.id
      ))),
    }
  }
}

/// Provider payment ids are numeric.
pub fn is_valid_payment_id(id: &str) -> bool {
  !id.is_empty() && id.len() <= 20 && id.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("payment provider access token is not configured")]
  NotConfigured,

  #[error("payment provider request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("payment provider rejected the request ({status}): {message}")]
  Rejected { status: u16, message: String },

  #[error("payment provider returned an unexpected response: {0}")]
  InvalidResponse(String),

  #[error("payment provider request could not be built: {0}")]
  InvalidRequest(String),
}

impl GatewayError {
  /// The receiving account has no PIX key enabled for QR rendering.
  pub fn is_receiver_misconfigured(&self) -> bool {
    match self {
      GatewayError::Rejected { message, .. } => {
        let message = message.to_lowercase();
        message.contains("key enabled for qr") || message.contains("collector user without key")
      }
      _ => false,
    }
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &'static str;

  /// `false` when credentials are missing; payment endpoints then fail closed.
  fn is_configured(&self) -> bool;

  async fn create_pix_charge(&self, request: &PixChargeRequest) -> Result<ProviderPayment, GatewayError>;

  async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, GatewayError>;
}
