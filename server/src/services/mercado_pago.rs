// hortifruti-server/src/services/mercado_pago.rs

//! Mercado Pago v1 payments API, PIX only.
//!
//! - `POST /v1/payments` with `payment_method_id = "pix"` creates a charge and
//!   returns the QR code under `point_of_interaction.transaction_data`.
//! - `GET /v1/payments/{id}` reads the current state of a payment.
//!
//! Every call is authenticated with the bearer access token and every charge
//! carries a fresh `X-Idempotency-Key`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::payment_gateway::{is_valid_payment_id, GatewayError, PaymentGateway, PixChargeRequest, ProviderPayment};
use crate::config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct MercadoPagoGateway {
  client: reqwest::Client,
  base_url: String,
  access_token: Option<String>,
}

impl MercadoPagoGateway {
  pub fn new(config: &AppConfig) -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self {
      client,
      base_url: config.mp_api_base_url.clone(),
      access_token: config.mp_access_token.clone(),
    })
  }

  fn token(&self) -> Result<&str, GatewayError> {
    self.access_token.as_deref().ok_or(GatewayError::NotConfigured)
  }

  fn api_url(&self, segments: &[&str]) -> Result<reqwest::Url, GatewayError> {
    let mut url = reqwest::Url::parse(&self.base_url)
      .map_err(|e| GatewayError::InvalidRequest(format!("bad base url '{}': {}", self.base_url, e)))?;
    url
      .path_segments_mut()
      .map_err(|_| GatewayError::InvalidRequest(format!("base url '{}' cannot take a path", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn handle_response(&self, response: reqwest::Response) -> Result<ProviderPayment, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      let message = error_message(&body);
      warn!(status = status.as_u16(), %message, "Mercado Pago rejected the request.");
      return Err(GatewayError::Rejected {
        status: status.as_u16(),
        message,
      });
    }
    let payment: MpPayment = serde_json::from_str(&body)
      .map_err(|e| GatewayError::InvalidResponse(format!("cannot parse payment: {}", e)))?;
    payment.into_provider_payment()
  }
}

impl std::fmt::Debug for MercadoPagoGateway {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MercadoPagoGateway")
      .field("base_url", &self.base_url)
      .field("configured", &self.access_token.is_some())
      .finish_non_exhaustive()
  }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
  fn name(&self) -> &'static str {
    "mercadopago"
  }

  fn is_configured(&self) -> bool {
    self.access_token.is_some()
  }

  #[instrument(name = "mercado_pago::create_pix_charge", skip_all, fields(external_reference = %request.external_reference, amount = %request.amount))]
  async fn create_pix_charge(&self, request: &PixChargeRequest) -> Result<ProviderPayment, GatewayError> {
    let token = self.token()?;
    let idempotency_key = Uuid::new_v4().to_string();
    let response = self
      .client
      .post(self.api_url(&["v1", "payments"])?)
      .bearer_auth(token)
      .header("X-Idempotency-Key", &idempotency_key)
      .json(&MpPaymentRequest::from(request))
      .send()
      .await?;

    let payment = self.handle_response(response).await?;
    info!(payment_id = %payment.id, status = %payment.status, "PIX charge created.");
    Ok(payment)
  }

  #[instrument(name = "mercado_pago::fetch_payment", skip(self))]
  async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, GatewayError> {
    let token = self.token()?;
    if !is_valid_payment_id(payment_id) {
      return Err(GatewayError::InvalidRequest(format!("payment id '{}' is not numeric", payment_id)));
    }
    let response = self
      .client
      .get(self.api_url(&["v1", "payments", payment_id])?)
      .bearer_auth(token)
      .send()
      .await?;
    self.handle_response(response).await
  }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct MpPaymentRequest<'a> {
  #[serde(with = "rust_decimal::serde::float")]
  transaction_amount: Decimal,
  description: &'a str,
  payment_method_id: &'static str,
  external_reference: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  notification_url: Option<&'a str>,
  payer: MpPayer<'a>,
}

#[derive(Debug, Serialize)]
struct MpPayer<'a> {
  email: &'a str,
  first_name: &'a str,
  #[serde(skip_serializing_if = "str::is_empty")]
  last_name: &'a str,
  identification: MpIdentification<'a>,
}

#[derive(Debug, Serialize)]
struct MpIdentification<'a> {
  #[serde(rename = "type")]
  kind: &'static str,
  number: &'a str,
}

impl<'a> From<&'a PixChargeRequest> for MpPaymentRequest<'a> {
  fn from(request: &'a PixChargeRequest) -> Self {
    let name = request.payer_name.trim();
    let (first_name, last_name) = match name.split_once(' ') {
      Some((first, rest)) => (first, rest.trim()),
      None => (name, ""),
    };
    Self {
      transaction_amount: request.amount,
      description: &request.description,
      payment_method_id: "pix",
      external_reference: &request.external_reference,
      notification_url: request.notification_url.as_deref(),
      payer: MpPayer {
        email: &request.payer_email,
        first_name,
        last_name,
        identification: MpIdentification {
          kind: "CPF",
          number: request.payer_cpf.as_str(),
        },
      },
    }
  }
}

#[derive(Debug, Deserialize)]
struct MpPayment {
  id: JsonValue,
  status: Option<String>,
  external_reference: Option<String>,
  point_of_interaction: Option<MpPointOfInteraction>,
}

#[derive(Debug, Deserialize)]
struct MpPointOfInteraction {
  transaction_data: Option<MpTransactionData>,
}

#[derive(Debug, Deserialize)]
struct MpTransactionData {
  qr_code: Option<String>,
  qr_code_base64: Option<String>,
}

impl MpPayment {
  fn into_provider_payment(self) -> Result<ProviderPayment, GatewayError> {
    let id = match &self.id {
      JsonValue::Number(n) => n.to_string(),
      JsonValue::String(s) if !s.is_empty() => s.clone(),
      other => return Err(GatewayError::InvalidResponse(format!("payment id {} is not usable", other))),
    };
    let transaction_data = self.point_of_interaction.and_then(|p| p.transaction_data);
    let (qr_code, qr_code_base64) = match transaction_data {
      Some(data) => (data.qr_code, data.qr_code_base64),
      None => (None, None),
    };
    Ok(ProviderPayment {
      id,
      status: self.status.unwrap_or_else(|| "pending".to_string()),
      external_reference: self.external_reference.filter(|r| !r.is_empty()),
      qr_code,
      qr_code_base64,
    })
  }
}

/// Best human-readable message out of an error body:
/// `cause[].description`, then `message`, then the raw text.
fn error_message(body: &str) -> String {
  let Ok(json) = serde_json::from_str::<JsonValue>(body) else {
    return body.trim().to_string();
  };
  let causes: Vec<&str> = json
    .get("cause")
    .and_then(JsonValue::as_array)
    .map(|causes| causes.iter().filter_map(|c| c.get("description").and_then(JsonValue::as_str)).collect())
    .unwrap_or_default();
  if !causes.is_empty() {
    return causes.join("; ");
  }
  json
    .get("message")
    .and_then(JsonValue::as_str)
    .map(str::to_string)
    .unwrap_or_else(|| body.trim().to_string())
}
