// hortifruti-server/src/services/payment_mock.rs

//! In-process stand-in for the payment provider. Used with
//! `PAYMENT_PROVIDER=mock` and by the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, instrument};

use super::payment_gateway::{GatewayError, PaymentGateway, PixChargeRequest, ProviderPayment};

#[derive(Debug)]
pub struct MockPaymentGateway {
  configured: bool,
  payments: Mutex<HashMap<String, ProviderPayment>>,
  next_rejection: Mutex<Option<String>>,
  charges_created: AtomicUsize,
  fetches: AtomicUsize,
}

impl MockPaymentGateway {
  pub fn new() -> Self {
    Self {
      configured: true,
      payments: Mutex::new(HashMap::new()),
      next_rejection: Mutex::new(None),
      charges_created: AtomicUsize::new(0),
      fetches: AtomicUsize::new(0),
    }
  }

  /// A gateway that behaves like a provider without an access token.
  pub fn unconfigured() -> Self {
    Self {
      configured: false,
      ..Self::new()
    }
  }

  /// Makes the next charge fail with a provider rejection carrying `message`.
  pub fn reject_next_with(&self, message: &str) {
    *self.next_rejection.lock() = Some(message.to_string());
  }

  /// Registers or replaces a payment, as if the provider's state had changed.
  pub fn insert_payment(&self, payment: ProviderPayment) {
    self.payments.lock().insert(payment.id.clone(), payment);
  }

  pub fn set_status(&self, payment_id: &str, status: &str) -> bool {
    match self.payments.lock().get_mut(payment_id) {
      Some(payment) => {
        payment.status = status.to_string();
        true
      }
      None => false,
    }
  }

  pub fn charges_created(&self) -> usize {
    self.charges_created.load(Ordering::SeqCst)
  }

  pub fn fetches(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

impl Default for MockPaymentGateway {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  fn name(&self) -> &'static str {
    "mock"
  }

  fn is_configured(&self) -> bool {
    self.configured
  }

  #[instrument(name = "payment_mock::create_pix_charge", skip_all, fields(external_reference = %request.external_reference, amount = %request.amount))]
  async fn create_pix_charge(&self, request: &PixChargeRequest) -> Result<ProviderPayment, GatewayError> {
    if !self.configured {
      return Err(GatewayError::NotConfigured);
    }
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    if let Some(message) = self.next_rejection.lock().take() {
      info!(%message, "Mock provider rejecting charge.");
      return Err(GatewayError::Rejected { status: 400, message });
    }

    let sequence = self.charges_created.fetch_add(1, Ordering::SeqCst) + 1;
    let id = (9_000_000_000u64 + sequence as u64).to_string();
    let payment = ProviderPayment {
      id: id.clone(),
      status: "pending".to_string(),
      external_reference: Some(request.external_reference.clone()),
      qr_code: Some(format!("00020126580014br.gov.bcb.pix0136mock-{}5204000053039865405{}", id, request.amount)),
      qr_code_base64: Some(format!("bW9jay1xci17fQ=={}", id)),
    };
    self.payments.lock().insert(id, payment.clone());
    info!(payment_id = %payment.id, "Mock PIX charge created.");
    Ok(payment)
  }

  #[instrument(name = "payment_mock::fetch_payment", skip(self))]
  async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, GatewayError> {
    if !self.configured {
      return Err(GatewayError::NotConfigured);
    }
    self.fetches.fetch_add(1, Ordering::SeqCst);
    self
      .payments
      .lock()
      .get(payment_id)
      .cloned()
      .ok_or_else(|| GatewayError::Rejected {
        status: 404,
        message: format!("Payment not found: {}", payment_id),
      })
  }
}
