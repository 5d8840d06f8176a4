// hortifruti-server/src/pipelines/mod.rs

use crate::errors::AppError;
use hortifruti_core::FlowRegistry;

pub mod contexts;

pub mod cancel_pipeline;
pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod pix_pipeline;
pub mod webhook_pipeline;

pub use webhook_pipeline::{process_payment_notification, NotificationResult};

/// Registers every flow with the registry. Called once while building `AppState`.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering flows...");

  cart_pipeline::register_add_to_cart_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
  pix_pipeline::register_pix_charge_pipeline(registry);
  webhook_pipeline::register_payment_notification_pipeline(registry);
  cancel_pipeline::register_cancel_order_pipeline(registry);

  tracing::info!("All flows registered.");
}
