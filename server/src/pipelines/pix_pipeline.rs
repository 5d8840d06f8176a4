// hortifruti-server/src/pipelines/pix_pipeline.rs

//! Creates a PIX charge for an existing order and writes the QR code back onto it.
//! Nothing is written to the order unless the provider returned a usable charge.

use crate::errors::AppError;
use crate::pipelines::contexts::PixChargeCtxData;
use crate::services::payment_gateway::PixChargeRequest;
use chrono::Utc;
use hortifruti_core::domain::OrderStatus;
use hortifruti_core::{ContextData, Flow, FlowRegistry, StepControl, StepDef};
use tracing::{error, info, warn};

/// Message shown when the receiving account cannot issue PIX QR codes.
pub fn receiver_misconfigured_message(supplier_names: &[String]) -> String {
  if supplier_names.is_empty() {
    return "The store's payment account has no PIX key enabled for QR codes. Please contact support.".to_string();
  }
  format!(
    "Supplier(s) {} cannot receive PIX payments yet: no PIX key is enabled for QR codes on their account.",
    supplier_names.join(", ")
  )
}

pub fn register_pix_charge_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Flow::<PixChargeCtxData, AppError>::new(
    "pix_charge",
    vec![
      StepDef::required("validate_pix_payload"),
      StepDef::required("load_order_for_charge"),
      StepDef::required("create_pix_charge"),
      StepDef::required("record_pix_charge"),
    ],
  );

  p.on("validate_pix_payload", |ctx: ContextData<PixChargeCtxData>| async move {
    let mut guard = ctx.write();
    match guard.payload.validate() {
      Ok(valid) => {
        guard.charge_request = Some(valid);
        Ok(StepControl::Continue)
      }
      Err(errors) => {
        warn!(user_id = %guard.user.user_id, problems = errors.len(), "PIX payload rejected.");
        Err(AppError::ValidationList(errors))
      }
    }
  });

  p.on("load_order_for_charge", |ctx: ContextData<PixChargeCtxData>| async move {
    let (user_id, reference, payload_total, store) = {
      let guard = ctx.read();
      let request = guard
        .charge_request
        .as_ref()
        .ok_or_else(|| AppError::Internal("PIX payload was not validated.".to_string()))?;
      (
        guard.user.user_id.clone(),
        request.external_reference.clone(),
        request.total,
        guard.app_state.store.clone(),
      )
    };

    let order = store
      .find_order_by_reference(&reference)
      .await?
      .filter(|o| o.owner_user_id == user_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", reference)))?;

    if order.status != OrderStatus::Pending {
      return Err(AppError::Conflict(format!(
        "Order {} is {} and can no longer be charged.",
        reference, order.status
      )));
    }
    if order.total != payload_total {
      warn!(
        external_reference = %reference,
        order_total = %order.total,
        payload_total = %payload_total,
        "PIX payload total differs from the stored order total."
      );
    }
    ctx.write().order = Some(order);
    Ok::<_, AppError>(StepControl::Continue)
  });

  // Fail closed before any provider call when no credentials are set.
  p.before("create_pix_charge", |ctx: ContextData<PixChargeCtxData>| async move {
    let gateway = ctx.read().app_state.gateway.clone();
    if !gateway.is_configured() {
      error!(provider = gateway.name(), "Payment provider is not configured.");
      return Err(AppError::Config("Payment provider access token is not configured.".to_string()));
    }
    Ok(StepControl::Continue)
  });

  p.on("create_pix_charge", |ctx: ContextData<PixChargeCtxData>| async move {
    let (request, supplier_names, gateway) = {
      let guard = ctx.read();
      let valid = guard
        .charge_request
        .as_ref()
        .ok_or_else(|| AppError::Internal("PIX payload was not validated.".to_string()))?;
      let order = guard
        .order
        .as_ref()
        .ok_or_else(|| AppError::Internal("Order was not loaded before charging.".to_string()))?;
      let config = &guard.app_state.config;

      let mut supplier_names = valid.supplier_names();
      if supplier_names.is_empty() {
        supplier_names = order.supplier_names.clone();
      }
      let request = PixChargeRequest {
        amount: valid.total,
        description: format!("Hortifruti Digital - pedido {}", valid.external_reference),
        external_reference: valid.external_reference.clone(),
        payer_name: valid.customer_name.clone(),
        payer_email: guard.user.payer_email(&config.fallback_payer_email_domain),
        payer_cpf: valid.cpf.clone(),
        notification_url: config.pix_notification_url.clone(),
      };
      (request, supplier_names, guard.app_state.gateway.clone())
    };

    let charge = gateway
      .create_pix_charge(&request)
      .await
      .and_then(|payment| payment.into_pix_charge())
      .map_err(|e| match e {
        e if e.is_receiver_misconfigured() => {
          warn!(suppliers = ?supplier_names, "Provider rejected the charge: receiver has no PIX key.");
          AppError::Payment(receiver_misconfigured_message(&supplier_names))
        }
        other => {
          error!(external_reference = %request.external_reference, error = %other, "PIX charge creation failed.");
          AppError::from(other)
        }
      })?;

    info!(
      external_reference = %request.external_reference,
      payment_id = %charge.payment_id,
      status = %charge.provider_status,
      "PIX charge created."
    );
    ctx.write().charge = Some(charge);
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("record_pix_charge", |ctx: ContextData<PixChargeCtxData>| async move {
    let (order_id, charge, store) = {
      let guard = ctx.read();
      match (&guard.order, &guard.charge) {
        (Some(order), Some(charge)) => (order.id, charge.clone(), guard.app_state.store.clone()),
        _ => return Err(AppError::Internal("No charge to record.".to_string())),
      }
    };
    let order = store.record_pix_charge(order_id, &charge, Utc::now()).await?;
    ctx.write().order = Some(order);
    Ok(StepControl::Continue)
  });

  registry.register(p);
}
