// hortifruti-server/src/pipelines/webhook_pipeline.rs

//! Payment notification reconciliation. Deliveries are at-least-once, so
//! every (payment id, provider status) pair is applied a single time.

use crate::errors::AppError;
use crate::pipelines::contexts::PaymentNotificationCtxData;
use crate::state::AppState;
use chrono::Utc;
use hortifruti_core::domain::{OrderStatus, PaymentUpdate, PaymentUpdateOutcome};
use hortifruti_core::{ContextData, Flow, FlowOutcome, FlowRegistry, StepControl, StepDef};
use tracing::{info, instrument, warn};

/// What a processed notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationResult {
  Applied { status: OrderStatus },
  /// The order had already reached a final status and was left alone.
  AlreadyFinal { status: OrderStatus },
  /// The payment belongs to a charge that a newer one replaced.
  Superseded,
  Replayed,
  UnknownReference,
  NoReference,
}

fn has_no_reference(ctx: &ContextData<PaymentNotificationCtxData>) -> bool {
  ctx
    .read()
    .payment
    .as_ref()
    .map_or(true, |p| p.external_reference.is_none())
}

pub fn register_payment_notification_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Flow::<PaymentNotificationCtxData, AppError>::new(
    "payment_notification",
    vec![
      StepDef::required("fetch_payment_details"),
      StepDef::required("check_notification_replay"),
      StepDef::required("apply_payment_status").skip_if(has_no_reference),
      StepDef::required("mark_notification_processed"),
    ],
  );

  p.on("fetch_payment_details", |ctx: ContextData<PaymentNotificationCtxData>| async move {
    let (payment_id, gateway) = {
      let guard = ctx.read();
      (guard.payment_id.clone(), guard.app_state.gateway.clone())
    };
    let mut payment = gateway.fetch_payment(&payment_id).await?;
    payment.external_reference = payment
      .external_reference
      .map(|r| r.trim().to_string())
      .filter(|r| !r.is_empty());
    if payment.external_reference.is_none() {
      warn!(%payment_id, status = %payment.status, "Payment carries no external reference; nothing to update.");
    }
    info!(%payment_id, status = %payment.status, "Payment details fetched.");
    ctx.write().payment = Some(payment);
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("check_notification_replay", |ctx: ContextData<PaymentNotificationCtxData>| async move {
    let (payment_id, status, store) = {
      let guard = ctx.read();
      let status = guard.payment.as_ref().map(|p| p.status.clone()).unwrap_or_default();
      (guard.payment_id.clone(), status, guard.app_state.store.clone())
    };
    if store.is_notification_processed(&payment_id, &status).await? {
      info!(%payment_id, %status, "Notification already processed; ignoring replay.");
      ctx.write().already_processed = true;
      return Ok(StepControl::Stop);
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("apply_payment_status", |ctx: ContextData<PaymentNotificationCtxData>| async move {
    let (reference, update, store) = {
      let guard = ctx.read();
      let payment = guard
        .payment
        .as_ref()
        .ok_or_else(|| AppError::Internal("Payment was not fetched.".to_string()))?;
      let update = PaymentUpdate {
        payment_id: payment.id.clone(),
        provider_status: payment.status.clone(),
        at: Utc::now(),
      };
      (payment.external_reference.clone().unwrap_or_default(), update, guard.app_state.store.clone())
    };

    match store.apply_payment_update(&reference, &update).await? {
      None => warn!(external_reference = %reference, payment_id = %update.payment_id, "No order for payment reference."),
      Some(applied) => {
        match applied.outcome {
          PaymentUpdateOutcome::Applied { status } => info!(
            order_id = %applied.order.id,
            %status,
            provider_status = %update.provider_status,
            "Order payment status updated."
          ),
          PaymentUpdateOutcome::AlreadyFinal { status } => warn!(
            order_id = %applied.order.id,
            %status,
            provider_status = %update.provider_status,
            "Order already final; payment update ignored."
          ),
          PaymentUpdateOutcome::Superseded => warn!(
            order_id = %applied.order.id,
            payment_id = %update.payment_id,
            current_payment_id = applied.order.payment_id.as_deref().unwrap_or_default(),
            provider_status = %update.provider_status,
            "Payment belongs to a replaced charge; update ignored."
          ),
        }
        if !applied.restored.is_empty() || !applied.unresolved_products.is_empty() {
          info!(
            order_id = %applied.order.id,
            restored = applied.restored.len(),
            unresolved = applied.unresolved_products.len(),
            "Stock returned for cancelled payment."
          );
        }
        let mut guard = ctx.write();
        guard.outcome = Some(applied.outcome);
        guard.order = Some(applied.order);
      }
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("mark_notification_processed", |ctx: ContextData<PaymentNotificationCtxData>| async move {
    let (payment_id, status, store) = {
      let guard = ctx.read();
      let status = guard.payment.as_ref().map(|p| p.status.clone()).unwrap_or_default();
      (guard.payment_id.clone(), status, guard.app_state.store.clone())
    };
    store.mark_notification_processed(&payment_id, &status, Utc::now()).await?;
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(p);
}

/// Reconciles one payment with its order. Called in the background once the
/// webhook has been acknowledged; errors are only logged by the caller.
#[instrument(name = "webhook::process_payment_notification", skip(app_state))]
pub async fn process_payment_notification(app_state: AppState, payment_id: String) -> Result<NotificationResult, AppError> {
  let ctx = ContextData::new(PaymentNotificationCtxData::new(app_state.clone(), payment_id));
  let outcome = app_state.flows.run(ctx.clone()).await?;

  let guard = ctx.read();
  let result = match (outcome, guard.outcome) {
    (FlowOutcome::Stopped, _) if guard.already_processed => NotificationResult::Replayed,
    (_, Some(PaymentUpdateOutcome::Applied { status })) => NotificationResult::Applied { status },
    (_, Some(PaymentUpdateOutcome::AlreadyFinal { status })) => NotificationResult::AlreadyFinal { status },
    (_, Some(PaymentUpdateOutcome::Superseded)) => NotificationResult::Superseded,
    (_, None) if has_reference(&guard) => NotificationResult::UnknownReference,
    (_, None) => NotificationResult::NoReference,
  };
  info!(?result, "Payment notification processed.");
  Ok(result)
}

fn has_reference(data: &PaymentNotificationCtxData) -> bool {
  data.payment.as_ref().map_or(false, |p| p.external_reference.is_some())
}
