// hortifruti-server/src/pipelines/cancel_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::CancelOrderCtxData;
use chrono::Utc;
use hortifruti_core::domain::OrderStatus;
use hortifruti_core::{ContextData, Flow, FlowRegistry, StepControl, StepDef};
use tracing::{info, warn};

pub fn register_cancel_order_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Flow::<CancelOrderCtxData, AppError>::new(
    "cancel_order",
    vec![
      StepDef::required("load_order_for_cancel"),
      StepDef::required("cancel_and_restock"),
    ],
  );

  p.on("load_order_for_cancel", |ctx: ContextData<CancelOrderCtxData>| async move {
    let (user_id, order_id, store) = {
      let guard = ctx.read();
      (guard.user.user_id.clone(), guard.order_id, guard.app_state.store.clone())
    };
    let order = store
      .get_order(order_id)
      .await?
      .filter(|o| o.owner_user_id == user_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_id)))?;
    ctx.write().order = Some(order);
    Ok::<_, AppError>(StepControl::Continue)
  });

  // Early answer for the common case; the store re-checks inside its transaction.
  p.before("cancel_and_restock", |ctx: ContextData<CancelOrderCtxData>| async move {
    let guard = ctx.read();
    match &guard.order {
      Some(order) if order.status == OrderStatus::Pending => Ok(StepControl::Continue),
      Some(order) => Err(AppError::Conflict(format!(
        "Order {} is {} and cannot be cancelled.",
        order.id, order.status
      ))),
      None => Err(AppError::Internal("Order was not loaded before cancelling.".to_string())),
    }
  });

  p.on("cancel_and_restock", |ctx: ContextData<CancelOrderCtxData>| async move {
    let (order_id, store) = {
      let guard = ctx.read();
      (guard.order_id, guard.app_state.store.clone())
    };
    let receipt = store.cancel_order(order_id, Utc::now()).await?;
    for product_id in &receipt.unresolved_products {
      warn!(%order_id, %product_id, "Cancelled order references an unknown product; stock not restored.");
    }
    info!(
      %order_id,
      restored = receipt.restored.len(),
      unresolved = receipt.unresolved_products.len(),
      "Order cancelled."
    );
    let mut guard = ctx.write();
    guard.order = Some(receipt.order.clone());
    guard.receipt = Some(receipt);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(p);
}
