// hortifruti-server/src/pipelines/checkout_pipeline.rs

//! Cart to order. The cart is cleared only after the order is stored; a
//! failed order insert leaves the cart as it was.

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use chrono::Utc;
use hortifruti_core::domain::{shipping, Order};
use hortifruti_core::{ContextData, Flow, FlowRegistry, StepControl, StepDef};
use tracing::{error, info, warn};

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Flow::<CheckoutCtxData, AppError>::new(
    "checkout",
    vec![
      StepDef::required("load_cart_for_checkout"),
      StepDef::required("resolve_shipping_address"),
      StepDef::required("quote_shipping"),
      StepDef::required("assemble_order"),
      StepDef::required("place_order"),
      StepDef::optional("clear_cart").skip_if(|ctx: &ContextData<CheckoutCtxData>| !ctx.read().order_placed),
    ],
  );

  p.on("load_cart_for_checkout", |ctx: ContextData<CheckoutCtxData>| async move {
    let (user_id, store) = {
      let guard = ctx.read();
      (guard.user.user_id.clone(), guard.app_state.store.clone())
    };
    let items = store.list_cart(&user_id).await?;
    if items.is_empty() {
      warn!(%user_id, "Checkout attempted with an empty cart.");
      return Err(AppError::Validation("Cart is empty.".to_string()));
    }
    info!(%user_id, lines = items.len(), "Cart loaded for checkout.");
    ctx.write().cart_items = items;
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("resolve_shipping_address", |ctx: ContextData<CheckoutCtxData>| async move {
    let (user_id, address_id, store) = {
      let guard = ctx.read();
      (guard.user.user_id.clone(), guard.address_id, guard.app_state.store.clone())
    };
    // Someone else's address is reported exactly like a missing one.
    let address = store
      .get_address(address_id)
      .await?
      .filter(|a| a.owner_user_id == user_id)
      .ok_or_else(|| AppError::NotFound(format!("Address {} not found.", address_id)))?;
    ctx.write().address = Some(address);
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("quote_shipping", |ctx: ContextData<CheckoutCtxData>| async move {
    let mut guard = ctx.write();
    let postal_code = guard
      .address
      .as_ref()
      .map(|a| a.postal_code.clone())
      .ok_or_else(|| AppError::Internal("Address was not resolved before quoting shipping.".to_string()))?;
    let quote = shipping::quote(&postal_code);
    if quote.out_of_delivery_area {
      warn!(postal_code = %postal_code, fee = %quote.fee, "Shipping address is outside the delivery area.");
    }
    guard.quote = Some(quote);
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("assemble_order", |ctx: ContextData<CheckoutCtxData>| async move {
    let mut guard = ctx.write();
    let (address, quote) = match (guard.address.clone(), guard.quote) {
      (Some(address), Some(quote)) => (address, quote),
      _ => {
        return Err(AppError::Internal(
          "Address and shipping quote must be ready before assembling the order.".to_string(),
        ))
      }
    };
    let order = Order::assemble(
      &guard.user.user_id,
      &guard.cart_items,
      address,
      quote,
      guard.payment_method,
      Utc::now(),
    )?;
    info!(
      order_id = %order.id,
      external_reference = %order.external_reference,
      total = %order.total,
      "Order assembled."
    );
    guard.order = Some(order);
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("place_order", |ctx: ContextData<CheckoutCtxData>| async move {
    let (order, store) = {
      let guard = ctx.read();
      let order = guard
        .order
        .clone()
        .ok_or_else(|| AppError::Internal("Order was not assembled before placing it.".to_string()))?;
      (order, guard.app_state.store.clone())
    };
    let unknown_products = store.place_order(&order).await?;
    for product_id in &unknown_products {
      warn!(order_id = %order.id, %product_id, "Ordered product no longer exists; stock not decremented.");
    }
    info!(order_id = %order.id, "Order stored.");
    ctx.write().order_placed = true;
    Ok::<_, AppError>(StepControl::Continue)
  });

  // The order already exists at this point, so a failure here only leaves stale lines behind.
  p.on("clear_cart", |ctx: ContextData<CheckoutCtxData>| async move {
    let (user_id, store) = {
      let guard = ctx.read();
      (guard.user.user_id.clone(), guard.app_state.store.clone())
    };
    match store.clear_cart(&user_id).await {
      Ok(removed) => {
        info!(%user_id, removed, "Cart cleared after checkout.");
        ctx.write().cart_cleared = true;
      }
      Err(e) => error!(%user_id, error = %e, "Failed to clear cart after checkout; order is kept."),
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(p);
}
