// hortifruti-server/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use chrono::Utc;
use hortifruti_core::domain::cart::validate_quantity;
use hortifruti_core::domain::CartItem;
use hortifruti_core::{ContextData, Flow, FlowRegistry, StepControl, StepDef};
use tracing::{info, warn};

pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Flow::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    vec![
      StepDef::required("validate_cart_input"),
      StepDef::required("fetch_product_for_cart"),
      StepDef::required("load_existing_cart_line"),
      StepDef::required("check_stock_for_cart"),
      StepDef::required("save_cart_line"),
    ],
  );

  p.on("validate_cart_input", |ctx: ContextData<AddToCartCtxData>| async move {
    let quantity = ctx.read().quantity;
    validate_quantity(quantity)?;
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("fetch_product_for_cart", |ctx: ContextData<AddToCartCtxData>| async move {
    let (product_id, store) = {
      let guard = ctx.read();
      (guard.product_id, guard.app_state.store.clone())
    };
    let product = store
      .get_product(product_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Product {} not found.", product_id)))?;
    ctx.write().product = Some(product);
    Ok::<_, AppError>(StepControl::Continue)
  });

  p.on("load_existing_cart_line", |ctx: ContextData<AddToCartCtxData>| async move {
    let (user_id, product_id, store) = {
      let guard = ctx.read();
      (guard.user.user_id.clone(), guard.product_id, guard.app_state.store.clone())
    };
    let existing = store.find_cart_item_by_product(&user_id, product_id).await?;
    ctx.write().existing_item = existing;
    Ok::<_, AppError>(StepControl::Continue)
  });

  // Soft cap: the merged line may not exceed what is on the shelf right now.
  p.on("check_stock_for_cart", |ctx: ContextData<AddToCartCtxData>| async move {
    let guard = ctx.read();
    let product = guard
      .product
      .as_ref()
      .ok_or_else(|| AppError::Internal("Product was not loaded before the stock check.".to_string()))?;
    let in_cart = guard.existing_item.as_ref().map_or(0, |i| i.quantity);
    let wanted = in_cart.saturating_add(guard.quantity);
    if let Err(e) = product.ensure_available(wanted) {
      warn!(product_id = %product.id, wanted, stock = product.stock, "Add to cart exceeds stock.");
      return Err(e.into());
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  // A line for the same product is merged by the store, not here.
  p.on("save_cart_line", |ctx: ContextData<AddToCartCtxData>| async move {
    let (line, store) = {
      let guard = ctx.read();
      let product = guard
        .product
        .as_ref()
        .ok_or_else(|| AppError::Internal("Product was not loaded before saving the cart line.".to_string()))?;
      let line = CartItem::from_product(&guard.user.user_id, product, guard.quantity, Utc::now())?;
      (line, guard.app_state.store.clone())
    };

    let item = store.add_cart_quantity(&line).await?;
    info!(item_id = %item.id, product_id = %item.product_id, quantity = item.quantity, "Cart line saved.");
    ctx.write().saved_item = Some(item);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(p);
}
