// hortifruti-server/src/web/routes.rs

use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  address_handlers, cart_handlers, checkout_handlers, order_handlers, payment_handlers, product_handlers,
  shipping_handlers, webhook_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Headers that let the mobile and web clients call the PIX endpoint cross-origin.
fn pix_cors_headers() -> DefaultHeaders {
  DefaultHeaders::new()
    .add(("Access-Control-Allow-Origin", "*"))
    .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
    .add(("Access-Control-Allow-Headers", "Authorization, Content-Type"))
    .add(("Access-Control-Max-Age", "3600"))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  // Malformed bodies are reported like any other validation failure.
  cfg.app_data(
    web::JsonConfig::default()
      .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into()),
  );

  cfg
    .service(
      web::resource("/criarPixHortifruti")
        .wrap(pix_cors_headers())
        .route(web::post().to(payment_handlers::create_pix_charge_handler))
        .route(web::method(actix_web::http::Method::OPTIONS).to(payment_handlers::pix_preflight_handler)),
    )
    .service(
      web::resource("/notificacaoPix")
        .route(web::post().to(webhook_handlers::pix_notification_handler))
        .route(web::get().to(webhook_handlers::pix_notification_handler)),
    )
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/items/{item_id}", web::patch().to(cart_handlers::update_cart_item_handler))
            .route("/items/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
        )
        .service(
          web::scope("/addresses")
            .route("", web::get().to(address_handlers::list_addresses_handler))
            .route("", web::post().to(address_handlers::create_address_handler))
            .route("/{address_id}", web::delete().to(address_handlers::delete_address_handler)),
        )
        .route(
          "/shipping/{postal_code}",
          web::get().to(shipping_handlers::quote_shipping_handler),
        )
        .route("/checkout", web::post().to(checkout_handlers::start_checkout_handler))
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
            .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
        ),
    );
}
