// tests/checkout_tests.rs
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use hortifruti_core::domain::{Order, OrderStatus};
use hortifruti_server::store::Store;
use serde_json::json;

#[actix_web::test]
async fn checkout_places_order_clears_cart_and_takes_stock() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  let alface = seed_product(&app.store, "Alface", "Horta do Zé", 500, 4).await;
  seed_cart_line(&app.store, BUYER, &banana, 2).await;
  seed_cart_line(&app.store, BUYER, &alface, 1).await;
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id, "payment_method": "pix"}))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let order: Order = test::read_body_json(resp).await;

  assert_eq!(order.subtotal, dec(2500));
  assert_eq!(order.service_fee, dec(50));
  assert_eq!(order.shipping_fee, dec(500));
  assert_eq!(order.total, dec(3050));
  assert_eq!(order.status, OrderStatus::Pending);
  assert!(!order.out_of_delivery_area);
  assert_eq!(order.supplier_names, vec!["Horta do Zé", "Sítio Boa Vista"]);
  assert_eq!(order.line_items.len(), 2);
  assert!(order.external_reference.starts_with("hf-"));
  assert_eq!(order.external_reference.len(), 35);

  assert!(app.store.list_cart(BUYER).await.unwrap().is_empty());
  assert_eq!(app.store.product_stock(banana.id), Some(8));
  assert_eq!(app.store.product_stock(alface.id), Some(3));
  assert!(app.store.get_order(order.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn checkout_outside_delivery_area_charges_flat_fee() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  seed_cart_line(&app.store, BUYER, &banana, 1).await;
  let address = seed_address(&app.store, BUYER, "01310-100").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id}))
    .to_request();
  let order: Order = test::call_and_read_body_json(&service, req).await;
  assert!(order.out_of_delivery_area);
  assert_eq!(order.shipping_fee, dec(4000));
  assert_eq!(order.total, dec(1000) + dec(20) + dec(4000));
}

#[actix_web::test]
async fn checkout_with_empty_cart_is_rejected() {
  let app = test_app();
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id}))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::BAD_REQUEST);
  assert!(app.store.list_orders(BUYER).await.unwrap().is_empty());
}

#[actix_web::test]
async fn checkout_with_someone_elses_address_is_not_found() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  seed_cart_line(&app.store, BUYER, &banana, 1).await;
  let foreign = seed_address(&app.store, OTHER_BUYER, "12505-500").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": foreign.id}))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::NOT_FOUND);
  assert_eq!(app.store.list_cart(BUYER).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn checkout_rejects_unknown_payment_method() {
  let app = test_app();
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id, "payment_method": "boleto"}))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn failed_order_insert_leaves_cart_untouched() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  seed_cart_line(&app.store, BUYER, &banana, 2).await;
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  app.store.set_fail_order_inserts(true);
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id}))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::INTERNAL_SERVER_ERROR);

  let cart = app.store.list_cart(BUYER).await.unwrap();
  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].quantity, 2);
  assert_eq!(app.store.product_stock(banana.id), Some(10));
}

#[actix_web::test]
async fn short_stock_rejects_checkout_and_keeps_cart() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 5).await;
  let alface = seed_product(&app.store, "Alface", "Horta do Zé", 500, 5).await;
  seed_cart_line(&app.store, BUYER, &alface, 1).await;
  seed_cart_line(&app.store, BUYER, &banana, 3).await;
  // Someone else buys most of the bananas after they were carted.
  place_order(&app.store, OTHER_BUYER, &[(&banana, 4)], "12505-500").await;
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id}))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("only 1 unit(s) of Banana"), "{body}");

  assert!(app.store.list_orders(BUYER).await.unwrap().is_empty());
  assert_eq!(app.store.list_cart(BUYER).await.unwrap().len(), 2);
  assert_eq!(app.store.product_stock(banana.id), Some(1));
  assert_eq!(app.store.product_stock(alface.id), Some(5));
}

#[actix_web::test]
async fn failed_cart_clear_does_not_fail_checkout() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  seed_cart_line(&app.store, BUYER, &banana, 1).await;
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  app.store.set_fail_cart_clears(true);
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(BUYER))
    .set_json(json!({"address_id": address.id}))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::CREATED);
  assert_eq!(app.store.list_orders(BUYER).await.unwrap().len(), 1);
  assert_eq!(app.store.list_cart(BUYER).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn orders_are_listed_newest_first_and_scoped_to_owner() {
  let app = test_app();
  let (first, _, _) = standard_order(&app.store, BUYER).await;
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  place_order(&app.store, BUYER, &[(&banana, 1)], "12500-001").await;
  place_order(&app.store, OTHER_BUYER, &[(&banana, 1)], "12500-001").await;
  let service = init_app!(app.state);

  let req = test::TestRequest::get().uri("/api/v1/orders").insert_header(bearer(BUYER)).to_request();
  let orders: Vec<Order> = test::call_and_read_body_json(&service, req).await;
  assert_eq!(orders.len(), 2);

  let foreign = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", first.id))
    .insert_header(bearer(OTHER_BUYER))
    .to_request();
  assert_eq!(test::call_service(&service, foreign).await.status(), StatusCode::NOT_FOUND);

  let own = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", first.id))
    .insert_header(bearer(BUYER))
    .to_request();
  let fetched: Order = test::call_and_read_body_json(&service, own).await;
  assert_eq!(fetched.external_reference, first.external_reference);
}
