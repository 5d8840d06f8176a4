// tests/address_shipping_tests.rs
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use hortifruti_core::domain::Address;
use hortifruti_server::store::Store;
use serde_json::{json, Value};

#[actix_web::test]
async fn health_check_answers_ok() {
  let app = test_app();
  let service = init_app!(app.state);
  let req = test::TestRequest::get().uri("/api/v1/health").to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body, json!({"status": "ok"}));
}

#[actix_web::test]
async fn shipping_quote_follows_the_fee_table() {
  let app = test_app();
  let service = init_app!(app.state);

  let req = test::TestRequest::get().uri("/api/v1/shipping/12500-001").to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body["postal_code"], "12500001");
  assert_eq!(body["fee"], "3.00");
  assert_eq!(body["out_of_delivery_area"], false);

  let req = test::TestRequest::get().uri("/api/v1/shipping/99999999").to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body["fee"], "40.00");
  assert_eq!(body["out_of_delivery_area"], true);

  let req = test::TestRequest::get().uri("/api/v1/shipping/123").to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn address_is_validated_and_quoted_on_creation() {
  let app = test_app();
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/addresses")
    .insert_header(bearer(BUYER))
    .set_json(json!({
      "postal_code": "12.510-500",
      "street": "Rua das Flores",
      "number": "100",
      "neighborhood": "Centro",
      "city": "Guaratinguetá",
      "state": "sp"
    }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let address: Address = serde_json::from_value(body["address"].clone()).unwrap();
  assert_eq!(address.postal_code.as_str(), "12510500");
  assert_eq!(address.state, "SP");
  assert_eq!(address.owner_user_id, BUYER);
  assert_eq!(body["shipping"]["fee"], "10.00");

  let bad = test::TestRequest::post()
    .uri("/api/v1/addresses")
    .insert_header(bearer(BUYER))
    .set_json(json!({
      "postal_code": "1234",
      "street": "Rua das Flores",
      "number": "100",
      "neighborhood": "Centro",
      "city": "Guaratinguetá",
      "state": "SP"
    }))
    .to_request();
  assert_eq!(test::call_service(&service, bad).await.status(), StatusCode::BAD_REQUEST);

  assert_eq!(app.store.list_addresses(BUYER).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn addresses_are_private_to_their_owner() {
  let app = test_app();
  let address = seed_address(&app.store, BUYER, "12505-500").await;
  let service = init_app!(app.state);

  let list = test::TestRequest::get().uri("/api/v1/addresses").insert_header(bearer(OTHER_BUYER)).to_request();
  let addresses: Vec<Address> = test::call_and_read_body_json(&service, list).await;
  assert!(addresses.is_empty());

  let foreign_delete = test::TestRequest::delete()
    .uri(&format!("/api/v1/addresses/{}", address.id))
    .insert_header(bearer(OTHER_BUYER))
    .to_request();
  assert_eq!(test::call_service(&service, foreign_delete).await.status(), StatusCode::NOT_FOUND);

  let delete = test::TestRequest::delete()
    .uri(&format!("/api/v1/addresses/{}", address.id))
    .insert_header(bearer(BUYER))
    .to_request();
  assert_eq!(test::call_service(&service, delete).await.status(), StatusCode::NO_CONTENT);
  assert!(app.store.list_addresses(BUYER).await.unwrap().is_empty());
}

#[actix_web::test]
async fn products_are_readable_without_a_token() {
  let app = test_app();
  let banana = seed_product(&app.store, "Banana", "Sítio Boa Vista", 1000, 10).await;
  let service = init_app!(app.state);

  let list = test::TestRequest::get().uri("/api/v1/products").to_request();
  let body: Value = test::call_and_read_body_json(&service, list).await;
  assert_eq!(body.as_array().unwrap().len(), 1);

  let one = test::TestRequest::get().uri(&format!("/api/v1/products/{}", banana.id)).to_request();
  let body: Value = test::call_and_read_body_json(&service, one).await;
  assert_eq!(body["name"], "Banana");

  let missing = test::TestRequest::get()
    .uri(&format!("/api/v1/products/{}", uuid::Uuid::new_v4()))
    .to_request();
  assert_eq!(test::call_service(&service, missing).await.status(), StatusCode::NOT_FOUND);
}
