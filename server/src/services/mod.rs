// hortifruti-server/src/services/mod.rs

pub mod auth_service;
pub mod mercado_pago;
pub mod payment_gateway;
pub mod payment_mock;
