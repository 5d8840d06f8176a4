// hortifruti-server/src/models/mod.rs

//! Wire formats of the payment endpoints. Field names follow the mobile
//! app and the payment provider, not Rust conventions.

pub mod notification;
pub mod pix;

pub use notification::{NotificationBody, NotificationQuery};
pub use pix::{PixCartLine, PixChargePayload, PixChargeResponse};
