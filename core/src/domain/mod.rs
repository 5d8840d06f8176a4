// hortifruti-core/src/domain/mod.rs

pub mod address;
pub mod cart;
pub mod error;
pub mod order;
pub mod pricing;
pub mod product;
pub mod shipping;
pub mod tax_id;

pub use address::{Address, NewAddress, PostalCode};
pub use cart::{CartItem, CartSummary, LineItem, SupplierGroup};
pub use error::DomainError;
pub use order::{Order, OrderStatus, PaymentMethod, PaymentUpdate, PaymentUpdateOutcome, PixCharge};
pub use pricing::OrderTotals;
pub use product::Product;
pub use shipping::ShippingQuote;
pub use tax_id::Cpf;
