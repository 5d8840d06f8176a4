// hortifruti-core/src/flow/mod.rs

//! Asynchronous step-pipeline engine used to orchestrate the storefront's
//! multi-step operations (cart, checkout, PIX charge, webhook, cancellation).

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod registry;
pub mod step;

pub use context_data::ContextData;
pub use control::{FlowOutcome, StepControl};
pub use definition::{Flow, StepHandler};
pub use registry::FlowRegistry;
pub use step::{SkipCondition, StepDef};
