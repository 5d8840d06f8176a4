// hortifruti-core/src/lib.rs

//! Core of the Hortifruti Digital backend.
//!
//! - [`domain`]: carts, addresses, shipping bands, pricing and the order
//!   lifecycle, free of any I/O.
//! - [`flow`]: a small async step-pipeline engine. Every multi-step operation
//!   of the server (checkout, PIX charge, payment webhook, cancellation) is a
//!   named-step [`Flow`] with before/on/after handlers over a shared
//!   [`ContextData`], dispatched by context type through a [`FlowRegistry`].

pub mod domain;
pub mod error;
pub mod flow;

pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::{ContextData, Flow, FlowOutcome, FlowRegistry, SkipCondition, StepControl, StepDef, StepHandler};
