// hortifruti-core/src/flow/definition.rs

//! The `Flow<TData, Err>` type: an ordered list of named steps and the
//! handlers attached to each of them.

use super::context_data::ContextData;
use super::control::StepControl;
use super::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A step handler after type erasure of the user's future.
pub type StepHandler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;

/// Handlers of a single step, grouped by the phase they run in.
pub(crate) struct StepHandlers<TData: 'static + Send + Sync, Err> {
  pub(crate) before: Vec<StepHandler<TData, Err>>,
  pub(crate) on: Vec<StepHandler<TData, Err>>,
  pub(crate) after: Vec<StepHandler<TData, Err>>,
}

impl<TData: 'static + Send + Sync, Err> StepHandlers<TData, Err> {
  fn new() -> Self {
    Self {
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.before.is_empty() && self.on.is_empty() && self.after.is_empty()
  }

  pub(crate) fn phases(&self) -> [(&'static str, &[StepHandler<TData, Err>]); 3] {
    [
      ("before", self.before.as_slice()),
      ("on", self.on.as_slice()),
      ("after", self.after.as_slice()),
    ]
  }
}

#[derive(Clone, Copy)]
enum Phase {
  Before,
  On,
  After,
}

/// A named, multi-step business process over a context `TData`.
///
/// Handlers return `Result<StepControl, Err>`. `Err` must absorb engine
/// failures (`From<FlowError>`) so a run always reports through one error type.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, StepHandlers<TData, Err>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(name: &str, steps: Vec<StepDef<TData>>) -> Self {
    Self {
      name: name.to_string(),
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Runs ahead of the step's `on` handlers; the usual home for preconditions.
  pub fn before<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + 'static,
  {
    self.attach(Phase::Before, step_name, handler_fn);
  }

  pub fn on<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + 'static,
  {
    self.attach(Phase::On, step_name, handler_fn);
  }

  pub fn after<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + 'static,
  {
    self.attach(Phase::After, step_name, handler_fn);
  }

  fn attach<F, HandlerErr>(
    &mut self,
    phase: Phase,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + 'static,
  {
    // A typo in a step name is a wiring bug, caught the first time the flow is built.
    assert!(
      self.steps.iter().any(|s| s.name == step_name),
      "flow '{}' has no step named '{}'",
      self.name,
      step_name
    );

    let handler: StepHandler<TData, Err> = Box::new(move |ctx_data| {
      let fut = handler_fn(ctx_data);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });

    let slot = self.handlers.entry(step_name.to_string()).or_insert_with(StepHandlers::new);
    match phase {
      Phase::Before => slot.before.push(handler),
      Phase::On => slot.on.push(handler),
      Phase::After => slot.after.push(handler),
    }
  }
}
