// hortifruti-core/src/flow/execution.rs

use super::context_data::ContextData;
use super::control::{FlowOutcome, StepControl};
use super::definition::Flow;
use super::step::StepDef;
use crate::error::FlowError;
use tracing::{debug, error, info, info_span, instrument, Instrument};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Within a step the `before`, `on` and `after` handlers run in that order.
  /// The first handler error aborts the run and is returned as is.
  #[instrument(name = "Flow::run", skip_all, fields(flow = %self.name, steps = self.steps.len()), err(Display))]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, Err> {
    for (index, step) in self.steps.iter().enumerate() {
      let span = info_span!("flow_step", step = %step.name, index);
      if self.run_step(step, &ctx_data).instrument(span).await? == StepControl::Stop {
        return Ok(FlowOutcome::Stopped);
      }
    }
    debug!("Flow completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_step(&self, step: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<StepControl, Err> {
    if let Some(skip_if) = &step.skip_if {
      if skip_if(ctx_data) {
        debug!("Step skipped by its skip condition.");
        return Ok(StepControl::Continue);
      }
    }

    let handlers = match self.handlers.get(&step.name) {
      Some(handlers) if !handlers.is_empty() => handlers,
      _ if step.optional => {
        debug!("Optional step has no handlers, skipping.");
        return Ok(StepControl::Continue);
      }
      _ => {
        error!("Required step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }
    };

    for (phase, phase_handlers) in handlers.phases() {
      for handler in phase_handlers {
        match handler(ctx_data.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Stop) => {
            info!(phase, "Flow stopped by a step handler.");
            return Ok(StepControl::Stop);
          }
          Err(e) => {
            error!(phase, error = %e, "Step handler failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(StepControl::Continue)
  }
}
