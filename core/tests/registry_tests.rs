// tests/registry_tests.rs
mod common;

use common::*;
use hortifruti_core::{ContextData, Flow, FlowError, FlowOutcome, FlowRegistry, StepControl, StepDef};
use serial_test::serial;

#[derive(Debug, Default)]
struct OtherContext {
  visited: bool,
}

#[tokio::test]
#[serial]
async fn test_registry_dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut test_flow = Flow::<TestContext, TestError>::new("test", vec![StepDef::required("one")]);
  test_flow.on("one", create_simple_handler("one", "1"));
  registry.register(test_flow);

  let mut other_flow = Flow::<OtherContext, TestError>::new("other", vec![StepDef::required("visit")]);
  other_flow.on("visit", |ctx: ContextData<OtherContext>| async move {
    ctx.write().visited = true;
    Ok::<_, TestError>(StepControl::Continue)
  });
  registry.register(other_flow);

  assert!(registry.is_registered::<TestContext>());
  assert!(registry.is_registered::<OtherContext>());

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(registry.run(ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(ctx.read().message, "1");

  let other = ContextData::new(OtherContext::default());
  assert_eq!(registry.run(other.clone()).await, Ok(FlowOutcome::Completed));
  assert!(other.read().visited);
}

#[tokio::test]
#[serial]
async fn test_running_unregistered_context_fails() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let result = registry.run(ContextData::new(OtherContext::default())).await;

  match result {
    Err(TestError::Engine(msg)) => assert!(msg.contains("No flow registered"), "unexpected message: {msg}"),
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_registering_again_replaces_flow() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut first = Flow::<TestContext, TestError>::new("first", vec![StepDef::required("s")]);
  first.on("s", create_simple_handler("s", "first"));
  registry.register(first);

  let mut second = Flow::<TestContext, TestError>::new("second", vec![StepDef::required("s")]);
  second.on("s", create_simple_handler("s", "second"));
  registry.register(second);

  let ctx = ContextData::new(TestContext::default());
  registry.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "second");
}

#[tokio::test]
#[serial]
async fn test_default_registry_reports_flow_errors() {
  setup_tracing();
  let registry: FlowRegistry = FlowRegistry::default();
  let flow = Flow::<OtherContext, FlowError>::new("unwired", vec![StepDef::required("nothing")]);
  registry.register(flow);

  let result = registry.run(ContextData::new(OtherContext::default())).await;
  assert!(matches!(result, Err(FlowError::HandlerMissing { ref step_name }) if step_name == "nothing"));
}
