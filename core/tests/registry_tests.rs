// tests/registry_tests.rs
mod common;

use common::*;
use std::sync::Arc;
use tessera::{
  CancelSignal, FnTask, MutationContext, Pipeline, PipelineRegistry, PipelineStatus, RuleSet, Stage, TesseraError,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Shipment {
  tracking: String,
  dispatched: bool,
}

fn invoice_pipeline() -> Pipeline<Invoice> {
  let mut pipeline = Pipeline::<Invoice>::new();
  pipeline
    .add_rule(RuleSet::new("invoice_amount").check(
      "amount",
      |i: &Invoice| i.amount > 0,
      "OutOfRange",
      "Amount must be positive",
    ))
    .add_task(FnTask::new(
      "number_invoice",
      1,
      Stage::BEFORE_INSERT,
      |ctx: &mut MutationContext<Invoice>| {
        if ctx.target().number.is_empty() {
          ctx.target_mut().number = format!("INV-{:05}", ctx.target().amount);
        }
        Ok(true)
      },
    ));
  pipeline
}

fn customer_pipeline() -> Pipeline<Customer> {
  let mut pipeline = Pipeline::<Customer>::new();
  pipeline.add_rule(customer_rules()).add_task(FnTask::new(
    "mark_processed",
    1,
    Stage::ALL_BEFORE,
    |ctx: &mut MutationContext<Customer>| {
      ctx.target_mut().processed = true;
      Ok(true)
    },
  ));
  pipeline
}

#[tokio::test]
async fn test_registry_routes_by_entity_type() {
  setup_tracing();
  let mut builder = PipelineRegistry::builder();
  builder.register(invoice_pipeline()).register(customer_pipeline());
  let registry = builder.build().expect("registry should build");

  assert_eq!(registry.len(), 2);
  assert!(registry.contains::<Invoice>());
  assert!(registry.contains::<Customer>());
  assert!(!registry.contains::<Shipment>());

  let invoice = Invoice {
    number: String::new(),
    amount: 42,
  };
  let invoice_result = registry
    .execute(MutationContext::insert(invoice), Stage::BEFORE_INSERT)
    .await
    .unwrap();
  assert!(invoice_result.is_success());
  assert_eq!(invoice_result.target().number, "INV-00042");

  let customer_result = registry
    .execute(MutationContext::update(Customer::valid(1, "Ada")), Stage::BEFORE_UPDATE)
    .await
    .unwrap();
  assert!(customer_result.is_success());
  assert!(customer_result.target().processed);

  let rejected = registry
    .execute(
      MutationContext::insert(Invoice {
        number: "X".to_string(),
        amount: 0,
      }),
      Stage::BEFORE_INSERT,
    )
    .await
    .unwrap();
  assert_eq!(rejected.errors().codes(), vec!["OutOfRange"]);
}

#[tokio::test]
async fn test_unregistered_type_trivially_completes() {
  setup_tracing();
  let registry = PipelineRegistry::builder().build().unwrap();
  assert!(registry.is_empty());
  assert!(registry.pipeline::<Shipment>().unwrap().is_none());

  let shipment = Shipment {
    tracking: "1Z999".to_string(),
    dispatched: false,
  };
  let result = registry
    .execute(MutationContext::insert(shipment.clone()), Stage::ALL)
    .await
    .unwrap();

  assert!(matches!(result.status, PipelineStatus::Completed));
  assert_eq!(result.into_target().ok(), Some(shipment));
}

#[tokio::test]
async fn test_duplicate_registration_fails_at_build() {
  setup_tracing();
  let mut builder = PipelineRegistry::builder();
  builder
    .register(invoice_pipeline())
    .register(customer_pipeline())
    .register(Pipeline::<Invoice>::new());

  match builder.build() {
    Err(TesseraError::Configuration { message }) => {
      assert!(message.contains("Invoice"), "unexpected message: {}", message);
    }
    other => panic!("Expected a configuration error, got {:?}", other.map(|r| r.len())),
  }
}

#[tokio::test]
async fn test_registry_hands_out_the_registered_pipeline() {
  setup_tracing();
  let mut builder = PipelineRegistry::builder();
  builder.register(customer_pipeline());
  let registry = builder.build().unwrap();

  let pipeline = registry.pipeline::<Customer>().unwrap().expect("customer pipeline registered");
  assert_eq!(pipeline.rule_count(), 1);
  assert_eq!(pipeline.task_names_for(Stage::BEFORE_DELETE), vec!["mark_processed"]);

  let debug = format!("{:?}", registry);
  assert!(debug.contains("rules: 1, tasks: 1"), "debug output was {}", debug);
}

#[tokio::test]
async fn test_registry_execute_until_honours_cancel() {
  setup_tracing();
  let mut builder = PipelineRegistry::builder();
  builder.register(customer_pipeline());
  let registry = builder.build().unwrap();

  let cancel = CancelSignal::new();
  cancel.cancel("draining");
  let result = registry
    .execute_until(
      MutationContext::insert(Customer::valid(1, "Ada")),
      Stage::BEFORE_INSERT,
      &cancel,
    )
    .await
    .unwrap();

  assert!(matches!(result.status, PipelineStatus::Cancelled { .. }));
  assert!(!result.target().processed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_through_shared_registry() {
  setup_tracing();
  let mut builder = PipelineRegistry::builder();
  builder.register(customer_pipeline()).register(invoice_pipeline());
  let registry = Arc::new(builder.build().unwrap());

  let mut handles = Vec::new();
  for id in 0..32u32 {
    let registry = registry.clone();
    handles.push(tokio::spawn(async move {
      if id % 2 == 0 {
        let result = registry
          .execute(MutationContext::insert(Customer::valid(id, "Worker")), Stage::BEFORE_INSERT)
          .await?;
        assert!(result.is_success());
        assert_eq!(result.target().id, id);
        assert!(result.bag().is_empty());
      } else {
        let result = registry
          .execute(
            MutationContext::insert(Invoice {
              number: String::new(),
              amount: id as i64,
            }),
            Stage::BEFORE_INSERT,
          )
          .await?;
        assert_eq!(result.target().number, format!("INV-{:05}", id));
      }
      Ok::<(), TesseraError>(())
    }));
  }

  for handle in handles {
    handle.await.expect("worker panicked").expect("run errored");
  }
}
