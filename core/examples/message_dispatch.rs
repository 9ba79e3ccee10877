// tessera/examples/message_dispatch.rs

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tessera::{
  DispatchOutcome, Dispatcher, EntityEnvelope, MutationContext, Operation, Pipeline, PipelineRegistry, ProcessError,
  Processor, RoutingKind, RuleSet, Stage,
};
use tracing::info;

// 1. The closed set of routable entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Entity {
  Order,
  Refund,
}

impl RoutingKind for Entity {
  const ALL: &'static [Self] = &[Entity::Order, Entity::Refund];

  fn as_str(&self) -> &'static str {
    match self {
      Entity::Order => "Order",
      Entity::Refund => "Refund",
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Order {
  sku: String,
  quantity: u32,
}

// 2. One processor per routing kind
struct OrderProcessor {
  registry: Arc<PipelineRegistry>,
}

#[async_trait]
impl Processor<Entity> for OrderProcessor {
  type Payload = Order;

  fn routing_kind(&self) -> Entity {
    Entity::Order
  }

  async fn process(&self, envelope: EntityEnvelope<Order>) -> Result<(), ProcessError> {
    info!(entity_id = %envelope.entity_id, sku = %envelope.payload.sku, "Processing order.");
    let result = self
      .registry
      .execute(MutationContext::insert(envelope.payload), Stage::before(Operation::Insert))
      .await
      .map_err(ProcessError::retriable)?;
    if result.is_success() {
      Ok(())
    } else {
      Err(ProcessError::fatal(anyhow::anyhow!("order rejected: {:?}", result.errors().codes())))
    }
  }
}

#[derive(Debug, Deserialize)]
struct Refund {
  amount: i64,
}

struct RefundProcessor;

#[async_trait]
impl Processor<Entity> for RefundProcessor {
  type Payload = Refund;

  fn routing_kind(&self) -> Entity {
    Entity::Refund
  }

  async fn process(&self, envelope: EntityEnvelope<Refund>) -> Result<(), ProcessError> {
    if envelope.payload.amount > 1_000 {
      // Needs a manual approval that is not available yet.
      return Err(ProcessError::retriable(anyhow::anyhow!("approval service unavailable")));
    }
    Ok(())
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Message Dispatch Example ---");

  let mut orders = Pipeline::<Order>::new();
  orders.add_rule(RuleSet::new("order_fields").check(
    "quantity",
    |o: &Order| o.quantity > 0,
    "OutOfRange",
    "Quantity must be positive",
  ));
  let mut builder = PipelineRegistry::builder();
  builder.register(orders);
  let registry = Arc::new(builder.build()?);

  // 3. Ambiguity or a missing processor would fail right here
  let dispatcher = Dispatcher::builder()
    .register(OrderProcessor { registry })
    .register(RefundProcessor)
    .build()?;
  info!("Routing table: {:?}", dispatcher);

  let messages: Vec<(&str, Vec<u8>)> = vec![
    (
      "valid order",
      serde_json::to_vec(
        &EntityEnvelope::new("o-1", "Order", "acme", json!({ "sku": "BOLT-7", "quantity": 3 }))
          .with_correlation_id("req-1"),
      )?,
    ),
    (
      "zero quantity",
      serde_json::to_vec(&EntityEnvelope::new("o-2", "Order", "acme", json!({ "sku": "BOLT-7", "quantity": 0 })))?,
    ),
    (
      "large refund",
      serde_json::to_vec(&EntityEnvelope::new("r-1", "Refund", "acme", json!({ "amount": 5_000 })))?,
    ),
    (
      "missing enterprise",
      serde_json::to_vec(&json!({ "EntityId": "o-3", "RoutingType": "Order", "Payload": {} }))?,
    ),
    ("garbage", b"not json at all".to_vec()),
  ];

  // 4. The transport acknowledges, retries or dead-letters by outcome
  for (label, raw) in &messages {
    let outcome = dispatcher.dispatch_outcome(raw).await;
    info!("{:>20} -> {:?}", label, outcome);
  }

  assert_eq!(dispatcher.dispatch_outcome(&messages[0].1).await, DispatchOutcome::Success);
  assert_eq!(dispatcher.dispatch_outcome(&messages[1].1).await, DispatchOutcome::FatalFailure);
  assert_eq!(
    dispatcher.dispatch_outcome(&messages[2].1).await,
    DispatchOutcome::RetriableFailure
  );
  Ok(())
}
