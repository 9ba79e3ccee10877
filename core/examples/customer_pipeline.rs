// tessera/examples/customer_pipeline.rs

use async_trait::async_trait;
use std::sync::Arc;
use tessera::{
  BagKey, FnTask, MemoryStore, MutationContext, Operation, Pipeline, PipelineRegistry, PipelineStatus, RecordSource,
  RuleSet, Stage, Task, TesseraResult,
};
use tracing::info;

// 1. Define the entity under mutation
#[derive(Clone, Debug, Default)]
struct Customer {
  id: u32,
  name: String,
  email: String,
  credit_limit: i64,
  tier: Option<String>,
}

// 2. Bag keys for cross-task communication
const EMAIL_TAKEN: BagKey<bool> = BagKey::new("customer.email_taken");
const AUDIT: BagKey<Vec<String>> = BagKey::new("customer.audit");

// 3. A task with an injected lookup collaborator
struct UniqueEmail {
  store: Arc<MemoryStore<Customer>>,
}

#[async_trait]
impl Task<Customer> for UniqueEmail {
  fn name(&self) -> &str {
    "unique_email"
  }

  fn run_order(&self) -> i32 {
    10
  }

  fn stage(&self) -> Stage {
    Stage::BEFORE_INSERT | Stage::BEFORE_UPDATE
  }

  async fn run(&self, ctx: &mut MutationContext<Customer>) -> TesseraResult<bool> {
    let id = ctx.target().id;
    let email = ctx.target().email.clone();
    let same_email = move |c: &Customer| c.id != id && c.email == email;
    let taken = !self.store.lookup(&same_email).await?.is_empty();
    ctx.bag.insert(EMAIL_TAKEN, taken);
    Ok(true)
  }
}

fn customer_pipeline(store: Arc<MemoryStore<Customer>>) -> Pipeline<Customer> {
  let mut pipeline = Pipeline::<Customer>::new();
  pipeline
    .add_rule(
      RuleSet::new("customer_fields")
        .check("name", |c: &Customer| !c.name.trim().is_empty(), "Required", "Name is required")
        .check("email", |c: &Customer| c.email.contains('@'), "InvalidEmail", "Email is not valid")
        .check(
          "credit_limit",
          |c: &Customer| c.credit_limit >= 0,
          "OutOfRange",
          "Credit limit cannot be negative",
        ),
    )
    .add_task(UniqueEmail { store })
    .add_task(FnTask::new(
      "reject_duplicate",
      20,
      Stage::BEFORE_INSERT | Stage::BEFORE_UPDATE,
      |ctx: &mut MutationContext<Customer>| Ok(!ctx.bag.get(EMAIL_TAKEN).copied().unwrap_or(false)),
    ))
    .add_task(
      FnTask::new(
        "assign_gold_tier",
        30,
        Stage::ALL_BEFORE,
        |ctx: &mut MutationContext<Customer>| {
          ctx.target_mut().tier = Some("gold".to_string());
          ctx.bag.insert(AUDIT, vec!["tier upgraded".to_string()]);
          Ok(true)
        },
      )
      .when(|ctx: &MutationContext<Customer>| ctx.target().credit_limit >= 10_000),
    );
  pipeline
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Customer Pipeline Example ---");

  let store = Arc::new(MemoryStore::from_records(vec![Customer {
    id: 1,
    name: "Ada".to_string(),
    email: "ada@example.com".to_string(),
    credit_limit: 500,
    tier: None,
  }]));

  // 4. Register once at startup; the registry is read-only afterwards
  let mut builder = PipelineRegistry::builder();
  builder.register(customer_pipeline(store.clone()));
  let registry = builder.build()?;
  info!("Registry: {:?}", registry);

  // 5. A valid insert with a large credit limit
  let grace = Customer {
    id: 2,
    name: "Grace".to_string(),
    email: "grace@example.com".to_string(),
    credit_limit: 25_000,
    tier: None,
  };
  let result = registry
    .execute(MutationContext::insert(grace), Stage::before(Operation::Insert))
    .await?;
  info!("Grace: {:?}, tier = {:?}", result.status, result.target().tier);
  assert!(result.is_success());
  if let Ok(customer) = result.into_target() {
    store.insert(customer);
  }

  // 6. An invalid record: every rule failure is reported in one pass
  let broken = Customer {
    id: 3,
    name: " ".to_string(),
    email: "nobody".to_string(),
    credit_limit: -1,
    tier: None,
  };
  let rejected = registry
    .execute(MutationContext::insert(broken), Stage::before(Operation::Insert))
    .await?;
  for error in rejected.errors() {
    info!("Validation: {}", error);
  }
  assert_eq!(rejected.errors().len(), 3);

  // 7. A duplicate email aborts in the task stage
  let duplicate = Customer {
    id: 4,
    name: "Imposter".to_string(),
    email: "ada@example.com".to_string(),
    credit_limit: 0,
    tier: None,
  };
  let aborted = registry
    .execute(MutationContext::insert(duplicate), Stage::before(Operation::Insert))
    .await?;
  if let PipelineStatus::Aborted { task, reason } = &aborted.status {
    info!("Aborted by '{}': {:?}", task, reason);
  }
  assert_eq!(aborted.aborted_task(), Some("reject_duplicate"));
  assert_eq!(store.len(), 2);

  Ok(())
}
