// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use tessera::{
  BagKey, MutationContext, Page, PagedSource, RuleSet, SearchCriteria, Stage, Task, TesseraError, TesseraResult,
};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Entity Types ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Customer {
  pub id: u32,
  pub name: String,
  pub email: String,
  pub credit_limit: i64,
  pub tier: Option<String>,
  pub processed: bool,
}

impl Customer {
  pub fn valid(id: u32, name: &str) -> Self {
    Customer {
      id,
      name: name.to_string(),
      email: format!("{}@example.com", name.to_lowercase()),
      credit_limit: 1_000,
      ..Default::default()
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Invoice {
  pub number: String,
  pub amount: i64,
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error)]
pub enum TestError {
  #[error("Tessera error: {0}")]
  Tessera(#[from] TesseraError),

  #[error("Test action failed: {0}")]
  Action(String),
}

// --- Bag keys shared by fixture tasks ---

/// Names of tasks in the order they ran.
pub const TRACE: BagKey<Vec<String>> = BagKey::new("test.trace");
pub const MARKER: BagKey<String> = BagKey::new("test.marker");

pub fn trace_of<T>(ctx: &MutationContext<T>) -> Vec<String> {
  ctx.bag.get(TRACE).cloned().unwrap_or_default()
}

/// What a `TraceTask` does after recording itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
  Succeed,
  Decline,
  Fail,
}

/// Appends its name to the `TRACE` bag entry, then behaves as configured.
pub struct TraceTask {
  pub name: String,
  pub run_order: i32,
  pub stage: Stage,
  pub behavior: Behavior,
}

impl TraceTask {
  pub fn new(name: &str, run_order: i32, stage: Stage) -> Self {
    Self {
      name: name.to_string(),
      run_order,
      stage,
      behavior: Behavior::Succeed,
    }
  }

  pub fn behaving(mut self, behavior: Behavior) -> Self {
    self.behavior = behavior;
    self
  }
}

#[async_trait]
impl<T: Send + Sync + 'static> Task<T> for TraceTask {
  fn name(&self) -> &str {
    &self.name
  }

  fn run_order(&self) -> i32 {
    self.run_order
  }

  fn stage(&self) -> Stage {
    self.stage
  }

  async fn run(&self, ctx: &mut MutationContext<T>) -> TesseraResult<bool> {
    match ctx.bag.get_mut(TRACE) {
      Some(trace) => trace.push(self.name.clone()),
      None => {
        ctx.bag.insert(TRACE, vec![self.name.clone()]);
      }
    }
    tracing::debug!(target: "test_tasks", task = %self.name, "trace task executed");
    match self.behavior {
      Behavior::Succeed => Ok(true),
      Behavior::Decline => Ok(false),
      Behavior::Fail => Err(TesseraError::from(anyhow::anyhow!("{} blew up", self.name))),
    }
  }
}

/// Customer rules: name and email required, credit limit not negative.
pub fn customer_rules() -> RuleSet<Customer> {
  RuleSet::new("customer_required_fields")
    .check("name", |c: &Customer| !c.name.trim().is_empty(), "Required", "Name is required")
    .check("email", |c: &Customer| c.email.contains('@'), "InvalidEmail", "Email is not valid")
    .check(
      "credit_limit",
      |c: &Customer| c.credit_limit >= 0,
      "OutOfRange",
      "Credit limit cannot be negative",
    )
}

// --- Paged source wrapper counting fetches ---
pub struct CountingSource<S> {
  pub inner: S,
  pub fetches: AtomicUsize,
}

impl<S> CountingSource<S> {
  pub fn new(inner: S) -> Self {
    Self {
      inner,
      fetches: AtomicUsize::new(0),
    }
  }

  pub fn fetches(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl<R, S> PagedSource<R> for CountingSource<S>
where
  R: Send + 'static,
  S: PagedSource<R>,
{
  type Filter = S::Filter;

  async fn page(&self, criteria: &SearchCriteria<Self::Filter>) -> TesseraResult<Page<R>> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    self.inner.page(criteria).await
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static PROCESSOR_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  PROCESSOR_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
