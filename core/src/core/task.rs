// tessera/src/core/task.rs

//! Staged, possibly mutating units of pipeline logic.

use crate::core::context::MutationContext;
use crate::core::operation::Stage;
use crate::error::TesseraResult;
use async_trait::async_trait;
use std::fmt;

/// A unit of work that runs after validation passed.
///
/// Tasks are shared between concurrent runs of different records, so any
/// injected collaborator (a lookup source, a client) must be safe to call
/// concurrently and the task itself must not keep per-run fields. Per-run
/// data goes in the context's bag.
///
/// `run` returning `Ok(false)` or `Err(_)` aborts the pipeline; tasks after
/// it never start and earlier mutations stay in place.
#[async_trait]
pub trait Task<T: Send + Sync>: Send + Sync {
  fn name(&self) -> &str;

  fn run_order(&self) -> i32 {
    0
  }

  /// Lifecycle points at which the task is eligible.
  fn stage(&self) -> Stage;

  /// Run gate, checked right before `run`. Sees the effects of earlier tasks.
  fn should_run(&self, _ctx: &MutationContext<T>) -> bool {
    true
  }

  async fn run(&self, ctx: &mut MutationContext<T>) -> TesseraResult<bool>;
}

type Gate<T> = Box<dyn Fn(&MutationContext<T>) -> bool + Send + Sync + 'static>;

/// Adapts a synchronous closure into a `Task`.
pub struct FnTask<T, F> {
  name: String,
  run_order: i32,
  stage: Stage,
  gate: Option<Gate<T>>,
  body: F,
}

impl<T, F> FnTask<T, F>
where
  T: Send + Sync + 'static,
  F: Fn(&mut MutationContext<T>) -> TesseraResult<bool> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>, run_order: i32, stage: Stage, body: F) -> Self {
    Self {
      name: name.into(),
      run_order,
      stage,
      gate: None,
      body,
    }
  }

  /// Sets the `should_run` gate.
  pub fn when(mut self, gate: impl Fn(&MutationContext<T>) -> bool + Send + Sync + 'static) -> Self {
    self.gate = Some(Box::new(gate));
    self
  }
}

#[async_trait]
impl<T, F> Task<T> for FnTask<T, F>
where
  T: Send + Sync + 'static,
  F: Fn(&mut MutationContext<T>) -> TesseraResult<bool> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn run_order(&self) -> i32 {
    self.run_order
  }

  fn stage(&self) -> Stage {
    self.stage
  }

  fn should_run(&self, ctx: &MutationContext<T>) -> bool {
    self.gate.as_ref().map_or(true, |gate| gate(ctx))
  }

  async fn run(&self, ctx: &mut MutationContext<T>) -> TesseraResult<bool> {
    (self.body)(ctx)
  }
}

impl<T, F> fmt::Debug for FnTask<T, F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnTask")
      .field("name", &self.name)
      .field("run_order", &self.run_order)
      .field("stage", &self.stage)
      .field("gate_present", &self.gate.is_some())
      .finish()
  }
}
