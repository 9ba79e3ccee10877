// tessera/src/core/context.rs

//! Defines `MutationContext<T>`, the unit of work threaded through one pipeline run.

use crate::core::bag::Bag;
use crate::core::diagnostics::Diagnostics;
use crate::core::operation::Operation;

/// The record under mutation plus everything rules and tasks share during one run.
///
/// The context is owned by the caller that built it, moved into
/// `Pipeline::execute`, and handed back inside the `PipelineResult`. Rules see
/// it by shared reference; tasks get `&mut` one at a time, so a task's writes
/// to the target or bag are visible to every task after it.
#[derive(Debug)]
pub struct MutationContext<T> {
  target: T,
  operation: Operation,
  pub bag: Bag,
  pub(crate) errors: Diagnostics,
}

impl<T> MutationContext<T> {
  pub fn new(target: T, operation: Operation) -> Self {
    Self {
      target,
      operation,
      bag: Bag::new(),
      errors: Diagnostics::new(),
    }
  }

  pub fn insert(target: T) -> Self {
    Self::new(target, Operation::Insert)
  }

  pub fn update(target: T) -> Self {
    Self::new(target, Operation::Update)
  }

  pub fn delete(target: T) -> Self {
    Self::new(target, Operation::Delete)
  }

  pub fn operation(&self) -> Operation {
    self.operation
  }

  pub fn target(&self) -> &T {
    &self.target
  }

  pub fn target_mut(&mut self) -> &mut T {
    &mut self.target
  }

  /// Rule failures from this run. Only the rule stage writes them, so the
  /// list is fixed once tasks start.
  pub fn errors(&self) -> &Diagnostics {
    &self.errors
  }

  pub fn into_target(self) -> T {
    self.target
  }

  /// Resets per-run state. The pipeline calls this at the start of every run.
  pub(crate) fn begin_run(&mut self) {
    self.bag.clear();
    self.errors = Diagnostics::new();
  }
}
