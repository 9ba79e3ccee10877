// tessera/src/core/rule.rs

//! Validation rules: non-mutating units that contribute failures to a run.
//!
//! Rules are registered once at startup and shared across every run, so they
//! must not keep per-run state. The `Rule<T>` trait is the seam; `RuleSet<T>`
//! is the declarative form most callers use, an ordered list of
//! (scope, predicate, code) checks over the target.

use crate::core::context::MutationContext;
use crate::core::diagnostics::{Diagnostics, Scope, ValidationError};
use crate::core::operation::Operation;
use std::fmt;

pub trait Rule<T>: Send + Sync {
  /// Used in tracing spans.
  fn name(&self) -> &str;

  fn run_order(&self) -> i32 {
    0
  }

  /// Whether the rule should run for a context of the given operation.
  fn applies_to(&self, _operation: Operation) -> bool {
    true
  }

  /// Inspects the context and appends any failures to `errors`.
  fn evaluate(&self, ctx: &MutationContext<T>, errors: &mut Diagnostics);
}

type CheckPredicate<T> = Box<dyn Fn(&MutationContext<T>) -> bool + Send + Sync + 'static>;

struct Check<T> {
  scope: Scope,
  passes: CheckPredicate<T>,
  code: String,
  message: String,
}

/// Declarative rule: each check passes when its predicate returns `true`.
///
/// Every check is evaluated on every run; a failing check never hides the
/// ones after it.
pub struct RuleSet<T> {
  name: String,
  run_order: i32,
  operations: Option<Vec<Operation>>,
  checks: Vec<Check<T>>,
}

impl<T: 'static> RuleSet<T> {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      run_order: 0,
      operations: None,
      checks: Vec::new(),
    }
  }

  pub fn with_run_order(mut self, run_order: i32) -> Self {
    self.run_order = run_order;
    self
  }

  /// Restricts the rule set to the listed operations. Without this it applies to all of them.
  pub fn on(mut self, operations: &[Operation]) -> Self {
    self.operations = Some(operations.to_vec());
    self
  }

  /// Adds a check on one field of the target.
  pub fn check(
    self,
    field: impl Into<String>,
    passes: impl Fn(&T) -> bool + Send + Sync + 'static,
    code: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    self.check_context(Scope::field(field), move |ctx| passes(ctx.target()), code, message)
  }

  /// Adds a check on the record as a whole.
  pub fn check_entity(
    self,
    passes: impl Fn(&T) -> bool + Send + Sync + 'static,
    code: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    self.check_context(Scope::Entity, move |ctx| passes(ctx.target()), code, message)
  }

  /// Adds a check that can look at the whole context, e.g. a bag value or the operation.
  pub fn check_context(
    mut self,
    scope: Scope,
    passes: impl Fn(&MutationContext<T>) -> bool + Send + Sync + 'static,
    code: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    self.checks.push(Check {
      scope,
      passes: Box::new(passes),
      code: code.into(),
      message: message.into(),
    });
    self
  }

  pub fn len(&self) -> usize {
    self.checks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.checks.is_empty()
  }
}

impl<T: 'static> Rule<T> for RuleSet<T> {
  fn name(&self) -> &str {
    &self.name
  }

  fn run_order(&self) -> i32 {
    self.run_order
  }

  fn applies_to(&self, operation: Operation) -> bool {
    self.operations.as_ref().map_or(true, |ops| ops.contains(&operation))
  }

  fn evaluate(&self, ctx: &MutationContext<T>, errors: &mut Diagnostics) {
    for check in &self.checks {
      if !(check.passes)(ctx) {
        errors.push(ValidationError::new(check.scope.clone(), check.code.clone(), check.message.clone()));
      }
    }
  }
}

impl<T> fmt::Debug for RuleSet<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let codes: Vec<&str> = self.checks.iter().map(|c| c.code.as_str()).collect();
    f.debug_struct("RuleSet")
      .field("name", &self.name)
      .field("run_order", &self.run_order)
      .field("operations", &self.operations)
      .field("checks", &codes)
      .finish()
  }
}
