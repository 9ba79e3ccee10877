// tessera/src/pipeline/definition.rs

//! Contains the `Pipeline<T>` struct definition and the methods that register
//! rules and tasks on it.

use crate::core::operation::{Operation, Stage};
use crate::core::rule::Rule;
use crate::core::task::Task;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// The ordered rules and tasks for one entity type `T`.
///
/// Both lists are kept sorted by ascending run order; entries with equal run
/// order stay in registration order. Ordering is settled at registration, so
/// every run over the same registration set visits units in the same order.
pub struct Pipeline<T>
where
  T: 'static + Send + Sync,
{
  pub(crate) rules: Vec<Arc<dyn Rule<T>>>,
  pub(crate) tasks: Vec<Arc<dyn Task<T>>>,
}

impl<T> Pipeline<T>
where
  T: 'static + Send + Sync,
{
  pub fn new() -> Self {
    Self {
      rules: Vec::new(),
      tasks: Vec::new(),
    }
  }

  pub fn add_rule(&mut self, rule: impl Rule<T> + 'static) -> &mut Self {
    self.add_shared_rule(Arc::new(rule))
  }

  /// Registers a rule instance that may also be registered elsewhere.
  pub fn add_shared_rule(&mut self, rule: Arc<dyn Rule<T>>) -> &mut Self {
    let order = rule.run_order();
    // Insert after every entry with run_order <= order: stable with respect to registration.
    let idx = self.rules.partition_point(|r| r.run_order() <= order);
    event!(Level::DEBUG, rule = %rule.name(), run_order = order, position = idx, "Rule registered.");
    self.rules.insert(idx, rule);
    self
  }

  pub fn add_task(&mut self, task: impl Task<T> + 'static) -> &mut Self {
    self.add_shared_task(Arc::new(task))
  }

  pub fn add_shared_task(&mut self, task: Arc<dyn Task<T>>) -> &mut Self {
    let order = task.run_order();
    let idx = self.tasks.partition_point(|t| t.run_order() <= order);
    event!(
      Level::DEBUG,
      task = %task.name(),
      run_order = order,
      stage = ?task.stage(),
      position = idx,
      "Task registered."
    );
    self.tasks.insert(idx, task);
    self
  }

  pub fn rule_count(&self) -> usize {
    self.rules.len()
  }

  pub fn task_count(&self) -> usize {
    self.tasks.len()
  }

  /// Names of rules applicable to `operation`, in evaluation order.
  pub fn rule_names_for(&self, operation: Operation) -> Vec<&str> {
    self
      .rules
      .iter()
      .filter(|r| r.applies_to(operation))
      .map(|r| r.name())
      .collect()
  }

  /// Names of tasks eligible under `stage_filter`, in execution order.
  pub fn task_names_for(&self, stage_filter: Stage) -> Vec<&str> {
    self
      .tasks
      .iter()
      .filter(|t| t.stage().intersects(stage_filter))
      .map(|t| t.name())
      .collect()
  }
}

impl<T> Default for Pipeline<T>
where
  T: 'static + Send + Sync,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<T> fmt::Debug for Pipeline<T>
where
  T: 'static + Send + Sync,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rules: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
    let tasks: Vec<&str> = self.tasks.iter().map(|t| t.name()).collect();
    f.debug_struct("Pipeline")
      .field("entity_type", &std::any::type_name::<T>())
      .field("rules", &rules)
      .field("tasks", &tasks)
      .finish()
  }
}
