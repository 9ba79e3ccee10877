// tessera/src/core/control.rs

//! Defines the outcome of a pipeline run.

use crate::core::bag::Bag;
use crate::core::context::MutationContext;
use crate::core::diagnostics::Diagnostics;
use crate::error::TesseraError;

/// Why a task aborted the run.
#[derive(Debug)]
pub enum AbortReason {
  /// The task's `run` returned `Ok(false)`.
  Declined,
  /// The task's `run` returned an error.
  Error(TesseraError),
}

/// How a run ended.
#[derive(Debug)]
pub enum PipelineStatus {
  /// Every applicable rule passed and every eligible task succeeded.
  Completed,
  /// One or more rules failed. No task ran. The failures are in `context.errors()`.
  Rejected,
  /// A task failed; no later task ran. Earlier tasks' mutations are kept.
  Aborted { task: String, reason: AbortReason },
  /// The cancel signal fired between two tasks.
  Cancelled { reason: Option<String> },
}

/// The status of a run together with the context it ran on.
#[derive(Debug)]
pub struct PipelineResult<T> {
  pub status: PipelineStatus,
  pub context: MutationContext<T>,
}

impl<T> PipelineResult<T> {
  pub fn is_success(&self) -> bool {
    matches!(self.status, PipelineStatus::Completed)
  }

  pub fn is_rejected(&self) -> bool {
    matches!(self.status, PipelineStatus::Rejected)
  }

  pub fn errors(&self) -> &Diagnostics {
    &self.context.errors
  }

  pub fn bag(&self) -> &Bag {
    &self.context.bag
  }

  pub fn target(&self) -> &T {
    self.context.target()
  }

  /// Name of the task that aborted the run, if any.
  pub fn aborted_task(&self) -> Option<&str> {
    match &self.status {
      PipelineStatus::Aborted { task, .. } => Some(task.as_str()),
      _ => None,
    }
  }

  /// The mutated target on success, the full result otherwise.
  pub fn into_target(self) -> Result<T, Self> {
    if self.is_success() {
      Ok(self.context.into_target())
    } else {
      Err(self)
    }
  }
}
