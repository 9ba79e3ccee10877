// tessera/src/pipeline/execution.rs

//! Contains `Pipeline::execute()`, which runs the rule stage and then the task
//! stage against one `MutationContext<T>`.

use crate::core::cancel::CancelSignal;
use crate::core::context::MutationContext;
use crate::core::control::{AbortReason, PipelineResult, PipelineStatus};
use crate::core::diagnostics::Diagnostics;
use crate::core::operation::Stage;
use crate::error::TesseraError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Level};

impl<T> Pipeline<T>
where
  T: 'static + Send + Sync,
{
  /// Runs every applicable rule, then (if none failed) every task whose stage
  /// intersects `stage_filter`.
  ///
  /// The rule stage accumulates: all applicable rules run and every failure
  /// lands in `context.errors()`. The task stage fails fast: the first task that
  /// declines or errors ends the run.
  pub async fn execute(&self, ctx: MutationContext<T>, stage_filter: Stage) -> PipelineResult<T> {
    self.run_stages(ctx, stage_filter, None).await
  }

  /// Like `execute`, but checks `cancel` before each task. A task that has
  /// already started always finishes.
  pub async fn execute_until(
    &self,
    ctx: MutationContext<T>,
    stage_filter: Stage,
    cancel: &CancelSignal,
  ) -> PipelineResult<T> {
    self.run_stages(ctx, stage_filter, Some(cancel)).await
  }

  #[instrument(
        name = "Pipeline::execute",
        skip_all,
        fields(
            entity_type = %std::any::type_name::<T>(),
            operation = %ctx.operation(),
            stage_filter = ?stage_filter,
            num_rules = self.rules.len(),
            num_tasks = self.tasks.len(),
        )
    )]
  async fn run_stages(
    &self,
    mut ctx: MutationContext<T>,
    stage_filter: Stage,
    cancel: Option<&CancelSignal>,
  ) -> PipelineResult<T> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    ctx.begin_run();

    // Rule stage
    let operation = ctx.operation();
    for (rule_idx, rule) in self.rules.iter().enumerate() {
      if !rule.applies_to(operation) {
        continue;
      }
      let rule_span = span!(
        Level::DEBUG,
        "pipeline_rule",
        rule = rule.name(),
        rule_index = rule_idx,
        run_order = rule.run_order()
      );
      let _rule_span_guard = rule_span.enter();

      let mut found = Diagnostics::new();
      rule.evaluate(&ctx, &mut found);
      if !found.is_empty() {
        event!(Level::DEBUG, failures = found.len(), "Rule reported validation failures.");
      }
      ctx.errors.append(found);
    }

    if !ctx.errors.is_empty() {
      event!(Level::INFO, failures = ctx.errors.len(), "Validation failed; tasks skipped.");
      return PipelineResult {
        status: PipelineStatus::Rejected,
        context: ctx,
      };
    }

    // Task stage
    for (task_idx, task) in self.tasks.iter().enumerate() {
      if !task.stage().intersects(stage_filter) {
        continue;
      }

      if let Some(signal) = cancel {
        if signal.is_cancelled() {
          event!(Level::INFO, next_task = task.name(), "Pipeline cancelled between tasks.");
          return PipelineResult {
            status: PipelineStatus::Cancelled {
              reason: signal.reason(),
            },
            context: ctx,
          };
        }
      }

      let task_span = span!(
        Level::INFO,
        "pipeline_task",
        task = task.name(),
        task_index = task_idx,
        run_order = task.run_order()
      );
      // The span guard must be dropped before `run` is awaited.
      let should_run = {
        let _task_span_guard = task_span.enter();
        task.should_run(&ctx)
      };
      if !should_run {
        event!(parent: &task_span, Level::DEBUG, "Task gate declined; skipping.");
        continue;
      }

      event!(parent: &task_span, Level::TRACE, "Running task.");
      let abort_reason = match task.run(&mut ctx).await {
        Ok(true) => None,
        Ok(false) => {
          event!(parent: &task_span, Level::INFO, "Task declined; aborting pipeline.");
          Some(AbortReason::Declined)
        }
        Err(e) => {
          event!(parent: &task_span, Level::ERROR, error = %e, "Task failed; aborting pipeline.");
          let wrapped = match e {
            already @ TesseraError::TaskFailed { .. } => already,
            other => TesseraError::TaskFailed {
              task: task.name().to_string(),
              source: anyhow::Error::new(other),
            },
          };
          Some(AbortReason::Error(wrapped))
        }
      };

      if let Some(reason) = abort_reason {
        return PipelineResult {
          status: PipelineStatus::Aborted {
            task: task.name().to_string(),
            reason,
          },
          context: ctx,
        };
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    PipelineResult {
      status: PipelineStatus::Completed,
      context: ctx,
    }
  }
}
