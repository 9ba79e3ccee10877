// tessera/src/registry.rs

//! Defines `PipelineRegistry`, a type-keyed table of pipelines built once at
//! startup and read-only afterwards.
//!
//! Each entity type `T` has at most one `Pipeline<T>`. Registration happens on
//! a `PipelineRegistryBuilder`; `build()` validates the set and freezes it.

use crate::core::cancel::CancelSignal;
use crate::core::context::MutationContext;
use crate::core::control::PipelineResult;
use crate::core::operation::Stage;
use crate::error::{TesseraError, TesseraResult};
use crate::pipeline::definition::Pipeline;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// Type-erased view of a registered pipeline.
trait AnyPipelineEntry: Send + Sync {
  fn as_any(&self) -> &dyn Any;
  fn entity_type(&self) -> &'static str;
  fn rule_count(&self) -> usize;
  fn task_count(&self) -> usize;
}

struct PipelineWrapper<T>
where
  T: 'static + Send + Sync,
{
  pipeline: Arc<Pipeline<T>>,
}

impl<T> AnyPipelineEntry for PipelineWrapper<T>
where
  T: 'static + Send + Sync,
{
  fn as_any(&self) -> &dyn Any {
    self
  }

  fn entity_type(&self) -> &'static str {
    std::any::type_name::<T>()
  }

  fn rule_count(&self) -> usize {
    self.pipeline.rule_count()
  }

  fn task_count(&self) -> usize {
    self.pipeline.task_count()
  }
}

/// Collects pipelines during startup.
#[derive(Default)]
pub struct PipelineRegistryBuilder {
  entries: HashMap<TypeId, Box<dyn AnyPipelineEntry>>,
  duplicates: Vec<&'static str>,
}

impl PipelineRegistryBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers the pipeline for entity type `T`. Registering a second
  /// pipeline for the same `T` makes `build()` fail.
  pub fn register<T>(&mut self, pipeline: Pipeline<T>) -> &mut Self
  where
    T: 'static + Send + Sync,
  {
    let type_name = std::any::type_name::<T>();
    event!(
      Level::DEBUG,
      entity_type = %type_name,
      rules = pipeline.rule_count(),
      tasks = pipeline.task_count(),
      "Registering pipeline."
    );
    let wrapper = PipelineWrapper {
      pipeline: Arc::new(pipeline),
    };
    if self.entries.insert(TypeId::of::<T>(), Box::new(wrapper)).is_some() {
      event!(Level::ERROR, entity_type = %type_name, "Pipeline registered twice for one entity type.");
      self.duplicates.push(type_name);
    }
    self
  }

  pub fn build(self) -> TesseraResult<PipelineRegistry> {
    if !self.duplicates.is_empty() {
      return Err(TesseraError::Configuration {
        message: format!("More than one pipeline registered for: {}", self.duplicates.join(", ")),
      });
    }
    let entries = self
      .entries
      .into_iter()
      .map(|(type_id, entry)| (type_id, Arc::from(entry)))
      .collect();
    Ok(PipelineRegistry { entries })
  }
}

/// Frozen type-keyed table of pipelines. Cheap to share behind an `Arc`.
pub struct PipelineRegistry {
  entries: HashMap<TypeId, Arc<dyn AnyPipelineEntry>>,
}

impl PipelineRegistry {
  pub fn builder() -> PipelineRegistryBuilder {
    PipelineRegistryBuilder::new()
  }

  pub fn contains<T: 'static>(&self) -> bool {
    self.entries.contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The pipeline registered for `T`, if any.
  pub fn pipeline<T>(&self) -> TesseraResult<Option<Arc<Pipeline<T>>>>
  where
    T: 'static + Send + Sync,
  {
    let Some(entry) = self.entries.get(&TypeId::of::<T>()) else {
      return Ok(None);
    };
    match entry.as_any().downcast_ref::<PipelineWrapper<T>>() {
      Some(wrapper) => Ok(Some(wrapper.pipeline.clone())),
      None => {
        let expected = std::any::type_name::<T>();
        event!(Level::ERROR, expected, found = entry.entity_type(), "Registry entry type mismatch.");
        Err(TesseraError::Internal(format!(
          "Registry entry for {} holds a pipeline for {}",
          expected,
          entry.entity_type()
        )))
      }
    }
  }

  /// Runs the pipeline registered for `T`. An entity type with nothing
  /// registered has no rules and no tasks, so the run trivially completes.
  pub async fn execute<T>(&self, ctx: MutationContext<T>, stage_filter: Stage) -> TesseraResult<PipelineResult<T>>
  where
    T: 'static + Send + Sync,
  {
    match self.pipeline::<T>()? {
      Some(pipeline) => Ok(pipeline.execute(ctx, stage_filter).await),
      None => {
        event!(Level::DEBUG, entity_type = %std::any::type_name::<T>(), "No pipeline registered; running empty pipeline.");
        Ok(Pipeline::<T>::new().execute(ctx, stage_filter).await)
      }
    }
  }

  pub async fn execute_until<T>(
    &self,
    ctx: MutationContext<T>,
    stage_filter: Stage,
    cancel: &CancelSignal,
  ) -> TesseraResult<PipelineResult<T>>
  where
    T: 'static + Send + Sync,
  {
    match self.pipeline::<T>()? {
      Some(pipeline) => Ok(pipeline.execute_until(ctx, stage_filter, cancel).await),
      None => Ok(Pipeline::<T>::new().execute_until(ctx, stage_filter, cancel).await),
    }
  }
}

impl fmt::Debug for PipelineRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut list = f.debug_list();
    for entry in self.entries.values() {
      list.entry(&format_args!(
        "{} (rules: {}, tasks: {})",
        entry.entity_type(),
        entry.rule_count(),
        entry.task_count()
      ));
    }
    list.finish()
  }
}
