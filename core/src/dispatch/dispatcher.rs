// tessera/src/dispatch/dispatcher.rs

//! Defines `Dispatcher<K>`, which turns raw inbound bytes into a typed
//! envelope and hands it to the one processor registered for its routing kind.
//!
//! The routing table is built once by `DispatcherBuilder::build` and never
//! changes afterwards. Ambiguous registration (two processors for one kind)
//! is rejected there, at startup, never at dispatch time.

use crate::dispatch::envelope::EntityEnvelope;
use crate::dispatch::processor::{AnyProcessor, ProcessError, Processor, ProcessorWrapper, RoutingKind};

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{event, field, instrument, Level, Span};

/// What the transport should do with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
  /// Acknowledge.
  Success,
  /// Leave for redelivery.
  RetriableFailure,
  /// Discard or dead-letter; redelivery cannot help.
  FatalFailure,
}

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("Malformed message: {source}")]
  Malformed {
    #[source]
    source: serde_json::Error,
  },

  #[error("Malformed payload for routing type '{routing_type}' (expected {payload_type}): {source}")]
  MalformedPayload {
    routing_type: String,
    payload_type: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("Message is missing required routing field '{field}'")]
  MissingRoutingField { field: &'static str },

  #[error("No processor registered for routing type '{routing_type}'")]
  Unrouted { routing_type: String },

  #[error("Processor for routing type '{routing_type}' failed: {source}")]
  Processing {
    routing_type: String,
    #[source]
    source: ProcessError,
  },
}

impl DispatchError {
  /// Maps the error onto the transport's acknowledge/retry/dead-letter decision.
  /// Only a processor's own retriable failure is worth redelivering.
  pub fn outcome(&self) -> DispatchOutcome {
    match self {
      DispatchError::Processing { source, .. } if source.is_retriable() => DispatchOutcome::RetriableFailure,
      _ => DispatchOutcome::FatalFailure,
    }
  }
}

/// Startup-time validation failure of the routing table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchConfigError {
  #[error("Routing type '{routing_type}' is claimed by more than one processor: {processors:?}")]
  Ambiguous {
    routing_type: &'static str,
    processors: Vec<&'static str>,
  },

  #[error("No processor registered for routing types: {routing_types:?}")]
  Unhandled { routing_types: Vec<&'static str> },
}

/// Collects processors during startup.
pub struct DispatcherBuilder<K: RoutingKind> {
  processors: Vec<Arc<dyn AnyProcessor<K>>>,
  allow_partial: bool,
}

impl<K: RoutingKind> DispatcherBuilder<K> {
  pub fn new() -> Self {
    Self {
      processors: Vec::new(),
      allow_partial: false,
    }
  }

  pub fn register<P>(mut self, processor: P) -> Self
  where
    P: Processor<K> + 'static,
  {
    event!(
      Level::DEBUG,
      routing_type = processor.routing_kind().as_str(),
      processor = std::any::type_name::<P>(),
      "Registering processor."
    );
    self.processors.push(Arc::new(ProcessorWrapper::new(processor)));
    self
  }

  /// Accepts a table that leaves some routing kinds without a processor.
  /// Messages for those kinds then fail with `DispatchError::Unrouted`.
  pub fn allow_partial(mut self) -> Self {
    self.allow_partial = true;
    self
  }

  pub fn build(self) -> Result<Dispatcher<K>, DispatchConfigError> {
    let mut routes: HashMap<K, Arc<dyn AnyProcessor<K>>> = HashMap::new();
    for processor in self.processors {
      let kind = processor.routing_kind();
      if let Some(existing) = routes.get(&kind) {
        let processors = vec![existing.processor_type(), processor.processor_type()];
        event!(Level::ERROR, routing_type = kind.as_str(), ?processors, "Ambiguous processor registration.");
        return Err(DispatchConfigError::Ambiguous {
          routing_type: kind.as_str(),
          processors,
        });
      }
      routes.insert(kind, processor);
    }

    if !self.allow_partial {
      let missing: Vec<&'static str> = K::ALL
        .iter()
        .filter(|kind| !routes.contains_key(*kind))
        .map(|kind| kind.as_str())
        .collect();
      if !missing.is_empty() {
        event!(Level::ERROR, ?missing, "Routing kinds without a processor.");
        return Err(DispatchConfigError::Unhandled { routing_types: missing });
      }
    }

    event!(Level::INFO, routes = routes.len(), "Dispatcher routing table built.");
    Ok(Dispatcher { routes })
  }
}

impl<K: RoutingKind> Default for DispatcherBuilder<K> {
  fn default() -> Self {
    Self::new()
  }
}

/// Routes raw messages to processors. Holds no mutable state; share it behind an `Arc`.
pub struct Dispatcher<K: RoutingKind> {
  routes: HashMap<K, Arc<dyn AnyProcessor<K>>>,
}

impl<K: RoutingKind> Dispatcher<K> {
  pub fn builder() -> DispatcherBuilder<K> {
    DispatcherBuilder::new()
  }

  /// The routing decision for a wire `RoutingType`: the kind, if a processor handles it.
  pub fn resolve(&self, routing_type: &str) -> Option<K> {
    K::parse(routing_type).filter(|kind| self.routes.contains_key(kind))
  }

  pub fn handles(&self, kind: K) -> bool {
    self.routes.contains_key(&kind)
  }

  /// Parses, validates, routes and processes one message.
  ///
  /// Failures are logged here at a level matching their kind: a missing
  /// routing field is a WARN (the message is discarded), a retriable
  /// processor failure is a WARN, everything else is an ERROR.
  #[instrument(
        name = "Dispatcher::dispatch",
        skip_all,
        fields(
            message_bytes = raw.len(),
            entity_id = field::Empty,
            routing_type = field::Empty,
            correlation_id = field::Empty,
        )
    )]
  pub async fn dispatch(&self, raw: &[u8]) -> Result<(), DispatchError> {
    let result = self.route(raw).await;
    if let Err(err) = &result {
      let outcome = err.outcome();
      match err {
        DispatchError::MissingRoutingField { .. } => {
          event!(Level::WARN, error = %err, ?outcome, "Discarding message with invalid routing identity.");
        }
        DispatchError::Processing { source, .. } if source.is_retriable() => {
          event!(Level::WARN, error = %err, ?outcome, "Processing failed; message will be redelivered.");
        }
        _ => {
          event!(Level::ERROR, error = %err, ?outcome, "Message cannot be processed.");
        }
      }
    }
    result
  }

  /// `dispatch`, reduced to the transport's acknowledge/retry/dead-letter decision.
  pub async fn dispatch_outcome(&self, raw: &[u8]) -> DispatchOutcome {
    match self.dispatch(raw).await {
      Ok(()) => DispatchOutcome::Success,
      Err(err) => err.outcome(),
    }
  }

  async fn route(&self, raw: &[u8]) -> Result<(), DispatchError> {
    let envelope: EntityEnvelope<Value> =
      serde_json::from_slice(raw).map_err(|source| DispatchError::Malformed { source })?;

    let span = Span::current();
    span.record("entity_id", envelope.entity_id.as_str());
    span.record("routing_type", envelope.routing_type.as_str());
    if let Some(correlation_id) = &envelope.correlation_id {
      span.record("correlation_id", correlation_id.as_str());
    }

    envelope
      .validate_routing()
      .map_err(|field| DispatchError::MissingRoutingField { field })?;

    let processor = K::parse(&envelope.routing_type)
      .and_then(|kind| self.routes.get(&kind))
      .ok_or_else(|| DispatchError::Unrouted {
        routing_type: envelope.routing_type.clone(),
      })?
      .clone();

    event!(Level::DEBUG, processor = processor.processor_type(), "Routing message to processor.");
    processor.process_raw(envelope).await?;
    event!(Level::DEBUG, "Message processed.");
    Ok(())
  }
}

impl<K: RoutingKind> fmt::Debug for Dispatcher<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_map();
    for (kind, processor) in &self.routes {
      map.entry(&kind.as_str(), &processor.processor_type());
    }
    map.finish()
  }
}
