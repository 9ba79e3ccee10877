// tessera/src/dispatch/processor.rs

//! Routing keys and the `Processor` trait implemented by type-specific message handlers.

use crate::dispatch::envelope::EntityEnvelope;
use crate::dispatch::dispatcher::DispatchError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use thiserror::Error;

/// The closed set of entity types messages can be routed to.
///
/// Usually a fieldless enum. `ALL` lists every variant so the dispatcher can
/// check at startup that each one has exactly one processor.
pub trait RoutingKind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
  const ALL: &'static [Self];

  /// The `RoutingType` string carried on the wire.
  fn as_str(&self) -> &'static str;

  fn parse(routing_type: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|kind| kind.as_str() == routing_type)
  }
}

/// Failure reported by a processor. The variant decides whether the
/// transport should redeliver the message.
#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("Retriable processing failure. Source: {source}")]
  Retriable {
    #[source]
    source: anyhow::Error,
  },

  #[error("Fatal processing failure. Source: {source}")]
  Fatal {
    #[source]
    source: anyhow::Error,
  },
}

impl ProcessError {
  pub fn retriable(err: impl Into<anyhow::Error>) -> Self {
    ProcessError::Retriable { source: err.into() }
  }

  pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
    ProcessError::Fatal { source: err.into() }
  }

  pub fn is_retriable(&self) -> bool {
    matches!(self, ProcessError::Retriable { .. })
  }
}

/// Handler for one routing kind.
///
/// A processor is shared by every concurrent dispatch, so it must not keep
/// per-message state. `Payload` is the type the envelope's payload is
/// deserialized into before `process` is called.
#[async_trait]
pub trait Processor<K: RoutingKind>: Send + Sync {
  type Payload: DeserializeOwned + Send + 'static;

  /// The one routing kind this processor handles.
  fn routing_kind(&self) -> K;

  async fn process(&self, envelope: EntityEnvelope<Self::Payload>) -> Result<(), ProcessError>;
}

/// Type-erased processor stored in the dispatcher's routing table.
#[async_trait]
pub(crate) trait AnyProcessor<K: RoutingKind>: Send + Sync {
  fn routing_kind(&self) -> K;

  fn processor_type(&self) -> &'static str;

  async fn process_raw(&self, envelope: EntityEnvelope<Value>) -> Result<(), DispatchError>;
}

pub(crate) struct ProcessorWrapper<K, P> {
  processor: P,
  _phantom_kind: PhantomData<fn() -> K>,
}

impl<K, P> ProcessorWrapper<K, P> {
  pub(crate) fn new(processor: P) -> Self {
    Self {
      processor,
      _phantom_kind: PhantomData,
    }
  }
}

#[async_trait]
impl<K, P> AnyProcessor<K> for ProcessorWrapper<K, P>
where
  K: RoutingKind,
  P: Processor<K> + 'static,
{
  fn routing_kind(&self) -> K {
    self.processor.routing_kind()
  }

  fn processor_type(&self) -> &'static str {
    std::any::type_name::<P>()
  }

  async fn process_raw(&self, envelope: EntityEnvelope<Value>) -> Result<(), DispatchError> {
    let routing_type = envelope.routing_type.clone();
    let typed = envelope.try_map_payload(|payload| {
      serde_json::from_value::<P::Payload>(payload).map_err(|source| DispatchError::MalformedPayload {
        routing_type: routing_type.clone(),
        payload_type: std::any::type_name::<P::Payload>(),
        source,
      })
    })?;

    self
      .processor
      .process(typed)
      .await
      .map_err(|source| DispatchError::Processing { routing_type, source })
  }
}
