// tessera/src/dispatch/envelope.rs

//! Wire-level message wrapper routed by the dispatcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An inbound message: routing identity plus a type-specific payload.
///
/// Wire shape (JSON):
/// `{ "EntityId": "...", "RoutingType": "...", "EnterpriseId": "...",
///    "CorrelationId": "...", "Metadata": {...}, "Payload": {...} }`
///
/// Identity fields default to empty when absent so that a message missing
/// them still parses and is rejected by `validate_routing` instead, keeping
/// "bad structure" and "missing identity" apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityEnvelope<P> {
  #[serde(default)]
  pub entity_id: String,
  #[serde(default)]
  pub routing_type: String,
  #[serde(default)]
  pub enterprise_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub correlation_id: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub metadata: BTreeMap<String, String>,
  pub payload: P,
}

impl<P> EntityEnvelope<P> {
  pub fn new(
    entity_id: impl Into<String>,
    routing_type: impl Into<String>,
    enterprise_id: impl Into<String>,
    payload: P,
  ) -> Self {
    Self {
      entity_id: entity_id.into(),
      routing_type: routing_type.into(),
      enterprise_id: enterprise_id.into(),
      correlation_id: None,
      metadata: BTreeMap::new(),
      payload,
    }
  }

  pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
    self.correlation_id = Some(correlation_id.into());
    self
  }

  pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.metadata.insert(key.into(), value.into());
    self
  }

  /// Checks that the routing identity is present and well formed.
  /// Returns the wire name of the first offending field.
  pub fn validate_routing(&self) -> Result<(), &'static str> {
    for (field, value) in [
      ("EnterpriseId", &self.enterprise_id),
      ("EntityId", &self.entity_id),
      ("RoutingType", &self.routing_type),
    ] {
      if !is_well_formed_identifier(value) {
        return Err(field);
      }
    }
    Ok(())
  }

  /// Swaps the payload, keeping the routing identity.
  pub fn map_payload<Q>(self, f: impl FnOnce(P) -> Q) -> EntityEnvelope<Q> {
    EntityEnvelope {
      entity_id: self.entity_id,
      routing_type: self.routing_type,
      enterprise_id: self.enterprise_id,
      correlation_id: self.correlation_id,
      metadata: self.metadata,
      payload: f(self.payload),
    }
  }

  pub fn try_map_payload<Q, E>(self, f: impl FnOnce(P) -> Result<Q, E>) -> Result<EntityEnvelope<Q>, E> {
    let payload = f(self.payload)?;
    Ok(EntityEnvelope {
      entity_id: self.entity_id,
      routing_type: self.routing_type,
      enterprise_id: self.enterprise_id,
      correlation_id: self.correlation_id,
      metadata: self.metadata,
      payload,
    })
  }
}

// Non-blank, no surrounding whitespace, no control characters.
fn is_well_formed_identifier(value: &str) -> bool {
  !value.is_empty() && value.trim() == value && !value.chars().any(char::is_control)
}
