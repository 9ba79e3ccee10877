// tessera/src/dispatch/mod.rs

//! Type-routed processing of inbound asynchronous messages.
//!
//! Raw bytes are parsed into an `EntityEnvelope`, its routing identity is
//! validated, and the envelope is handed to the `Processor` registered for
//! its `RoutingKind`. A processor will often build a `MutationContext` from
//! the payload and run it through a `PipelineRegistry`.

pub mod dispatcher;
pub mod envelope;
pub mod processor;

pub use dispatcher::{DispatchConfigError, DispatchError, DispatchOutcome, Dispatcher, DispatcherBuilder};
pub use envelope::EntityEnvelope;
pub use processor::{ProcessError, Processor, RoutingKind};
