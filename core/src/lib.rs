// src/lib.rs

//! Tessera: an ASYNC entity mutation pipeline with type-routed message dispatch.
//!
//! Tessera runs the logic that surrounds create/update/delete operations on
//! domain records, with features like:
//!  - Ordered validation rules that accumulate every failure in one pass.
//!  - Staged tasks (before/after insert/update/delete) with run gates,
//!    fail-fast abort, and a shared per-run bag for cross-task communication.
//!  - Cooperative cancellation between tasks.
//!  - A type-keyed pipeline registry built once at startup.
//!  - An envelope dispatcher that routes raw messages to one processor per
//!    routing kind, with ambiguity rejected at startup.
//!  - A batch walker that drives paginated bulk actions over a record source.

pub mod batch;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod store;

// --- Re-exports for the Public API ---

// Context, rule and task types that users will interact with frequently
pub use crate::core::bag::{Bag, BagKey};
pub use crate::core::cancel::CancelSignal;
pub use crate::core::context::MutationContext;
pub use crate::core::control::{AbortReason, PipelineResult, PipelineStatus};
pub use crate::core::diagnostics::{Diagnostics, Scope, ValidationError};
pub use crate::core::operation::{Operation, Stage};
pub use crate::core::rule::{Rule, RuleSet};
pub use crate::core::task::{FnTask, Task};

pub use crate::pipeline::definition::Pipeline;
pub use crate::registry::{PipelineRegistry, PipelineRegistryBuilder};

pub use crate::dispatch::{
  DispatchConfigError, DispatchError, DispatchOutcome, Dispatcher, DispatcherBuilder, EntityEnvelope, ProcessError,
  Processor, RoutingKind,
};

pub use crate::batch::{BatchWalker, Page, PageInfo, PagedSource, SearchCriteria, WalkSummary};
pub use crate::store::{MemoryStore, Predicate, RecordSource};

pub use crate::error::{TesseraError, TesseraResult};

/*
    Core Workflow:
    1. Define the entity type `T` under mutation.
    2. Build a `Pipeline<T>`: `add_rule(RuleSet::new(..).check(..))` for validation,
       `add_task(..)` for staged work (implement `Task<T>` or use `FnTask`).
    3. Register it on a `PipelineRegistryBuilder` and `build()` the registry once at startup.
    4. For each mutation, create a `MutationContext::new(record, Operation::Insert)` and call
       `registry.execute(ctx, Stage::before(Operation::Insert)).await`.
    5. On `PipelineStatus::Completed`, persist `result.context.into_target()`; on `Rejected`,
       surface `result.errors()` to the caller.
    6. For inbound messages, define a `RoutingKind` enum, implement `Processor<K>` per kind,
       build a `Dispatcher` (ambiguity fails here), and feed raw bytes to `dispatch_outcome`.
*/
