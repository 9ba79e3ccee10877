pub mod bag;
pub mod cancel;
pub mod context;
pub mod control;
pub mod diagnostics;
pub mod operation;
pub mod rule;
pub mod task;

// Re-export key types for easier access from other tessera modules (and lib.rs)
pub use bag::{Bag, BagKey};
pub use cancel::CancelSignal;
pub use context::MutationContext;
pub use control::{AbortReason, PipelineResult, PipelineStatus};
pub use diagnostics::{Diagnostics, Scope, ValidationError};
pub use operation::{Operation, Stage};
pub use rule::{Rule, RuleSet};
pub use task::{FnTask, Task};
