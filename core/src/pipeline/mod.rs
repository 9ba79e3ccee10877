// tessera/src/pipeline/mod.rs

//! Defines the `Pipeline<T>` struct, its registration surface, and execution logic.

pub mod definition;
pub mod execution;

// Re-export the main Pipeline struct
pub use definition::Pipeline;
