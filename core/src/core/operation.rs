// tessera/src/core/operation.rs

//! The kind of mutation a pipeline run performs, and the lifecycle stages
//! at which tasks may be eligible to run.

use bitflags::bitflags;
use std::fmt;

/// The operation a `MutationContext` was created for. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
  Insert,
  Update,
  Delete,
  Read,
}

impl Operation {
  pub const ALL: [Operation; 4] = [Operation::Insert, Operation::Update, Operation::Delete, Operation::Read];
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Operation::Insert => "insert",
      Operation::Update => "update",
      Operation::Delete => "delete",
      Operation::Read => "read",
    };
    f.write_str(name)
  }
}

bitflags! {
  /// Bitmask of lifecycle points at which a task is eligible.
  ///
  /// A task declares the stages it cares about; a run passes a stage filter and
  /// only tasks whose mask intersects the filter are considered.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct Stage: u8 {
    const BEFORE_INSERT = 1 << 0;
    const BEFORE_UPDATE = 1 << 1;
    const BEFORE_DELETE = 1 << 2;
    const AFTER_INSERT = 1 << 3;
    const AFTER_UPDATE = 1 << 4;
    const AFTER_DELETE = 1 << 5;

    const ALL_BEFORE = Self::BEFORE_INSERT.bits() | Self::BEFORE_UPDATE.bits() | Self::BEFORE_DELETE.bits();
    const ALL_AFTER = Self::AFTER_INSERT.bits() | Self::AFTER_UPDATE.bits() | Self::AFTER_DELETE.bits();
    const ALL = Self::ALL_BEFORE.bits() | Self::ALL_AFTER.bits();
  }
}

impl Stage {
  pub const NONE: Stage = Stage::empty();

  /// The "before" stage matching an operation. `Read` has no lifecycle stage.
  pub fn before(operation: Operation) -> Stage {
    match operation {
      Operation::Insert => Stage::BEFORE_INSERT,
      Operation::Update => Stage::BEFORE_UPDATE,
      Operation::Delete => Stage::BEFORE_DELETE,
      Operation::Read => Stage::NONE,
    }
  }

  /// The "after" stage matching an operation. `Read` has no lifecycle stage.
  pub fn after(operation: Operation) -> Stage {
    match operation {
      Operation::Insert => Stage::AFTER_INSERT,
      Operation::Update => Stage::AFTER_UPDATE,
      Operation::Delete => Stage::AFTER_DELETE,
      Operation::Read => Stage::NONE,
    }
  }
}
