// tessera/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TesseraError {
  #[error("Task '{task}' failed. Source: {source}")]
  TaskFailed {
    task: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Invalid search criteria: {message}")]
  InvalidCriteria { message: String },

  #[error("Record source failed. Source: {source}")]
  SourceFailure {
    #[source]
    source: AnyhowError,
  },

  #[error("Error in user-provided collaborator. Source: {source}")]
  External {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error: {message}")]
  Configuration { message: String },

  #[error("Internal tessera error: {0}")]
  Internal(String),
}

impl TesseraError {
  /// Wraps any error raised while fetching records from a collaborator.
  pub fn source_failure(err: impl Into<AnyhowError>) -> Self {
    TesseraError::SourceFailure { source: err.into() }
  }
}

impl From<AnyhowError> for TesseraError {
  fn from(err: AnyhowError) -> Self {
    // Keep an already-typed TesseraError's variant if anyhow is only carrying it through.
    match err.downcast::<TesseraError>() {
      Ok(inner) => inner,
      Err(err) => TesseraError::External { source: err },
    }
  }
}

pub type TesseraResult<T, E = TesseraError> = std::result::Result<T, E>;
