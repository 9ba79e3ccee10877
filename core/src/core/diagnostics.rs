// tessera/src/core/diagnostics.rs

//! Validation failures collected during the rule stage of a run.

use std::fmt;

/// What a validation failure refers to: one field of the target, or the record as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
  Field(String),
  Entity,
}

impl Scope {
  pub fn field(name: impl Into<String>) -> Self {
    Scope::Field(name.into())
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::Field(name) => f.write_str(name),
      Scope::Entity => f.write_str("<entity>"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
  pub scope: Scope,
  pub code: String,
  pub message: String,
}

impl ValidationError {
  pub fn new(scope: Scope, code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      scope,
      code: code.into(),
      message: message.into(),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}]: {}", self.scope, self.code, self.message)
  }
}

/// Append-only, ordered list of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
  errors: Vec<ValidationError>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, error: ValidationError) {
    self.errors.push(error);
  }

  pub fn add(&mut self, scope: Scope, code: impl Into<String>, message: impl Into<String>) {
    self.push(ValidationError::new(scope, code, message));
  }

  /// Moves every failure from `other` to the end of this list.
  pub fn append(&mut self, other: Diagnostics) {
    self.errors.extend(other.errors);
  }

  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn len(&self) -> usize {
    self.errors.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
    self.errors.iter()
  }

  /// Error codes in the order they were recorded.
  pub fn codes(&self) -> Vec<&str> {
    self.errors.iter().map(|e| e.code.as_str()).collect()
  }

  pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
    self
      .errors
      .iter()
      .filter(move |e| matches!(&e.scope, Scope::Field(name) if name == field))
  }

  pub fn into_vec(self) -> Vec<ValidationError> {
    self.errors
  }
}

impl<'a> IntoIterator for &'a Diagnostics {
  type Item = &'a ValidationError;
  type IntoIter = std::slice::Iter<'a, ValidationError>;

  fn into_iter(self) -> Self::IntoIter {
    self.errors.iter()
  }
}
