// tessera/src/core/bag.rs

//! Shared scratch space for one pipeline run.
//!
//! Tasks communicate through the bag: a task at a lower run order writes a
//! value under a well-known key and a later task in the same run reads it. The
//! bag is cleared when a run starts. Keys are plain strings; `BagKey<V>` pairs a key
//! with the value type stored under it so concerns can publish typed,
//! namespaced constants such as `BagKey::<bool>::new("uniqueness.duplicate")`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A namespaced key bound to the type of the value stored under it.
pub struct BagKey<V: 'static> {
  name: &'static str,
  _phantom_value: PhantomData<fn() -> V>,
}

impl<V: 'static> BagKey<V> {
  pub const fn new(name: &'static str) -> Self {
    Self {
      name,
      _phantom_value: PhantomData,
    }
  }

  pub const fn name(&self) -> &'static str {
    self.name
  }
}

impl<V: 'static> Clone for BagKey<V> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<V: 'static> Copy for BagKey<V> {}

impl<V: 'static> fmt::Debug for BagKey<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BagKey")
      .field("name", &self.name)
      .field("value_type", &std::any::type_name::<V>())
      .finish()
  }
}

/// Key/value scratch mapping. Values are type-erased; reads with the wrong
/// type behave like a missing key.
#[derive(Default)]
pub struct Bag {
  entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Bag {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stores `value` under `key`, returning the previous value if it had the same type.
  pub fn insert<V: Send + Sync + 'static>(&mut self, key: BagKey<V>, value: V) -> Option<V> {
    self.insert_raw(key.name, value)
  }

  pub fn get<V: Send + Sync + 'static>(&self, key: BagKey<V>) -> Option<&V> {
    self.get_raw(key.name)
  }

  pub fn get_mut<V: Send + Sync + 'static>(&mut self, key: BagKey<V>) -> Option<&mut V> {
    self.entries.get_mut(key.name)?.downcast_mut::<V>()
  }

  pub fn remove<V: Send + Sync + 'static>(&mut self, key: BagKey<V>) -> Option<V> {
    let boxed = self.entries.remove(key.name)?;
    boxed.downcast::<V>().ok().map(|b| *b)
  }

  /// String-keyed insert for keys computed at run time.
  pub fn insert_raw<V: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: V) -> Option<V> {
    self
      .entries
      .insert(key.into(), Box::new(value))
      .and_then(|previous| previous.downcast::<V>().ok())
      .map(|b| *b)
  }

  pub fn get_raw<V: Send + Sync + 'static>(&self, key: &str) -> Option<&V> {
    self.entries.get(key)?.downcast_ref::<V>()
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

impl fmt::Debug for Bag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut keys: Vec<&str> = self.keys().collect();
    keys.sort_unstable();
    f.debug_struct("Bag").field("keys", &keys).finish()
  }
}
