// tessera/src/store.rs

//! The read side of the persistence collaborator, plus an in-memory implementation.

use crate::batch::{Page, PageInfo, PagedSource, SearchCriteria};
use crate::error::{TesseraError, TesseraResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{event, Level};

pub type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync + 'static>;

/// Record lookups used by tasks. Implementations are shared by every
/// concurrent pipeline run and must be safe to call concurrently.
#[async_trait]
pub trait RecordSource<R>: Send + Sync {
  async fn lookup(&self, predicate: &(dyn for<'r> Fn(&'r R) -> bool + Send + Sync)) -> TesseraResult<Vec<R>>;
}

/// Records held in a `parking_lot::RwLock<Vec<R>>`.
///
/// Lock guards are never held across an `.await`.
#[derive(Debug, Default)]
pub struct MemoryStore<R> {
  records: RwLock<Vec<R>>,
}

impl<R> MemoryStore<R>
where
  R: Clone + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      records: RwLock::new(Vec::new()),
    }
  }

  pub fn from_records(records: Vec<R>) -> Self {
    Self {
      records: RwLock::new(records),
    }
  }

  pub fn insert(&self, record: R) {
    self.records.write().push(record);
  }

  /// Applies `update` to every matching record, returning how many matched.
  pub fn update_where(&self, predicate: impl Fn(&R) -> bool, mut update: impl FnMut(&mut R)) -> usize {
    let mut guard = self.records.write();
    let mut touched = 0;
    for record in guard.iter_mut().filter(|r| predicate(r)) {
      update(record);
      touched += 1;
    }
    touched
  }

  pub fn remove_where(&self, predicate: impl Fn(&R) -> bool) -> usize {
    let mut guard = self.records.write();
    let before = guard.len();
    guard.retain(|r| !predicate(r));
    before - guard.len()
  }

  pub fn len(&self) -> usize {
    self.records.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.read().is_empty()
  }

  pub fn snapshot(&self) -> Vec<R> {
    self.records.read().clone()
  }
}

#[async_trait]
impl<R> RecordSource<R> for MemoryStore<R>
where
  R: Clone + Send + Sync + 'static,
{
  async fn lookup(&self, predicate: &(dyn for<'r> Fn(&'r R) -> bool + Send + Sync)) -> TesseraResult<Vec<R>> {
    let matches: Vec<R> = self.records.read().iter().filter(|r| predicate(r)).cloned().collect();
    event!(Level::TRACE, matches = matches.len(), "Memory store lookup.");
    Ok(matches)
  }
}

#[async_trait]
impl<R> PagedSource<R> for MemoryStore<R>
where
  R: Clone + Send + Sync + 'static,
{
  /// `None` pages over every record.
  type Filter = Option<Predicate<R>>;

  async fn page(&self, criteria: &SearchCriteria<Self::Filter>) -> TesseraResult<Page<R>> {
    if criteria.page_size == 0 || criteria.current_page == 0 {
      return Err(TesseraError::InvalidCriteria {
        message: format!(
          "page size {} / current page {} out of range",
          criteria.page_size, criteria.current_page
        ),
      });
    }

    let guard = self.records.read();
    let matching: Vec<&R> = match &criteria.filter {
      Some(filter) => guard.iter().filter(|r| filter(r)).collect(),
      None => guard.iter().collect(),
    };
    let info = PageInfo::for_total(matching.len(), criteria.page_size, criteria.current_page);
    // An offset past usize::MAX lies beyond any stored record.
    let items = match (criteria.current_page - 1).checked_mul(criteria.page_size) {
      Some(offset) => matching.into_iter().skip(offset).take(criteria.page_size).cloned().collect(),
      None => Vec::new(),
    };
    Ok(Page { items, info })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn lookup_accepts_capturing_predicate() {
    let store = MemoryStore::from_records(vec![1u32, 5, 9, 12]);
    let floor = 5;
    let above = move |n: &u32| *n > floor;

    let found = store.lookup(&above).await.unwrap();
    assert_eq!(found, vec![9, 12]);
  }

  #[tokio::test]
  async fn page_offset_overflow_is_an_empty_page() {
    let store = MemoryStore::from_records(vec![1u32, 2, 3]);
    let criteria = SearchCriteria::new(None).starting_at(usize::MAX / 2);

    let page = store.page(&criteria).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.info.page_count, 1);
  }
}
