// tessera/src/batch.rs

//! Paginated bulk walking over a queryable record source.
//!
//! `BatchWalker::walk` fetches one page at a time and hands each non-empty
//! page to an action (which may itself update the source). The page count is
//! captured from the first page and never re-read, so a result set that
//! shrinks while it is being walked cannot make the walk stop early or loop.

use crate::error::{TesseraError, TesseraResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Paging state plus a source-specific filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria<F> {
  pub filter: F,
  pub page_size: usize,
  /// 1-based.
  pub current_page: usize,
}

impl<F> SearchCriteria<F> {
  pub const DEFAULT_PAGE_SIZE: usize = 100;

  pub fn new(filter: F) -> Self {
    Self {
      filter,
      page_size: Self::DEFAULT_PAGE_SIZE,
      current_page: 1,
    }
  }

  /// Starts the walk at `page` instead of the first page, e.g. to resume.
  pub fn starting_at(mut self, page: usize) -> Self {
    self.current_page = page;
    self
  }
}

impl<F: Default> Default for SearchCriteria<F> {
  fn default() -> Self {
    Self::new(F::default())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
  pub page_size: usize,
  pub current_page: usize,
  pub page_count: usize,
  pub total_items: usize,
}

impl PageInfo {
  /// Derives the page count for `total_items` split into pages of `page_size`.
  pub fn for_total(total_items: usize, page_size: usize, current_page: usize) -> Self {
    let page_count = if page_size == 0 { 0 } else { total_items.div_ceil(page_size) };
    Self {
      page_size,
      current_page,
      page_count,
      total_items,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R> {
  pub items: Vec<R>,
  pub info: PageInfo,
}

/// The persistence collaborator's paging query.
#[async_trait]
pub trait PagedSource<R>: Send + Sync {
  type Filter: Send + Sync;

  async fn page(&self, criteria: &SearchCriteria<Self::Filter>) -> TesseraResult<Page<R>>;
}

#[async_trait]
impl<R, S> PagedSource<R> for Arc<S>
where
  R: Send + 'static,
  S: PagedSource<R> + ?Sized,
{
  type Filter = S::Filter;

  async fn page(&self, criteria: &SearchCriteria<Self::Filter>) -> TesseraResult<Page<R>> {
    (**self).page(criteria).await
  }
}

/// What a completed walk did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkSummary {
  pub pages_fetched: usize,
  pub pages_processed: usize,
  pub items_processed: usize,
  /// Page count captured from the first page.
  pub page_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWalker {
  page_size: usize,
}

impl BatchWalker {
  pub fn new(page_size: usize) -> TesseraResult<Self> {
    if page_size == 0 {
      return Err(TesseraError::InvalidCriteria {
        message: "page size must be greater than zero".to_string(),
      });
    }
    Ok(Self { page_size })
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Walks `source` page by page from `criteria.current_page`.
  ///
  /// Stops when a page comes back empty or `current_page` passes the page
  /// count seen on the first fetch. A failing action is not retried: its
  /// error is returned as-is and `criteria.current_page` is left on the page
  /// that failed, so the caller can resume from there.
  #[instrument(
        name = "BatchWalker::walk",
        skip_all,
        fields(
            page_size = self.page_size,
            start_page = criteria.current_page,
            record_type = %std::any::type_name::<R>(),
        )
    )]
  pub async fn walk<R, S, A, Fut, E>(
    &self,
    source: &S,
    criteria: &mut SearchCriteria<S::Filter>,
    mut action: A,
  ) -> Result<WalkSummary, E>
  where
    S: PagedSource<R> + ?Sized,
    A: FnMut(Vec<R>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: From<TesseraError>,
  {
    if criteria.current_page == 0 {
      return Err(E::from(TesseraError::InvalidCriteria {
        message: "current page is 1-based".to_string(),
      }));
    }
    criteria.page_size = self.page_size;

    let mut summary = WalkSummary::default();
    let mut page_count: Option<usize> = None;

    loop {
      event!(Level::TRACE, page = criteria.current_page, "Fetching page.");
      let page = source.page(criteria).await.map_err(E::from)?;
      summary.pages_fetched += 1;

      let count = *page_count.get_or_insert(page.info.page_count);
      summary.page_count = count;

      if page.items.is_empty() {
        event!(Level::DEBUG, page = criteria.current_page, "Empty page; walk finished.");
        break;
      }

      let item_count = page.items.len();
      action(page.items).await?;
      summary.pages_processed += 1;
      summary.items_processed += item_count;
      event!(Level::DEBUG, page = criteria.current_page, items = item_count, "Page processed.");

      criteria.current_page += 1;
      if criteria.current_page > count {
        break;
      }
    }

    event!(
      Level::DEBUG,
      pages = summary.pages_processed,
      items = summary.items_processed,
      "Walk completed."
    );
    Ok(summary)
  }
}
