// tessera/examples/batch_walk.rs

use std::sync::Arc;
use tessera::{BatchWalker, MemoryStore, Predicate, SearchCriteria, TesseraError};
use tracing::info;

#[derive(Clone, Debug)]
struct Account {
  id: u32,
  archived: bool,
}

#[tokio::main]
async fn main() -> Result<(), TesseraError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Batch Walk Example ---");

  let store = Arc::new(MemoryStore::from_records(
    (1..=25).map(|id| Account { id, archived: false }).collect(),
  ));

  // Walk every active account in pages of 10, archiving each page.
  // The action shrinks the filtered set as it goes; the walker still stops.
  let active: Predicate<Account> = Arc::new(|a: &Account| !a.archived);
  let mut criteria = SearchCriteria::new(Some(active));
  let walker = BatchWalker::new(10)?;

  let summary = walker
    .walk(&store, &mut criteria, |batch: Vec<Account>| {
      let store = store.clone();
      async move {
        let ids: Vec<u32> = batch.iter().map(|a| a.id).collect();
        let archived = store.update_where(|a| ids.contains(&a.id), |a| a.archived = true);
        info!("Archived {} accounts: {:?}", archived, ids);
        Ok::<(), TesseraError>(())
      }
    })
    .await?;

  info!("Walk summary: {:?}", summary);
  let remaining = store.snapshot().into_iter().filter(|a| !a.archived).count();
  info!("{} accounts still active; run the walk again to pick them up.", remaining);

  Ok(())
}
