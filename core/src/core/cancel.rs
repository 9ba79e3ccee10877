// tessera/src/core/cancel.rs

//! Cooperative cancellation for pipeline runs.
//!
//! A caller wrapping `Pipeline::execute_until` with a deadline or shutdown hook
//! cancels the signal; the runner checks it between tasks, never inside one.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{event, Level};

#[derive(Debug, Default)]
struct SignalState {
  cancelled: AtomicBool,
  reason: RwLock<Option<String>>,
}

/// Clonable cancellation flag; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<SignalState>);

impl CancelSignal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Requests cancellation. Only the first reason is kept.
  ///
  /// The reason is written before the flag is raised, so an observer that
  /// sees `is_cancelled()` always finds it.
  pub fn cancel(&self, reason: impl Into<String>) {
    let mut slot = self.0.reason.write();
    if self.0.cancelled.load(Ordering::SeqCst) {
      return;
    }
    let reason = reason.into();
    event!(Level::DEBUG, %reason, "Cancellation requested.");
    *slot = Some(reason);
    self.0.cancelled.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.cancelled.load(Ordering::SeqCst)
  }

  pub fn reason(&self) -> Option<String> {
    self.0.reason.read().clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_reason_wins_across_clones() {
    let signal = CancelSignal::new();
    let observer = signal.clone();
    assert!(!observer.is_cancelled());

    signal.cancel("deadline exceeded");
    signal.cancel("shutdown");

    assert!(observer.is_cancelled());
    assert_eq!(observer.reason().as_deref(), Some("deadline exceeded"));
  }

  #[test]
  fn raised_flag_always_has_a_reason() {
    for _ in 0..200 {
      let signal = CancelSignal::new();
      let observer = signal.clone();
      let watcher = std::thread::spawn(move || loop {
        if observer.is_cancelled() {
          return observer.reason();
        }
        std::hint::spin_loop();
      });
      let racers: Vec<_> = (0..4)
        .map(|i| {
          let signal = signal.clone();
          std::thread::spawn(move || signal.cancel(format!("racer {}", i)))
        })
        .collect();
      for racer in racers {
        racer.join().unwrap();
      }
      let seen = watcher.join().unwrap();
      assert!(seen.is_some());
      assert_eq!(seen, signal.reason());
    }
  }
}
