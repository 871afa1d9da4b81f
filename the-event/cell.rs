use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Create a single-assignment cell and the waiter that observes it.
pub fn completion_cell<T>() -> (CompletionCell<T>, CompletionWaiter<T>) {
  let (tx, rx) = oneshot::channel();
  let cell = CompletionCell {
    slot: Arc::new(Mutex::new(Some(tx))),
  };
  (cell, CompletionWaiter { rx })
}

/// Write side of a value that may be produced by several racing sources.
///
/// Clones share the same slot. The first [`CompletionCell::complete`] wins,
/// every later attempt is a no-op.
pub struct CompletionCell<T> {
  slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for CompletionCell<T> {
  fn clone(&self) -> Self {
    Self {
      slot: self.slot.clone(),
    }
  }
}

impl<T> CompletionCell<T> {
  /// Returns `true` only for the write that was delivered to the waiter.
  pub fn complete(&self, value: T) -> bool {
    let Some(tx) = self.slot.lock().take() else {
      return false;
    };
    tx.send(value).is_ok()
  }

  pub fn is_completed(&self) -> bool {
    self.slot.lock().is_none()
  }
}

pub struct CompletionWaiter<T> {
  rx: oneshot::Receiver<T>,
}

impl<T> CompletionWaiter<T> {
  /// `None` when every cell was dropped without completing.
  pub async fn wait(self) -> Option<T> {
    self.rx.await.ok()
  }
}
