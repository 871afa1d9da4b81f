use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{
      AtomicBool,
      Ordering,
    },
  },
};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CancelState {
  canceled: AtomicBool,
  notify:   Notify,
}

impl CancelState {
  fn cancel(&self) {
    self.canceled.store(true, Ordering::Release);
    self.notify.notify_waiters();
  }
}

/// Owning side of a restartable background task.
///
/// At most one task is tracked at a time: [`TaskController::restart`]
/// cancels whatever the previous handle was driving before handing out a new
/// one. Dropping the controller cancels the current task too.
#[derive(Debug, Default)]
pub struct TaskController {
  current: Option<Arc<CancelState>>,
}

impl TaskController {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cancel the tracked task. Returns whether it was still running.
  pub fn cancel(&mut self) -> bool {
    let Some(state) = self.current.take() else {
      return false;
    };
    let was_running = Arc::strong_count(&state) > 1;
    state.cancel();
    was_running
  }

  /// A task counts as running while any [`TaskHandle`] for it is alive.
  pub fn is_running(&self) -> bool {
    self
      .current
      .as_ref()
      .is_some_and(|state| Arc::strong_count(state) > 1)
  }

  pub fn restart(&mut self) -> TaskHandle {
    self.cancel();
    let state = Arc::new(CancelState::default());
    self.current = Some(state.clone());
    TaskHandle { state }
  }
}

impl Drop for TaskController {
  fn drop(&mut self) {
    self.cancel();
  }
}

/// Task side of a [`TaskController`].
#[derive(Debug, Clone)]
pub struct TaskHandle {
  state: Arc<CancelState>,
}

impl TaskHandle {
  pub fn is_canceled(&self) -> bool {
    self.state.canceled.load(Ordering::Acquire)
  }

  /// Resolves once the controller cancels this task.
  pub async fn canceled(&self) {
    loop {
      let notified = self.state.notify.notified();
      tokio::pin!(notified);
      // register before checking the flag so a concurrent cancel can't slip
      // between the check and the await
      notified.as_mut().enable();
      if self.is_canceled() {
        return;
      }
      notified.await;
    }
  }
}

/// Drive `future` to completion unless `handle` is canceled first.
///
/// A cancel that has already happened wins over a ready future. The future is
/// dropped on cancellation, which aborts whatever IO it owns.
pub async fn cancelable_future<T>(future: impl Future<Output = T>, handle: TaskHandle) -> Option<T> {
  tokio::select! {
    biased;
    _ = handle.canceled() => None,
    output = future => Some(output),
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn completes_when_not_canceled() {
    let mut controller = TaskController::new();
    let handle = controller.restart();
    let output = cancelable_future(async { 7 }, handle).await;
    assert_eq!(output, Some(7));
    assert!(!controller.is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn restart_cancels_previous_task() {
    let mut controller = TaskController::new();
    let first = controller.restart();
    let task = tokio::spawn(cancelable_future(
      tokio::time::sleep(Duration::from_secs(10)),
      first,
    ));
    tokio::task::yield_now().await;
    assert!(controller.is_running());

    let _second = controller.restart();
    assert_eq!(task.await.unwrap(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_before_poll_wins() {
    let mut controller = TaskController::new();
    let handle = controller.restart();
    assert!(controller.cancel());
    assert!(handle.is_canceled());
    assert_eq!(cancelable_future(async { 1 }, handle).await, None);
  }

  #[test]
  fn cancel_without_task_reports_idle() {
    let mut controller = TaskController::new();
    assert!(!controller.cancel());
    let handle = controller.restart();
    drop(handle);
    assert!(!controller.is_running());
    assert!(!controller.cancel());
  }
}
