//! Trailing-edge debounced hooks driven by a background tokio task

use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Events are drained as soon as they arrive, so a burst of keystrokes
/// rarely gets anywhere near this.
const EVENT_CAPACITY: usize = 256;

/// A stateful event handler living on its own tokio task.
///
/// Every event goes through [`AsyncHook::handle_event`], which decides the
/// next debounce deadline. When a deadline passes without a newer event the
/// hook's [`AsyncHook::finish_debounce`] runs. Returning a fresh deadline from
/// every event gives the usual trailing-edge behaviour: only the last event of
/// a burst does any work.
pub trait AsyncHook: Send + 'static + Sized {
  type Event: Send + 'static;

  /// Consume `event`. `deadline` is the currently armed debounce deadline,
  /// the return value replaces it (`None` disarms the timer).
  fn handle_event(&mut self, event: Self::Event, deadline: Option<Instant>) -> Option<Instant>;

  /// Called once the armed deadline passes with no intervening event.
  fn finish_debounce(&mut self);

  /// Spawn the hook onto the current runtime and hand back its event sender.
  ///
  /// Returns `None` when called outside a tokio runtime. The task exits once
  /// every sender is dropped.
  fn spawn(self) -> Option<Sender<Self::Event>> {
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
    runtime.spawn(run(self, rx));
    Some(tx)
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline: Option<Instant> = None;
  loop {
    let event = match deadline {
      Some(at) => {
        match tokio::time::timeout_at(at, rx.recv()).await {
          Ok(event) => event,
          Err(_elapsed) => {
            deadline = None;
            hook.finish_debounce();
            continue;
          },
        }
      },
      None => rx.recv().await,
    };

    let Some(event) = event else {
      log::trace!("async hook channel closed, stopping");
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Queue an event for a hook without blocking the caller.
///
/// Returns `false` when the event was dropped because the hook is saturated
/// or already gone.
pub fn send_event<T>(tx: &Sender<T>, event: T) -> bool {
  match tx.try_send(event) {
    Ok(()) => true,
    Err(TrySendError::Full(_)) => {
      log::warn!("async hook channel is full, dropping event");
      false
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("attempted to send to a closed async hook");
      false
    },
  }
}
