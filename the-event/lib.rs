//! Async building blocks shared by the hashtag services: debounced hooks,
//! cooperative task cancellation and single-assignment result cells.

mod cancel;
mod cell;
mod debounce;

pub use cancel::{
  TaskController,
  TaskHandle,
  cancelable_future,
};
pub use cell::{
  CompletionCell,
  CompletionWaiter,
  completion_cell,
};
pub use debounce::{
  AsyncHook,
  send_event,
};
