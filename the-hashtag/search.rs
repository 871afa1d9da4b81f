//! Debounced, single-flight hashtag search backed by a shared result cache.
//!
//! Every call to [`HashtagSearch::search`] first aborts the request that is
//! currently on the wire, so a response to a stale term can never reach the
//! caller. Terms that were already answered recently are served from the
//! cache without touching the network. Everything else is queued on a
//! debounced hook; only the last term of a burst is actually sent.

use std::{
  collections::HashMap,
  sync::Arc,
  time::Duration,
};

use futures_util::future::{
  self,
  BoxFuture,
  FutureExt,
};
use parking_lot::Mutex;
use the_hashtag_event::{
  AsyncHook,
  CompletionCell,
  TaskController,
  TaskHandle,
  cancelable_future,
  completion_cell,
  send_event,
};
use thiserror::Error;
use tokio::{
  sync::mpsc::Sender,
  time::Instant,
};

use crate::{
  config::{
    CACHE_MAX_AGE,
    SearchConfig,
  },
  context::HashtagContext,
  source::HashtagSource,
  types::{
    HashtagType,
    SearchOutcome,
    SearchResultItem,
  },
};


#[derive(Debug, Error)]
pub enum SearchError {
  #[error("hashtag search must be created inside a tokio runtime")]
  NoRuntime,
}

/// Search results keyed by the exact term, expired all at once.
struct SearchCache {
  entries:    HashMap<String, Vec<SearchResultItem>>,
  cleared_at: Instant,
}

impl SearchCache {
  fn new() -> Self {
    Self {
      entries:    HashMap::new(),
      cleared_at: Instant::now(),
    }
  }

  fn expire(&mut self, now: Instant, max_age: Duration) {
    if now.saturating_duration_since(self.cleared_at) <= max_age {
      return;
    }
    if !self.entries.is_empty() {
      log::debug!("dropping {} cached hashtag searches", self.entries.len());
    }
    self.entries.clear();
    self.cleared_at = now;
  }

  fn get(&self, term: &str) -> Option<&[SearchResultItem]> {
    self.entries.get(term).map(Vec::as_slice)
  }

  fn insert(&mut self, term: String, results: Vec<SearchResultItem>) {
    self.entries.insert(term, results);
  }
}

struct SearchState {
  cache:     SearchCache,
  /// The one network search allowed on the wire.
  in_flight: TaskController,
}

/// A search waiting for its debounce to expire.
struct SearchQuery {
  term:  String,
  order: Vec<HashtagType>,
  cell:  CompletionCell<SearchOutcome>,
}

enum SearchEvent {
  /// A cache miss to send once the input settles.
  Query(SearchQuery),
  /// A newer call was answered without the network.
  Supersede,
}

pub struct HashtagSearch {
  context: Arc<HashtagContext>,
  config:  SearchConfig,
  state:   Arc<Mutex<SearchState>>,
  hook:    Sender<SearchEvent>,
}

impl HashtagSearch {
  /// Spawns the debounce hook, so this has to run inside a tokio runtime.
  pub fn new(
    context: Arc<HashtagContext>,
    source: Arc<dyn HashtagSource>,
    config: SearchConfig,
  ) -> Result<Self, SearchError> {
    let state = Arc::new(Mutex::new(SearchState {
      cache:     SearchCache::new(),
      in_flight: TaskController::new(),
    }));
    let hook = SearchHook {
      pending: None,
      input_delay: config.input_delay(),
      state: state.clone(),
      context: context.clone(),
      source,
    }
    .spawn()
    .ok_or(SearchError::NoRuntime)?;

    Ok(Self {
      context,
      config,
      state,
      hook,
    })
  }

  pub fn context(&self) -> &Arc<HashtagContext> {
    &self.context
  }

  pub fn config(&self) -> &SearchConfig {
    &self.config
  }

  /// Whether a network search is currently on the wire.
  pub fn is_searching(&self) -> bool {
    self.state.lock().in_flight.is_running()
  }

  /// Look up hashtags matching `term`, ranked by the server with `order`
  /// as the type priority.
  ///
  /// Aborting the in-flight request, cache expiry and cache lookup all happen
  /// right away, before the returned future is polled. The future resolves
  /// to [`SearchOutcome::Cancelled`] when a newer search supersedes this one
  /// or the configured timeout passes first. A network failure resolves to
  /// an empty result list.
  pub fn search(&self, term: &str, order: &[HashtagType]) -> BoxFuture<'static, SearchOutcome> {
    // the trigger only ever matches a single word
    if term.chars().any(char::is_whitespace) {
      return future::ready(SearchOutcome::empty()).boxed();
    }

    let now = Instant::now();
    {
      let mut state = self.state.lock();
      if state.in_flight.cancel() {
        log::debug!("aborting in-flight hashtag search");
      }
      state.cache.expire(now, CACHE_MAX_AGE);
      if let Some(results) = state.cache.get(term) {
        log::trace!("hashtag search for {term:?} served from cache");
        // a call still waiting on its debounce is older than this one
        send_event(&self.hook, SearchEvent::Supersede);
        return future::ready(SearchOutcome::Results(results.to_vec())).boxed();
      }
    }

    let (cell, waiter) = completion_cell();
    let query = SearchQuery {
      term:  term.to_owned(),
      order: order.to_vec(),
      cell:  cell.clone(),
    };
    if !send_event(&self.hook, SearchEvent::Query(query)) {
      cell.complete(SearchOutcome::Cancelled);
    }

    let deadline = self.config.timeout().map(|timeout| now + timeout);
    let term = term.to_owned();
    async move {
      let outcome = match deadline {
        Some(deadline) => {
          match tokio::time::timeout_at(deadline, waiter.wait()).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
              log::debug!("hashtag search for {term:?} timed out");
              cell.complete(SearchOutcome::Cancelled);
              None
            },
          }
        },
        None => waiter.wait().await,
      };
      outcome.unwrap_or(SearchOutcome::Cancelled)
    }
    .boxed()
  }
}

impl Drop for HashtagSearch {
  fn drop(&mut self) {
    self.state.lock().in_flight.cancel();
  }
}

struct SearchHook {
  pending:     Option<SearchQuery>,
  input_delay: Duration,
  state:       Arc<Mutex<SearchState>>,
  context:     Arc<HashtagContext>,
  source:      Arc<dyn HashtagSource>,
}

impl AsyncHook for SearchHook {
  type Event = SearchEvent;

  fn handle_event(&mut self, event: SearchEvent, _deadline: Option<Instant>) -> Option<Instant> {
    // a request the previous debounce already released is stale now too
    self.state.lock().in_flight.cancel();
    let (next, deadline) = match event {
      SearchEvent::Query(query) => (Some(query), Some(Instant::now() + self.input_delay)),
      SearchEvent::Supersede => (None, None),
    };
    if let Some(superseded) = std::mem::replace(&mut self.pending, next) {
      log::trace!("hashtag search for {:?} superseded", superseded.term);
      superseded.cell.complete(SearchOutcome::Cancelled);
    }
    deadline
  }

  fn finish_debounce(&mut self) {
    let Some(query) = self.pending.take() else {
      return;
    };
    let handle = self.state.lock().in_flight.restart();
    tokio::spawn(run_search(
      query,
      handle,
      self.state.clone(),
      self.context.clone(),
      self.source.clone(),
    ));
  }
}

async fn run_search(
  query: SearchQuery,
  handle: TaskHandle,
  state: Arc<Mutex<SearchState>>,
  context: Arc<HashtagContext>,
  source: Arc<dyn HashtagSource>,
) {
  let SearchQuery { term, order, cell } = query;

  match cancelable_future(source.search(&term, &order), handle).await {
    None => {
      log::debug!("hashtag search for {term:?} aborted");
      cell.complete(SearchOutcome::Cancelled);
    },
    Some(Err(err)) => {
      log::warn!("hashtag search for {term:?} failed: {err}");
      cell.complete(SearchOutcome::empty());
    },
    Some(Ok(response)) => {
      let results = context.prepare_results(response.results.unwrap_or_default());
      state.lock().cache.insert(term.clone(), results.clone());
      if !cell.complete(SearchOutcome::Results(results)) {
        log::trace!("hashtag search for {term:?} answered after its caller gave up");
      }
    },
  }
}
