//! Scriptable in-memory [`HashtagSource`] for unit tests.

use std::{
  collections::HashMap,
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
  source::{
    FetchError,
    HashtagSource,
  },
  types::{
    HashtagId,
    HashtagType,
    LookupResponse,
    RawSearchResult,
    ResolvedHashtag,
    SearchResponse,
  },
};

#[derive(Default)]
pub(crate) struct FakeSource {
  delay:          Mutex<Duration>,
  search_replies: Mutex<HashMap<String, Result<SearchResponse, String>>>,
  lookup_reply:   Mutex<Option<Result<LookupResponse, String>>>,
  started:        Mutex<Vec<String>>,
  finished:       Mutex<Vec<String>>,
  lookups:        Mutex<Vec<Vec<String>>>,
}

impl FakeSource {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Every search sleeps this long before answering.
  pub fn set_delay(&self, delay: Duration) {
    *self.delay.lock() = delay;
  }

  pub fn reply(&self, term: &str, results: Vec<RawSearchResult>) {
    self.reply_raw(term, SearchResponse {
      results: Some(results),
    });
  }

  pub fn reply_raw(&self, term: &str, response: SearchResponse) {
    self
      .search_replies
      .lock()
      .insert(term.to_owned(), Ok(response));
  }

  pub fn fail(&self, term: &str) {
    self
      .search_replies
      .lock()
      .insert(term.to_owned(), Err(format!("no route to {term}")));
  }

  pub fn reply_lookup(&self, response: LookupResponse) {
    *self.lookup_reply.lock() = Some(Ok(response));
  }

  pub fn fail_lookup(&self) {
    *self.lookup_reply.lock() = Some(Err("lookup refused".into()));
  }

  /// Terms whose request reached the source, in order.
  pub fn started(&self) -> Vec<String> {
    self.started.lock().clone()
  }

  /// Terms whose request ran to completion.
  pub fn finished(&self) -> Vec<String> {
    self.finished.lock().clone()
  }

  pub fn lookups(&self) -> Vec<Vec<String>> {
    self.lookups.lock().clone()
  }
}

#[async_trait]
impl HashtagSource for FakeSource {
  async fn search(&self, term: &str, _order: &[HashtagType]) -> Result<SearchResponse, FetchError> {
    self.started.lock().push(term.to_owned());
    let delay = *self.delay.lock();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    self.finished.lock().push(term.to_owned());

    let reply = self.search_replies.lock().get(term).cloned();
    match reply {
      Some(Ok(response)) => Ok(response),
      Some(Err(message)) => Err(FetchError::Unavailable(message)),
      None => Ok(SearchResponse {
        results: Some(Vec::new()),
      }),
    }
  }

  async fn lookup(
    &self,
    slugs: &[String],
    _order: &[HashtagType],
  ) -> Result<LookupResponse, FetchError> {
    self.lookups.lock().push(slugs.to_vec());
    let reply = self.lookup_reply.lock().clone();
    match reply {
      Some(Ok(response)) => Ok(response),
      Some(Err(message)) => Err(FetchError::Unavailable(message)),
      None => Ok(LookupResponse::new()),
    }
  }
}

pub(crate) fn hit(hashtag_type: HashtagType, id: i64, slug: &str, text: &str) -> RawSearchResult {
  RawSearchResult {
    relative_url: format!("/{}/{slug}", hashtag_type.as_str()),
    hashtag_type,
    id: HashtagId::Number(id),
    slug: slug.to_owned(),
    reference: Some(slug.to_owned()),
    text: text.to_owned(),
    description: None,
    icon: None,
  }
}

pub(crate) fn known(reference: &str, id: i64, slug: &str, text: &str) -> ResolvedHashtag {
  ResolvedHashtag {
    reference:    reference.to_owned(),
    id:           HashtagId::Number(id),
    slug:         slug.to_owned(),
    text:         text.to_owned(),
    relative_url: format!("/t/{slug}"),
    icon:         None,
    description:  None,
  }
}
