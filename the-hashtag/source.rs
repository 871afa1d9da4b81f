use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::types::{
  HashtagType,
  LookupResponse,
  SearchResponse,
  order_csv,
};

const SEARCH_PATH: &str = "hashtags/search.json";
const LOOKUP_PATH: &str = "hashtags";

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("invalid hashtag endpoint url: {0}")]
  Url(#[from] url::ParseError),
  #[error("hashtag request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("hashtag source unavailable: {0}")]
  Unavailable(String),
}

/// Remote backend answering hashtag searches and lookups.
#[async_trait]
pub trait HashtagSource: Send + Sync + 'static {
  /// `GET hashtags/search.json?term=..&order=..`
  async fn search(&self, term: &str, order: &[HashtagType]) -> Result<SearchResponse, FetchError>;

  /// `GET hashtags?slugs=..&order=..`
  async fn lookup(&self, slugs: &[String], order: &[HashtagType])
  -> Result<LookupResponse, FetchError>;
}

/// [`HashtagSource`] talking JSON over HTTP to a forum instance.
#[derive(Debug, Clone)]
pub struct HttpHashtagSource {
  client:   reqwest::Client,
  base_url: Url,
}

impl HttpHashtagSource {
  /// `base_url` may include a subfolder, endpoints are resolved relative to
  /// it.
  pub fn new(base_url: &str) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("the-hashtag/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Self::with_client(client, base_url)
  }

  pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, FetchError> {
    let mut base_url = Url::parse(base_url)?;
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }
    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
    Ok(self.base_url.join(path)?)
  }
}

#[async_trait]
impl HashtagSource for HttpHashtagSource {
  async fn search(&self, term: &str, order: &[HashtagType]) -> Result<SearchResponse, FetchError> {
    let url = self.endpoint(SEARCH_PATH)?;
    log::debug!("searching hashtags for {term:?} at {url}");
    let response = self
      .client
      .get(url)
      .header(reqwest::header::ACCEPT, "application/json")
      .query(&[("term", term), ("order", order_csv(order).as_str())])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(response)
  }

  async fn lookup(
    &self,
    slugs: &[String],
    order: &[HashtagType],
  ) -> Result<LookupResponse, FetchError> {
    let url = self.endpoint(LOOKUP_PATH)?;
    log::debug!("looking up {} hashtag slugs at {url}", slugs.len());
    let response = self
      .client
      .get(url)
      .header(reqwest::header::ACCEPT, "application/json")
      .query(&[
        ("slugs", slugs.join(",").as_str()),
        ("order", order_csv(order).as_str()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(response)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_url_gains_trailing_slash() {
    let source = HttpHashtagSource::new("https://forum.test/community").unwrap();
    assert_eq!(source.base_url().as_str(), "https://forum.test/community/");
    assert_eq!(
      source.endpoint(SEARCH_PATH).unwrap().as_str(),
      "https://forum.test/community/hashtags/search.json"
    );
  }

  #[test]
  fn rejects_relative_base_url() {
    assert!(matches!(
      HttpHashtagSource::new("forum.test"),
      Err(FetchError::Url(_))
    ));
  }
}
