use std::{
  borrow::Cow,
  collections::HashMap,
  fmt,
};

use serde::{
  Deserialize,
  Serialize,
};

/// Identifier of a hashtag data source (`category`, `tag`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashtagType(Cow<'static, str>);

impl HashtagType {
  pub const CATEGORY: HashtagType = HashtagType(Cow::Borrowed("category"));
  pub const TAG: HashtagType = HashtagType(Cow::Borrowed("tag"));

  pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for HashtagType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&'static str> for HashtagType {
  fn from(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }
}

impl From<String> for HashtagType {
  fn from(name: String) -> Self {
    Self(Cow::Owned(name))
  }
}

/// Comma separated form used by the `order` query parameter.
pub(crate) fn order_csv(order: &[HashtagType]) -> String {
  order
    .iter()
    .map(HashtagType::as_str)
    .collect::<Vec<_>>()
    .join(",")
}

/// Server side record id. Categories use numbers, other sources may not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HashtagId {
  Number(i64),
  Text(String),
}

impl fmt::Display for HashtagId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(id) => write!(f, "{id}"),
      Self::Text(id) => f.write_str(id),
    }
  }
}

impl From<i64> for HashtagId {
  fn from(id: i64) -> Self {
    Self::Number(id)
  }
}

/// Body of `GET hashtags/search.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
  #[serde(default)]
  pub results: Option<Vec<RawSearchResult>>,
}

/// A search hit exactly as the server sent it, before sanitizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
  #[serde(rename = "type")]
  pub hashtag_type: HashtagType,
  pub id:           HashtagId,
  pub slug:         String,
  #[serde(rename = "ref", default)]
  pub reference:    Option<String>,
  pub text:         String,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default)]
  pub icon:         Option<String>,
  pub relative_url: String,
}

/// A ranked autocomplete entry ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultItem {
  #[serde(rename = "type")]
  pub hashtag_type: HashtagType,
  pub id:           HashtagId,
  pub slug:         String,
  /// Text inserted into the editor when the entry is picked.
  #[serde(rename = "ref")]
  pub reference:    String,
  /// Escaped text with emoji expanded, safe to embed as HTML.
  pub text:         String,
  pub description:  Option<String>,
  /// Icon markup produced by the type's handler.
  pub icon:         String,
  pub relative_url: String,
}

/// Result of a single `search` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
  Results(Vec<SearchResultItem>),
  /// Superseded by a newer search or timed out.
  Cancelled,
}

impl SearchOutcome {
  pub fn empty() -> Self {
    Self::Results(Vec::new())
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }

  pub fn results(&self) -> Option<&[SearchResultItem]> {
    match self {
      Self::Results(items) => Some(items),
      Self::Cancelled => None,
    }
  }
}

/// An item the server confirmed exists, as returned by `GET hashtags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHashtag {
  /// Lowercase slug, suffixed with `::type` when it collides across types.
  #[serde(rename = "ref")]
  pub reference:    String,
  pub id:           HashtagId,
  pub slug:         String,
  pub text:         String,
  #[serde(default)]
  pub relative_url: String,
  #[serde(default)]
  pub icon:         Option<String>,
  #[serde(default)]
  pub description:  Option<String>,
}

/// Body of `GET hashtags`: matches grouped by source type.
pub type LookupResponse = HashMap<HashtagType, Vec<ResolvedHashtag>>;

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn search_response_without_results() {
    let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
    assert_eq!(response.results, None);
  }

  #[test]
  fn raw_result_accepts_string_and_numeric_ids() {
    let results: Vec<RawSearchResult> = serde_json::from_value(json!([
      { "type": "category", "id": 4, "slug": "bugs", "ref": "bugs", "text": "Bugs", "relative_url": "/c/bugs/4" },
      { "type": "channel", "id": "abc", "slug": "general", "text": "General", "icon": "comment", "relative_url": "/chat/c/general" },
    ]))
    .unwrap();

    assert_eq!(results[0].id, HashtagId::Number(4));
    assert_eq!(results[0].hashtag_type, HashtagType::CATEGORY);
    assert_eq!(results[1].id, HashtagId::Text("abc".into()));
    assert_eq!(results[1].reference, None);
    assert_eq!(results[1].icon.as_deref(), Some("comment"));
  }

  #[test]
  fn lookup_response_keys_by_type() {
    let response: LookupResponse = serde_json::from_value(json!({
      "tag": [{ "ref": "bananas::tag", "id": 9, "slug": "bananas", "text": "bananas", "relative_url": "/tag/bananas" }],
      "category": [],
    }))
    .unwrap();

    assert_eq!(response[&HashtagType::TAG][0].reference, "bananas::tag");
    assert!(response[&HashtagType::CATEGORY].is_empty());
  }

  #[test]
  fn order_is_joined_with_commas() {
    let order = [HashtagType::CATEGORY, HashtagType::TAG, HashtagType::new("channel")];
    assert_eq!(order_csv(&order), "category,tag,channel");
  }
}
