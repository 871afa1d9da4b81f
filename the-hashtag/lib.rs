//! Hashtag reference autocomplete.
//!
//! [`HashtagSearch`] answers `#term` lookups while the user types: it
//! debounces keystrokes, keeps a single request on the wire, caches answers
//! and times out slow searches. [`HashtagContext`] holds the per-session
//! state shared with it: source type handlers, items already resolved in the
//! current document and the slugs already asked about.

pub mod config;
pub mod context;
pub mod markup;
pub mod registry;
pub mod search;
pub mod source;
pub mod types;

#[cfg(test)]
mod test_source;

pub use config::{
  CACHE_MAX_AGE,
  Config,
  ConfigLoadError,
  SearchConfig,
};
pub use context::{
  HashtagContext,
  ResolvedItemCache,
};
pub use markup::{
  EmojiImages,
  EmojiRenderer,
  HashtagSpan,
  PlainEmoji,
};
pub use registry::{
  CategoryHashtagType,
  HashtagTypeHandler,
  HashtagTypeRegistry,
  IconRequest,
  TagHashtagType,
};
pub use search::{
  HashtagSearch,
  SearchError,
};
pub use source::{
  FetchError,
  HashtagSource,
  HttpHashtagSource,
};
pub use types::{
  HashtagId,
  HashtagType,
  ResolvedHashtag,
  SearchOutcome,
  SearchResultItem,
};
