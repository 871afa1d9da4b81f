//! Session scoped hashtag state: the type registry, the emoji renderer and
//! everything learned about hashtags already present in the document.

use std::{
  collections::{
    HashMap,
    HashSet,
    hash_map::Entry,
  },
  sync::Arc,
};

use parking_lot::{
  Mutex,
  RwLock,
};

use crate::{
  markup::{
    EmojiImages,
    EmojiRenderer,
    HashtagSpan,
    ICON_PLACEHOLDER,
    cooked_hashtag_html,
    sanitize_text,
  },
  registry::{
    DynHashtagTypeHandler,
    HashtagTypeRegistry,
    IconRequest,
  },
  source::HashtagSource,
  types::{
    HashtagId,
    HashtagType,
    RawSearchResult,
    ResolvedHashtag,
    SearchResultItem,
  },
};


/// Items the server confirmed to exist, keyed by type then `ref`.
///
/// Append only: the first item stored for a key stays there.
#[derive(Debug, Default, Clone)]
pub struct ResolvedItemCache {
  by_type: HashMap<HashtagType, HashMap<String, ResolvedHashtag>>,
}

impl ResolvedItemCache {
  pub fn get(&self, hashtag_type: &HashtagType, reference: &str) -> Option<&ResolvedHashtag> {
    self.by_type.get(hashtag_type)?.get(reference)
  }

  /// Returns `false` if the key was already taken.
  pub fn insert(&mut self, hashtag_type: HashtagType, item: ResolvedHashtag) -> bool {
    match self
      .by_type
      .entry(hashtag_type)
      .or_default()
      .entry(item.reference.clone())
    {
      Entry::Vacant(slot) => {
        slot.insert(item);
        true
      },
      Entry::Occupied(_) => false,
    }
  }

  pub fn len(&self) -> usize {
    self.by_type.values().map(HashMap::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

pub struct HashtagContext {
  registry: RwLock<HashtagTypeRegistry>,
  emoji:    Arc<dyn EmojiRenderer>,
  resolved: Mutex<ResolvedItemCache>,
  /// Slugs already sent for resolution, matched or not.
  checked:  Mutex<HashSet<String>>,
}

impl Default for HashtagContext {
  fn default() -> Self {
    Self::new(
      HashtagTypeRegistry::with_defaults(),
      Arc::new(EmojiImages::default()),
    )
  }
}

impl HashtagContext {
  pub fn new(registry: HashtagTypeRegistry, emoji: Arc<dyn EmojiRenderer>) -> Self {
    Self {
      registry: RwLock::new(registry),
      emoji,
      resolved: Mutex::new(ResolvedItemCache::default()),
      checked: Mutex::new(HashSet::new()),
    }
  }

  pub fn register_type(&self, hashtag_type: HashtagType, handler: DynHashtagTypeHandler) {
    self.registry.write().register(hashtag_type, handler);
  }

  pub fn unregister_all_types(&self) {
    self.registry.write().unregister_all();
  }

  pub fn lookup_type(&self, hashtag_type: &HashtagType) -> Option<DynHashtagTypeHandler> {
    self.registry.read().lookup(hashtag_type).cloned()
  }

  pub fn emoji(&self) -> &dyn EmojiRenderer {
    &*self.emoji
  }

  pub fn resolved(&self, hashtag_type: &HashtagType, reference: &str) -> Option<ResolvedHashtag> {
    self.resolved.lock().get(hashtag_type, reference).cloned()
  }

  /// Store a confirmed item unless its key is already known.
  pub fn remember(&self, hashtag_type: HashtagType, item: ResolvedHashtag) -> bool {
    self.resolved.lock().insert(hashtag_type, item)
  }

  pub fn is_checked(&self, slug: &str) -> bool {
    self.checked.lock().contains(slug)
  }

  fn icon_html(
    registry: &HashtagTypeRegistry,
    hashtag_type: &HashtagType,
    icon: Option<&str>,
    id: &HashtagId,
  ) -> Option<String> {
    let handler = registry.lookup(hashtag_type)?;
    Some(handler.generate_icon_html(&IconRequest { icon, id }))
  }

  /// Sanitize server search hits and attach their type icons.
  pub(crate) fn prepare_results(&self, raw: Vec<RawSearchResult>) -> Vec<SearchResultItem> {
    let registry = self.registry.read();
    raw
      .into_iter()
      .map(|result| {
        let icon = Self::icon_html(
          &registry,
          &result.hashtag_type,
          result.icon.as_deref(),
          &result.id,
        )
        .unwrap_or_else(|| {
          log::warn!("no hashtag type registered for {:?}", result.hashtag_type.as_str());
          String::new()
        });
        let text = sanitize_text(&result.text, self.emoji());
        let reference = result.reference.unwrap_or_else(|| result.slug.clone());

        SearchResultItem {
          hashtag_type: result.hashtag_type,
          id: result.id,
          slug: result.slug,
          reference,
          text,
          description: result.description,
          icon,
          relative_url: result.relative_url,
        }
      })
      .collect()
  }

  /// Ask the server about slugs seen in the document that haven't been asked
  /// about yet.
  ///
  /// Every requested slug ends up checked, whether it matched, missed, or the
  /// request failed.
  pub async fn resolve_context<I>(&self, source: &dyn HashtagSource, order: &[HashtagType], slugs: I)
  where
    I: IntoIterator,
    I::Item: Into<String>,
  {
    let pending: Vec<String> = {
      let checked = self.checked.lock();
      let mut seen = HashSet::new();
      slugs
        .into_iter()
        .map(Into::into)
        .filter(|slug| !checked.contains(slug) && seen.insert(slug.clone()))
        .collect()
    };
    if pending.is_empty() {
      return;
    }

    match source.lookup(&pending, order).await {
      Ok(response) => {
        let mut resolved = self.resolved.lock();
        for (hashtag_type, items) in response {
          for item in items {
            resolved.insert(hashtag_type.clone(), item);
          }
        }
      },
      Err(err) => log::warn!("failed to resolve {} hashtags: {err}", pending.len()),
    }

    self.checked.lock().extend(pending);
  }

  /// Cook every raw span that matches a known item, trying types in
  /// priority order.
  ///
  /// Returns the lowercased, deduplicated slugs that are still unknown and
  /// haven't been checked yet, ready to hand to
  /// [`HashtagContext::resolve_context`].
  pub fn link_known_references(&self, order: &[HashtagType], spans: &mut [HashtagSpan]) -> Vec<String> {
    let mut unresolved = Vec::new();
    {
      let registry = self.registry.read();
      let resolved = self.resolved.lock();
      for span in spans.iter_mut().filter(|span| !span.is_cooked()) {
        let slug = span.slug().to_lowercase();
        // best effort: a `::type` suffix is only honored when the server
        // used it in the item's ref
        let found = order
          .iter()
          .find_map(|hashtag_type| resolved.get(hashtag_type, &slug).map(|item| (hashtag_type, item)));

        match found {
          Some((hashtag_type, item)) => {
            let icon = Self::icon_html(&registry, hashtag_type, item.icon.as_deref(), &item.id)
              .unwrap_or_else(|| ICON_PLACEHOLDER.to_owned());
            span.cook(cooked_hashtag_html(hashtag_type, item, &icon, self.emoji()));
          },
          None => unresolved.push(slug),
        }
      }
    }

    let checked = self.checked.lock();
    let mut seen = HashSet::new();
    unresolved.retain(|slug| !checked.contains(slug) && seen.insert(slug.clone()));
    unresolved
  }
}
