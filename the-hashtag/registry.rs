use std::{
  collections::HashMap,
  sync::Arc,
};

use crate::{
  markup::escape_html,
  types::{
    HashtagId,
    HashtagType,
  },
};

/// What a handler gets to work with when drawing an item's icon.
#[derive(Debug, Clone, Copy)]
pub struct IconRequest<'a> {
  /// Icon name suggested by the server, if any.
  pub icon: Option<&'a str>,
  pub id:   &'a HashtagId,
}

/// Per-source rendering behaviour.
pub trait HashtagTypeHandler: Send + Sync {
  fn generate_icon_html(&self, request: &IconRequest<'_>) -> String;
}

pub type DynHashtagTypeHandler = Arc<dyn HashtagTypeHandler>;

/// Categories render as a colored square keyed by the category id.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryHashtagType;

impl HashtagTypeHandler for CategoryHashtagType {
  fn generate_icon_html(&self, request: &IconRequest<'_>) -> String {
    format!(
      r#"<span class="hashtag-category-badge hashtag-color--category-{}"></span>"#,
      escape_html(&request.id.to_string())
    )
  }
}

/// Tags render as an svg sprite reference, `tag` unless the server says
/// otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagHashtagType;

impl HashtagTypeHandler for TagHashtagType {
  fn generate_icon_html(&self, request: &IconRequest<'_>) -> String {
    let icon = escape_html(request.icon.unwrap_or("tag"));
    format!(
      r##"<svg class="fa d-icon d-icon-{icon} svg-icon hashtag-color--tag-{id} svg-string" xmlns="http://www.w3.org/2000/svg"><use href="#{icon}"></use></svg>"##,
      id = escape_html(&request.id.to_string()),
    )
  }
}

/// Source type → handler mapping.
#[derive(Default, Clone)]
pub struct HashtagTypeRegistry {
  handlers: HashMap<HashtagType, DynHashtagTypeHandler>,
}

impl HashtagTypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry with the built-in `category` and `tag` handlers.
  pub fn with_defaults() -> Self {
    let mut registry = Self::new();
    registry.register(HashtagType::CATEGORY, Arc::new(CategoryHashtagType));
    registry.register(HashtagType::TAG, Arc::new(TagHashtagType));
    registry
  }

  /// Register `handler` for `hashtag_type`, replacing any previous one.
  pub fn register(&mut self, hashtag_type: HashtagType, handler: DynHashtagTypeHandler) {
    self.handlers.insert(hashtag_type, handler);
  }

  pub fn unregister_all(&mut self) {
    self.handlers.clear();
  }

  pub fn lookup(&self, hashtag_type: &HashtagType) -> Option<&DynHashtagTypeHandler> {
    self.handlers.get(hashtag_type)
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Fixed(&'static str);

  impl HashtagTypeHandler for Fixed {
    fn generate_icon_html(&self, _request: &IconRequest<'_>) -> String {
      self.0.to_owned()
    }
  }

  #[test]
  fn defaults_cover_category_and_tag() {
    let registry = HashtagTypeRegistry::with_defaults();
    let id = HashtagId::Number(3);
    let request = IconRequest { icon: None, id: &id };

    let category = registry.lookup(&HashtagType::CATEGORY).unwrap();
    assert_eq!(
      category.generate_icon_html(&request),
      r#"<span class="hashtag-category-badge hashtag-color--category-3"></span>"#
    );

    let tag = registry.lookup(&HashtagType::TAG).unwrap();
    let html = tag.generate_icon_html(&IconRequest {
      icon: Some("hashtag"),
      id:   &id,
    });
    assert!(html.contains("d-icon-hashtag"));
    assert!(html.contains("hashtag-color--tag-3"));
    assert!(html.contains(r##"<use href="#hashtag">"##));
  }

  #[test]
  fn register_replaces_and_unregister_all_resets() {
    let mut registry = HashtagTypeRegistry::new();
    let channel = HashtagType::new("channel");
    registry.register(channel.clone(), Arc::new(Fixed("a")));
    registry.register(channel.clone(), Arc::new(Fixed("b")));
    assert_eq!(registry.len(), 1);

    let id = HashtagId::Number(1);
    let request = IconRequest { icon: None, id: &id };
    assert_eq!(registry.lookup(&channel).unwrap().generate_icon_html(&request), "b");

    registry.unregister_all();
    assert!(registry.is_empty());
    assert!(registry.lookup(&channel).is_none());
  }
}
