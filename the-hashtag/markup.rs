//! HTML produced for hashtags: escaping, emoji expansion, the cooked anchor
//! and the raw `#slug` placeholder spans it replaces.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{
  Captures,
  Regex,
};

use crate::types::{
  HashtagType,
  ResolvedHashtag,
};

static EMOJI_SHORTCODE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r":([a-z0-9_+\-]+)(?::t([1-6]))?:").expect("emoji shortcode pattern is valid")
});

static RAW_HASHTAG: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?:^|[^\w&/])(#[\w\-]+(?:::[\w\-]+)?)").expect("raw hashtag pattern is valid")
});

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      '`' => out.push_str("&#x60;"),
      '=' => out.push_str("&#x3D;"),
      c => out.push(c),
    }
  }
  out
}

/// Turns an emoji shortcode into markup.
pub trait EmojiRenderer: Send + Sync {
  /// `name` is the bare shortcode, `tone` the optional `:tN` skin tone.
  /// Returning `None` leaves the shortcode as plain text.
  fn render(&self, name: &str, tone: Option<u8>) -> Option<String>;
}

/// Leaves every shortcode untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainEmoji;

impl EmojiRenderer for PlainEmoji {
  fn render(&self, _name: &str, _tone: Option<u8>) -> Option<String> {
    None
  }
}

/// Renders shortcodes as `<img>` tags pointing at a hosted emoji set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiImages {
  base_url: String,
  set:      String,
  version:  u32,
}

impl EmojiImages {
  pub fn new(base_url: impl Into<String>, set: impl Into<String>, version: u32) -> Self {
    let base_url: String = base_url.into();
    Self {
      base_url: base_url.trim_end_matches('/').to_owned(),
      set: set.into(),
      version,
    }
  }

  fn url(&self, name: &str, tone: Option<u8>) -> String {
    match tone {
      Some(tone) => {
        format!(
          "{}/{}/{name}/{tone}.png?v={}",
          self.base_url, self.set, self.version
        )
      },
      None => format!("{}/{}/{name}.png?v={}", self.base_url, self.set, self.version),
    }
  }
}

impl Default for EmojiImages {
  fn default() -> Self {
    Self::new("/images/emoji", "twitter", 12)
  }
}

impl EmojiRenderer for EmojiImages {
  fn render(&self, name: &str, tone: Option<u8>) -> Option<String> {
    let title = match tone {
      Some(tone) => format!(":{name}:t{tone}:"),
      None => format!(":{name}:"),
    };
    Some(format!(
      r#"<img width="20" height="20" src="{src}" title="{title}" class="emoji" alt="{title}" loading="lazy">"#,
      src = escape_html(&self.url(name, tone)),
      title = escape_html(&title),
    ))
  }
}

/// Replace every `:shortcode:` the renderer knows with its markup.
///
/// A shortcode glued to a preceding word character (`10:30:45`) is left
/// alone.
pub fn emoji_unescape(text: &str, emoji: &dyn EmojiRenderer) -> String {
  EMOJI_SHORTCODE
    .replace_all(text, |caps: &Captures<'_>| {
      let start = caps.get(0).map_or(0, |found| found.start());
      if text[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
      {
        return caps[0].to_owned();
      }
      let tone = caps.get(2).and_then(|tone| tone.as_str().parse().ok());
      emoji
        .render(&caps[1], tone)
        .unwrap_or_else(|| caps[0].to_owned())
    })
    .into_owned()
}

/// Server text made safe for HTML: escaped first, emoji expanded after.
pub fn sanitize_text(text: &str, emoji: &dyn EmojiRenderer) -> String {
  emoji_unescape(&escape_html(text), emoji)
}

/// The resolved anchor that replaces a raw `#slug` span.
///
/// This layout is shared with the server side cooking of posts, both must
/// change together.
pub fn cooked_hashtag_html(
  hashtag_type: &HashtagType,
  item: &ResolvedHashtag,
  icon_html: &str,
  emoji: &dyn EmojiRenderer,
) -> String {
  format!(
    r#"<a class="hashtag-cooked" href="{href}" data-type="{ty}" data-id="{id}" data-slug="{slug}">{icon_html}<span>{text}</span></a>"#,
    href = escape_html(&item.relative_url),
    ty = escape_html(hashtag_type.as_str()),
    id = escape_html(&item.id.to_string()),
    slug = escape_html(&item.slug),
    text = sanitize_text(&item.text, emoji),
  )
}

/// Icon slot left in cooked markup when no handler is registered for the
/// type. Renderers fill it in later.
pub const ICON_PLACEHOLDER: &str = r#"<span class="hashtag-icon-placeholder"></span>"#;

/// A hashtag placeholder in rendered content, `#slug` until it's resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagSpan {
  raw:    String,
  cooked: Option<String>,
}

impl HashtagSpan {
  pub fn raw(text: impl Into<String>) -> Self {
    Self {
      raw:    text.into(),
      cooked: None,
    }
  }

  /// Visible text of the raw span, including the `#`.
  pub fn text(&self) -> &str {
    &self.raw
  }

  /// The span text with its trigger character stripped. Any `::type`
  /// suffix is kept.
  pub fn slug(&self) -> String {
    self.raw.replacen('#', "", 1)
  }

  pub fn is_cooked(&self) -> bool {
    self.cooked.is_some()
  }

  pub fn cooked(&self) -> Option<&str> {
    self.cooked.as_deref()
  }

  pub(crate) fn cook(&mut self, html: String) {
    self.cooked = Some(html);
  }

  pub fn to_html(&self) -> String {
    match &self.cooked {
      Some(html) => html.clone(),
      None => format!(r#"<span class="hashtag-raw">{}</span>"#, escape_html(&self.raw)),
    }
  }
}

/// A raw hashtag found in plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHashtagMatch {
  /// Byte range of `#slug` in the scanned text.
  pub range: Range<usize>,
  pub span:  HashtagSpan,
}

/// Find every `#slug` (optionally `#slug::type`) token in `text`.
pub fn raw_hashtags(text: &str) -> Vec<RawHashtagMatch> {
  RAW_HASHTAG
    .captures_iter(text)
    .filter_map(|caps| caps.get(1))
    .map(|hashtag| {
      RawHashtagMatch {
        range: hashtag.range(),
        span:  HashtagSpan::raw(hashtag.as_str()),
      }
    })
    .collect()
}

/// Render `text` as HTML with each match replaced by its span markup.
/// `matches` must come from [`raw_hashtags`] on the same text.
pub fn render_with_spans(text: &str, matches: &[RawHashtagMatch]) -> String {
  let mut out = String::with_capacity(text.len());
  let mut cursor = 0;
  for hashtag in matches {
    out.push_str(&escape_html(&text[cursor..hashtag.range.start]));
    out.push_str(&hashtag.span.to_html());
    cursor = hashtag.range.end;
  }
  out.push_str(&escape_html(&text[cursor..]));
  out
}
