use std::{
  fs,
  io::Error as IOError,
  path::Path,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;
use toml::de::Error as TomlError;

use crate::{
  markup::EmojiImages,
  types::HashtagType,
};

/// How long a search cache table lives before it is wiped as a whole.
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(30);

/// Timing knobs of the search orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SearchConfig {
  /// Debounce quantum applied to keystrokes before hitting the network.
  pub input_delay_ms: u64,
  /// Give up on a search after this long. Unset or `0` waits forever.
  pub timeout_ms:     Option<u64>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      input_delay_ms: 250,
      timeout_ms:     Some(5000),
    }
  }
}

impl SearchConfig {
  /// No debounce and no timeout, so tests only ever observe real outcomes.
  pub fn testing() -> Self {
    Self {
      input_delay_ms: 0,
      timeout_ms:     None,
    }
  }

  pub fn input_delay(&self) -> Duration {
    Duration::from_millis(self.input_delay_ms)
  }

  pub fn timeout(&self) -> Option<Duration> {
    self
      .timeout_ms
      .filter(|ms| *ms > 0)
      .map(Duration::from_millis)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EmojiConfig {
  pub base_url: String,
  pub set:      String,
  pub version:  u32,
}

impl Default for EmojiConfig {
  fn default() -> Self {
    Self {
      base_url: "/images/emoji".into(),
      set:      "twitter".into(),
      version:  12,
    }
  }
}

impl EmojiConfig {
  pub fn renderer(&self) -> EmojiImages {
    EmojiImages::new(self.base_url.clone(), self.set.clone(), self.version)
  }
}

/// Contents of the hashtag config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
  /// Forum the hashtag endpoints are served from.
  pub base_url: String,
  /// Source types in priority order.
  pub order:    Vec<HashtagType>,
  pub search:   SearchConfig,
  pub emoji:    EmojiConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:3000".into(),
      order:    vec![HashtagType::CATEGORY, HashtagType::TAG],
      search:   SearchConfig::default(),
      emoji:    EmojiConfig::default(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
  #[error("bad hashtag config: {0}")]
  BadConfig(#[from] TomlError),
  #[error("failed to read hashtag config: {0}")]
  Error(#[from] IOError),
}

impl Config {
  pub fn from_toml(source: &str) -> Result<Self, ConfigLoadError> {
    Ok(toml::from_str(source)?)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
    let source = fs::read_to_string(path)?;
    let config = Self::from_toml(&source)?;
    log::debug!("loaded hashtag config from {}", path.display());
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn empty_file_is_all_defaults() {
    assert_eq!(Config::from_toml("").unwrap(), Config::default());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let config = Config::from_toml(
      r#"
      base-url = "https://forum.test"
      order = ["tag", "category", "channel"]

      [search]
      input-delay-ms = 50
      "#,
    )
    .unwrap();

    assert_eq!(config.base_url, "https://forum.test");
    assert_eq!(config.order, [
      HashtagType::TAG,
      HashtagType::CATEGORY,
      HashtagType::new("channel"),
    ]);
    assert_eq!(config.search.input_delay(), Duration::from_millis(50));
    assert_eq!(config.search.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.emoji, EmojiConfig::default());
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let err = Config::from_toml("[search]\ndebounce = 3\n").unwrap_err();
    assert!(matches!(err, ConfigLoadError::BadConfig(_)));
  }

  #[test]
  fn testing_disables_timers() {
    let search = SearchConfig::testing();
    assert_eq!(search.input_delay(), Duration::ZERO);
    assert_eq!(search.timeout(), None);
    let zero = Config::from_toml("[search]\ntimeout-ms = 0\n").unwrap();
    assert_eq!(zero.search.timeout(), None);
  }

  #[test]
  fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search]\ntimeout-ms = 1500").unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.search.timeout(), Some(Duration::from_millis(1500)));

    let missing = file.path().with_extension("missing");
    assert!(matches!(
      Config::load(&missing),
      Err(ConfigLoadError::Error(_))
    ));
  }
}
