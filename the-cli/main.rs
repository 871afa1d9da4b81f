//! Command line client for a forum's hashtag endpoints.
//!
//! `hashtag search <term>` runs one autocomplete search and prints the
//! results as JSON. `hashtag link <text>` resolves every `#slug` in the text
//! and prints it as HTML with the known hashtags cooked.

use std::{
  path::PathBuf,
  sync::Arc,
};

use anyhow::{
  Context,
  Result,
  bail,
};
use clap::{
  ArgAction,
  Parser,
  Subcommand,
};
use log::LevelFilter;
use the_hashtag::{
  Config,
  HashtagContext,
  HashtagSearch,
  HashtagType,
  HashtagTypeRegistry,
  HttpHashtagSource,
  SearchOutcome,
  markup::{
    raw_hashtags,
    render_with_spans,
  },
};

#[derive(Debug, Parser)]
#[command(name = "hashtag", about, long_about = None)]
struct Cli {
  /// Increase logging verbosity (repeat for more)
  #[arg(short = 'v', action = ArgAction::Count)]
  verbosity: u8,

  /// Path to a TOML config file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config_file: Option<PathBuf>,

  /// Forum URL, overrides the config file
  #[arg(long, value_name = "URL")]
  base_url: Option<String>,

  /// Source types in priority order, comma separated
  #[arg(long, value_name = "TYPES", value_delimiter = ',')]
  order: Vec<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Search hashtags starting with TERM
  Search { term: String },
  /// Render TEXT with its hashtags resolved
  Link { text: String },
}

fn init_logging(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  env_logger::Builder::new()
    .filter_level(level)
    .parse_default_env()
    .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
  let mut config = match &cli.config_file {
    Some(path) => {
      Config::load(path).with_context(|| format!("loading {}", path.display()))?
    },
    None => Config::default(),
  };
  if let Some(base_url) = &cli.base_url {
    config.base_url = base_url.clone();
  }
  if !cli.order.is_empty() {
    config.order = cli.order.iter().cloned().map(HashtagType::from).collect();
  }
  Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbosity);

  let config = load_config(&cli)?;
  let source = Arc::new(HttpHashtagSource::new(&config.base_url)?);
  let context = Arc::new(HashtagContext::new(
    HashtagTypeRegistry::with_defaults(),
    Arc::new(config.emoji.renderer()),
  ));

  match cli.command {
    Command::Search { term } => {
      let search = HashtagSearch::new(context, source, config.search.clone())?;
      match search.search(&term, &config.order).await {
        SearchOutcome::Results(results) => {
          println!("{}", serde_json::to_string_pretty(&results)?);
        },
        SearchOutcome::Cancelled => bail!("search for {term:?} timed out"),
      }
    },
    Command::Link { text } => {
      let mut found = raw_hashtags(&text);
      let mut spans: Vec<_> = found.iter().map(|hashtag| hashtag.span.clone()).collect();

      let unresolved = context.link_known_references(&config.order, &mut spans);
      log::info!("resolving {} hashtags", unresolved.len());
      context
        .resolve_context(&*source, &config.order, unresolved)
        .await;
      context.link_known_references(&config.order, &mut spans);

      for (hashtag, span) in found.iter_mut().zip(spans) {
        hashtag.span = span;
      }
      println!("{}", render_with_spans(&text, &found));
    },
  }

  Ok(())
}
