use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use dashcache::config::{BackendConfig, Config};
use dashcache::{
  logging, ConfigStore, CrudClient, LayoutMode, LayoutTarget, MemorySession, Navigation,
  RouteGuard, SessionStore,
};

#[derive(Parser, Debug)]
#[command(name = "dashcache")]
#[command(about = "Cached access to dashboard schemas, widgets and pages")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/dashcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend CRUD base URL, overrides the config file
  #[arg(short, long)]
  url: Option<String>,

  /// Route the command runs under (used by the guard and page labels)
  #[arg(long, default_value = "/")]
  route: String,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show a table schema
  Schema { database: String, table: String },
  /// Show a widget
  Widget { name: String },
  /// Show a dashboard page
  Page { name: String },
  /// Preload all widgets and list their ids
  Widgets,
  /// Show the layout addressed by a layout mode
  Layout {
    mode: LayoutMode,
    #[command(flatten)]
    target: TargetArgs,
  },
  /// Replace a layout with the JSON in a file and save it
  SetLayout {
    mode: LayoutMode,
    #[command(flatten)]
    target: TargetArgs,
    /// JSON file holding the new layout
    #[arg(long)]
    file: PathBuf,
  },
  /// Label of a record
  Label {
    database: String,
    table: String,
    ids: Vec<String>,
    /// The record as JSON; without it the label comes from --route
    #[arg(long)]
    object: Option<String>,
  },
  /// Label of a record link such as /resource/db/table/id
  IdLabel { link: String },
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
  /// Page or widget name
  #[arg(long)]
  name: Option<String>,
  #[arg(long)]
  database: Option<String>,
  #[arg(long)]
  table: Option<String>,
  /// Table id, e.g. dj/sales/Orders
  #[arg(long)]
  pk: Option<String>,
}

impl From<TargetArgs> for LayoutTarget {
  fn from(args: TargetArgs) -> Self {
    LayoutTarget {
      name: args.name,
      database: args.database,
      table: args.table,
      pk: args.pk,
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration, letting --url stand in for a config file
  let config = match args.url.as_deref() {
    Some(url) if args.config.is_none() => Config::for_url(url),
    Some(url) => Config {
      backend: BackendConfig {
        url: url.to_string(),
      },
      ..Config::load(args.config.as_deref())?
    },
    None => Config::load(args.config.as_deref())?,
  };

  let _log_guard = logging::init(&config.log)?;

  let session = Arc::new(MemorySession::new(
    Config::session_token(),
    args.route.clone(),
  ));
  let guard = RouteGuard::new(session.clone(), session.clone(), &config.login_route);
  if !guard.can_activate(&args.route) {
    return Err(eyre!(
      "Not authenticated, redirected to {}. Set DASHCACHE_TOKEN or DJ_TOKEN.",
      session.current_url()
    ));
  }

  let client = CrudClient::new(&config.backend.base_url()?, session.token());
  let store = ConfigStore::new(Arc::new(client), session);
  store.init_widgets().await;

  run(&store, args.command).await
}

async fn run(store: &ConfigStore, command: Command) -> Result<()> {
  match command {
    Command::Schema { database, table } => {
      print_json(&store.get_schema(&database, Some(&table)).value().await?)
    }
    Command::Widget { name } => print_json(&store.get_widget(&name).value().await?),
    Command::Page { name } => print_json(&store.get_page(&name).value().await?),
    Command::Widgets => {
      if !store.widgets_loaded() {
        return Err(eyre!("Failed to load widgets, see log for details"));
      }
      for id in store.cached(dashcache::ResourceFamily::Widget) {
        println!("{}", id);
      }
      Ok(())
    }
    Command::Layout { mode, target } => {
      let source = store.layout(mode, &target.into())?;
      println!("# {}", source.path);
      print_json(&source.layout().await?.unwrap_or(Value::Null))
    }
    Command::SetLayout { mode, target, file } => {
      let target: LayoutTarget = target.into();
      let contents = std::fs::read_to_string(&file)
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
      let layout: Value = serde_json::from_str(&contents)
        .map_err(|e| eyre!("Failed to parse {}: {}", file.display(), e))?;

      store.layout(mode, &target)?.replace_layout(layout).await?;
      store.mark_dirty(mode, &target)?;

      let report = store.save_dirty().await;
      for saved in &report.saved {
        println!("saved {}", saved);
      }
      match report.failed.first() {
        None => Ok(()),
        Some((resource, error)) => Err(eyre!("Failed to save {}: {}", resource, error)),
      }
    }
    Command::Label {
      database,
      table,
      ids,
      object,
    } => {
      let object: Option<Value> = object
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| eyre!("Invalid --object JSON: {}", e))?;
      let label = store
        .object_label(&database, &table, ids.as_slice(), object.as_ref())
        .await?;
      println!("{}", label);
      Ok(())
    }
    Command::IdLabel { link } => {
      let segments: Vec<&str> = link.split('/').collect();
      println!("{}", store.id_label(segments.as_slice()).await?);
      Ok(())
    }
  }
}

fn print_json(value: &Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
