//! grocer server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus any
//! `GROCER_*` environment variables, opens the SQLite store, rolls over
//! yesterday's completions, and serves the JSON API under `/api`.
//!
//! # Configuration
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8080
//! store_path = "~/.local/share/grocer/grocer.db"
//!
//! [ai]
//! api_key = "..."   # or GROCER_AI__API_KEY
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use grocer_ai::{GeminiClient, Gateway};
use grocer_api::AppService;
use grocer_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::expand_tilde;

#[derive(Parser)]
#[command(author, version, about = "Grocer shopping-list server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = settings::load(&cli.config)?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // AI gateway.
  let client = GeminiClient::new(server_cfg.ai.gemini())
    .context("failed to build AI client")?;
  if !client.has_credential() {
    tracing::warn!("no AI API key configured; AI features will answer with an error");
  }

  let undo_window =
    chrono::Duration::from_std(std::time::Duration::from_secs(server_cfg.undo_window_secs))
      .context("undo_window_secs is out of range")?;
  let service = AppService::load(store, Gateway::new(client))
    .await
    .context("failed to load state")?
    .with_undo_window(undo_window);

  let app = Router::new().nest("/api", grocer_api::api_router(Arc::new(service)));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
