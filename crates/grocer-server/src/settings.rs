//! Runtime configuration: an optional TOML file overlaid with `GROCER_*`
//! environment variables, e.g. `GROCER_PORT`. Nested keys use `__`, e.g.
//! `GROCER_AI__API_KEY`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use grocer_ai::{
  GeminiConfig,
  client::{DEFAULT_BASE_URL, DEFAULT_MODEL},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub undo_window_secs: u64,
  pub ai:               AiConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8080,
      store_path:       PathBuf::from("~/.local/share/grocer/grocer.db"),
      undo_window_secs: 5,
      ai:               AiConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
  pub api_key:      Option<String>,
  pub model:        String,
  pub base_url:     String,
  pub timeout_secs: u64,
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      api_key:      None,
      model:        DEFAULT_MODEL.to_string(),
      base_url:     DEFAULT_BASE_URL.to_string(),
      timeout_secs: 30,
    }
  }
}

impl AiConfig {
  pub fn gemini(&self) -> GeminiConfig {
    GeminiConfig {
      api_key:  self.api_key.clone(),
      model:    self.model.clone(),
      base_url: self.base_url.clone(),
      timeout:  Duration::from_secs(self.timeout_secs),
    }
  }
}

/// Read `path` (if it exists) and the environment.
pub fn load(path: &Path) -> anyhow::Result<ServerConfig> {
  build(path, environment())
}

/// `GROCER_PORT`, `GROCER_AI__API_KEY`, ...
fn environment() -> config::Environment {
  config::Environment::with_prefix("GROCER")
    .prefix_separator("_")
    .separator("__")
}

fn build(path: &Path, env: config::Environment) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
