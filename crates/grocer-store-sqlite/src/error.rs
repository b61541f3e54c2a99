//! Error type for `grocer-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error in document {key:?}: {source}")]
  Json {
    key:    String,
    #[source]
    source: serde_json::Error,
  },

  #[error("unknown document key: {0:?}")]
  UnknownDocument(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
