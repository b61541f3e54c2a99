//! [`SqliteStore`]: the SQLite implementation of [`StateStore`].

use std::path::Path;

use chrono::Utc;
use grocer_core::store::{Document, StateStore, StoredDocuments};

use crate::{
  Result,
  encode::{RawDocument, decode_documents, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Grocer state backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Keys of the documents that have been saved at least once.
  pub async fn saved_keys(&self) -> Result<Vec<String>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM documents ORDER BY key")?;
        let keys = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }
}

// ─── StateStore impl ─────────────────────────────────────────────────────────

impl StateStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self) -> Result<StoredDocuments> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key, body FROM documents")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDocument { key: row.get(0)?, body: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_documents(raws)
  }

  async fn save(&self, document: Document, body: serde_json::Value) -> Result<()> {
    let key    = document.key();
    let body   = body.to_string();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (key, body, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET body = excluded.body,
                                          updated_at = excluded.updated_at",
          rusqlite::params![key, body, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
