//! Encoding and decoding helpers between the core document types and the
//! plain-text rows stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings; document bodies as compact
//! JSON.

use chrono::{DateTime, Utc};
use grocer_core::store::{Document, StoredDocuments};
use serde::de::DeserializeOwned;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

/// A `documents` row as read from the database, before JSON decoding.
pub struct RawDocument {
  pub key:  String,
  pub body: String,
}

fn decode_body<T: DeserializeOwned>(key: &str, body: &str) -> Result<T> {
  serde_json::from_str(body).map_err(|source| Error::Json {
    key: key.to_owned(),
    source,
  })
}

/// Decode every row into its slot of [`StoredDocuments`]. Rows with a key
/// this version does not know are rejected rather than silently dropped.
pub fn decode_documents(rows: Vec<RawDocument>) -> Result<StoredDocuments> {
  let mut docs = StoredDocuments::default();
  for row in rows {
    let document = Document::from_key(&row.key)
      .ok_or_else(|| Error::UnknownDocument(row.key.clone()))?;
    match document {
      Document::Categories => docs.categories = Some(decode_body(&row.key, &row.body)?),
      Document::Items => docs.items = Some(decode_body(&row.key, &row.body)?),
      Document::Sets => docs.sets = Some(decode_body(&row.key, &row.body)?),
      Document::Logs => docs.logs = Some(decode_body(&row.key, &row.body)?),
      Document::Preferences => {
        docs.preferences = Some(decode_body(&row.key, &row.body)?)
      }
    }
  }
  Ok(docs)
}
